//! Named-fragment substitution engine.
//!
//! The generated program is assembled from named Brainfuck fragments.
//! A fragment body is a sequence of [`Piece`]s: literal command text or a
//! reference to another fragment. [`FragmentSet::expand`] resolves the
//! references recursively (memoised, cycle-checked) and yields the flat
//! program text; [`minify`] strips everything that is not one of the eight
//! commands.
//!
//! Each fragment carries a declared cursor delta and a `dynamic` flag.
//! [`FragmentSet::check`] verifies, per fragment, that its loops balance
//! and that the emitted text's net cursor movement matches the
//! declaration. Loops whose body has a non-zero static delta move the
//! cursor by a runtime-dependent amount; fragments containing them must be
//! declared dynamic, which keeps the balance check but waives the delta
//! check.

use crate::codegen::errors::GenError;
use std::collections::HashMap;

/// One element of a fragment body.
#[derive(Debug, Clone)]
pub enum Piece {
    /// Literal Brainfuck text.
    Text(String),
    /// Reference to another named fragment, expanded inline.
    Call(&'static str),
}

/// A fragment body with its cursor contract.
#[derive(Debug, Clone)]
pub struct FragmentBody {
    pub pieces: Vec<Piece>,
    /// Net cursor movement of one execution, as tracked by the builder.
    pub delta: isize,
    /// True when the body contains loops with net cursor movement, making
    /// the static delta meaningless.
    pub dynamic: bool,
}

/// The set of named fragments making up one program.
#[derive(Debug, Default)]
pub struct FragmentSet {
    fragments: HashMap<&'static str, FragmentBody>,
}

impl FragmentSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a fragment under `name`.
    pub fn define(&mut self, name: &'static str, body: FragmentBody) -> Result<(), GenError> {
        if self.fragments.contains_key(name) {
            return Err(GenError::DuplicateFragment(name.to_string()));
        }
        self.fragments.insert(name, body);
        Ok(())
    }

    /// Declared cursor delta of a fragment, if defined.
    pub fn delta(&self, name: &str) -> Option<isize> {
        self.fragments.get(name).map(|b| b.delta)
    }

    /// Expands `root` into flat Brainfuck text.
    ///
    /// Undefined references and reference cycles are fatal.
    pub fn expand(&self, root: &str) -> Result<String, GenError> {
        let mut cache: HashMap<&'static str, String> = HashMap::new();
        let mut in_progress: Vec<&str> = Vec::new();
        self.expand_inner(root, root, &mut cache, &mut in_progress)
    }

    fn expand_inner(
        &self,
        name: &str,
        referrer: &str,
        cache: &mut HashMap<&'static str, String>,
        in_progress: &mut Vec<&str>,
    ) -> Result<String, GenError> {
        let (key, body) =
            self.fragments
                .get_key_value(name)
                .ok_or_else(|| GenError::UndefinedFragment {
                    name: name.to_string(),
                    referrer: referrer.to_string(),
                })?;
        if let Some(done) = cache.get(*key) {
            return Ok(done.clone());
        }
        if in_progress.contains(&name) {
            return Err(GenError::CyclicFragment(name.to_string()));
        }

        in_progress.push(*key);
        let mut out = String::new();
        for piece in &body.pieces {
            match piece {
                Piece::Text(t) => out.push_str(t),
                Piece::Call(callee) => {
                    out.push_str(&self.expand_inner(callee, name, cache, in_progress)?)
                }
            }
        }
        in_progress.pop();

        cache.insert(*key, out.clone());
        Ok(out)
    }

    /// Verifies loop balance and cursor deltas for every fragment.
    pub fn check(&self) -> Result<(), GenError> {
        for (name, body) in &self.fragments {
            self.check_one(name, body)?;
        }
        Ok(())
    }

    fn check_one(&self, name: &str, body: &FragmentBody) -> Result<(), GenError> {
        // Stack of net deltas, one frame per open loop.
        let mut stack: Vec<isize> = vec![0];

        let mut apply = |c: char, stack: &mut Vec<isize>| -> Result<(), GenError> {
            match c {
                '>' => *stack.last_mut().unwrap() += 1,
                '<' => *stack.last_mut().unwrap() -= 1,
                '[' => stack.push(0),
                ']' => {
                    let inner = stack.pop().ok_or(GenError::UnbalancedLoops {
                        name: name.to_string(),
                        depth: -1,
                    })?;
                    if inner != 0 && !body.dynamic {
                        return Err(GenError::MovingLoop {
                            name: name.to_string(),
                            delta: inner,
                        });
                    }
                    // A statically-neutral loop contributes nothing; a
                    // moving loop's contribution is runtime-dependent and
                    // only admissible in dynamic fragments.
                    if stack.is_empty() {
                        return Err(GenError::UnbalancedLoops {
                            name: name.to_string(),
                            depth: -1,
                        });
                    }
                }
                _ => {}
            }
            Ok(())
        };

        for piece in &body.pieces {
            match piece {
                Piece::Text(t) => {
                    for c in t.chars() {
                        apply(c, &mut stack)?;
                    }
                }
                Piece::Call(callee) => {
                    let delta = self.delta(callee).ok_or_else(|| GenError::UndefinedFragment {
                        name: callee.to_string(),
                        referrer: name.to_string(),
                    })?;
                    *stack.last_mut().unwrap() += delta;
                }
            }
        }

        if stack.len() != 1 {
            return Err(GenError::UnbalancedLoops {
                name: name.to_string(),
                depth: stack.len() as i32 - 1,
            });
        }
        let actual = stack[0];
        if !body.dynamic && actual != body.delta {
            return Err(GenError::CursorDelta {
                name: name.to_string(),
                declared: body.delta,
                actual,
            });
        }
        Ok(())
    }
}

/// Strips every byte that is not one of the eight Brainfuck commands.
pub fn minify(source: &str) -> String {
    source
        .chars()
        .filter(|c| matches!(c, '+' | '-' | '<' | '>' | '[' | ']' | ',' | '.'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::emitter::Asm;

    fn lit(text: &str, delta: isize) -> FragmentBody {
        FragmentBody {
            pieces: vec![Piece::Text(text.to_string())],
            delta,
            dynamic: false,
        }
    }

    #[test]
    fn expand_single_literal() {
        let mut set = FragmentSet::new();
        set.define("a", lit("+>+<", 0)).unwrap();
        assert_eq!(set.expand("a").unwrap(), "+>+<");
    }

    #[test]
    fn expand_nested_references() {
        let mut set = FragmentSet::new();
        set.define("leaf", lit("+", 0)).unwrap();
        set.define(
            "mid",
            FragmentBody {
                pieces: vec![
                    Piece::Text(">".to_string()),
                    Piece::Call("leaf"),
                    Piece::Text("<".to_string()),
                ],
                delta: 0,
                dynamic: false,
            },
        )
        .unwrap();
        set.define(
            "root",
            FragmentBody {
                pieces: vec![Piece::Call("mid"), Piece::Call("mid")],
                delta: 0,
                dynamic: false,
            },
        )
        .unwrap();
        assert_eq!(set.expand("root").unwrap(), ">+<>+<");
    }

    #[test]
    fn expand_undefined_reference() {
        let mut set = FragmentSet::new();
        set.define(
            "root",
            FragmentBody {
                pieces: vec![Piece::Call("ghost")],
                delta: 0,
                dynamic: false,
            },
        )
        .unwrap();
        assert!(matches!(
            set.expand("root"),
            Err(GenError::UndefinedFragment { name, .. }) if name == "ghost"
        ));
    }

    #[test]
    fn expand_cycle() {
        let mut set = FragmentSet::new();
        set.define(
            "a",
            FragmentBody {
                pieces: vec![Piece::Call("b")],
                delta: 0,
                dynamic: false,
            },
        )
        .unwrap();
        set.define(
            "b",
            FragmentBody {
                pieces: vec![Piece::Call("a")],
                delta: 0,
                dynamic: false,
            },
        )
        .unwrap();
        assert!(matches!(set.expand("a"), Err(GenError::CyclicFragment(_))));
    }

    #[test]
    fn duplicate_definition_rejected() {
        let mut set = FragmentSet::new();
        set.define("a", lit("+", 0)).unwrap();
        assert_eq!(
            set.define("a", lit("-", 0)),
            Err(GenError::DuplicateFragment("a".to_string()))
        );
    }

    #[test]
    fn check_accepts_balanced_neutral_fragment() {
        let mut set = FragmentSet::new();
        set.define("a", lit("[->+<]", 0)).unwrap();
        set.check().unwrap();
    }

    #[test]
    fn check_rejects_unbalanced() {
        let mut set = FragmentSet::new();
        set.define("a", lit("[[-]", 0)).unwrap();
        assert!(matches!(
            set.check(),
            Err(GenError::UnbalancedLoops { .. })
        ));
    }

    #[test]
    fn check_rejects_wrong_delta() {
        let mut set = FragmentSet::new();
        set.define("a", lit(">>", 0)).unwrap();
        assert_eq!(
            set.check(),
            Err(GenError::CursorDelta {
                name: "a".to_string(),
                declared: 0,
                actual: 2,
            })
        );
    }

    #[test]
    fn check_rejects_moving_loop_in_static_fragment() {
        let mut set = FragmentSet::new();
        set.define("a", lit("[>]", 0)).unwrap();
        assert_eq!(
            set.check(),
            Err(GenError::MovingLoop {
                name: "a".to_string(),
                delta: 1,
            })
        );
    }

    #[test]
    fn check_allows_moving_loop_in_dynamic_fragment() {
        let mut set = FragmentSet::new();
        let mut asm = Asm::new();
        asm.mark_dynamic();
        asm.open();
        asm.shift(1);
        asm.close();
        set.define("seek-zero", asm.into_body()).unwrap();
        set.check().unwrap();
    }

    #[test]
    fn check_uses_callee_declared_delta() {
        let mut set = FragmentSet::new();
        set.define("step", lit(">>", 2)).unwrap();
        set.define(
            "back",
            FragmentBody {
                pieces: vec![Piece::Call("step"), Piece::Text("<<".to_string())],
                delta: 0,
                dynamic: false,
            },
        )
        .unwrap();
        set.check().unwrap();
    }

    #[test]
    fn minify_strips_noise() {
        assert_eq!(minify("+ move right > then [ - ] done ."), "+>[-].");
    }

    #[test]
    fn expansion_is_deterministic() {
        let build = || {
            let mut set = FragmentSet::new();
            set.define("leaf", lit("+-", 0)).unwrap();
            set.define(
                "root",
                FragmentBody {
                    pieces: vec![Piece::Call("leaf"), Piece::Call("leaf")],
                    delta: 0,
                    dynamic: false,
                },
            )
            .unwrap();
            set.expand("root").unwrap()
        };
        assert_eq!(build(), build());
    }
}
