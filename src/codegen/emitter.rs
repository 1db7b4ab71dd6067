//! Low-level Brainfuck emission.
//!
//! [`Asm`] builds one fragment body. It tracks the cursor relative to the
//! fragment's entry cell, so code states *where* it wants to be
//! ([`Asm::seek`]) instead of counting `>`/`<` runs by hand. All cell
//! positions are relative to the entry cell; composed fragments are pulled
//! in with [`Asm::call`].

use crate::codegen::fragment::{FragmentBody, Piece};

/// Fragment body builder with cursor tracking.
pub struct Asm {
    pieces: Vec<Piece>,
    pos: isize,
    dynamic: bool,
}

impl Asm {
    /// Starts a new body; the cursor is at the fragment's entry cell.
    pub fn new() -> Self {
        Self {
            pieces: Vec::new(),
            pos: 0,
            dynamic: false,
        }
    }

    /// Current cursor position relative to the entry cell.
    pub fn pos(&self) -> isize {
        self.pos
    }

    /// Marks the fragment as containing loops with net cursor movement,
    /// exempting it from the delta self-check.
    pub fn mark_dynamic(&mut self) {
        self.dynamic = true;
    }

    /// Re-anchors the tracked cursor after a moving loop.
    ///
    /// A loop whose body moves the cursor leaves it at a runtime-dependent
    /// cell with a known role (say, the target slot's scratch). Callers
    /// state that role's coordinate here and keep using [`Asm::seek`] in
    /// the new frame. Only meaningful in dynamic fragments.
    pub fn rebase(&mut self, pos: isize) {
        self.dynamic = true;
        self.pos = pos;
    }

    fn text(&mut self, s: &str) {
        if let Some(Piece::Text(last)) = self.pieces.last_mut() {
            last.push_str(s);
        } else {
            self.pieces.push(Piece::Text(s.to_string()));
        }
    }

    /// Emits `>` or `<` runs moving the cursor by `n` cells.
    pub fn shift(&mut self, n: isize) {
        let c = if n >= 0 { '>' } else { '<' };
        let run: String = std::iter::repeat(c).take(n.unsigned_abs()).collect();
        self.text(&run);
        self.pos += n;
    }

    /// Moves the cursor to `to` (relative to the entry cell).
    pub fn seek(&mut self, to: isize) {
        let delta = to - self.pos;
        self.shift(delta);
    }

    /// Emits `n` increments on the current cell.
    pub fn add(&mut self, n: usize) {
        let run: String = std::iter::repeat('+').take(n).collect();
        self.text(&run);
    }

    /// Emits `n` decrements on the current cell.
    pub fn sub(&mut self, n: usize) {
        let run: String = std::iter::repeat('-').take(n).collect();
        self.text(&run);
    }

    /// Emits `,` reading one input byte into the current cell.
    pub fn input(&mut self) {
        self.text(",");
    }

    /// Emits `[-]`, zeroing the current cell.
    pub fn clear(&mut self) {
        self.text("[-]");
    }

    /// Opens a loop on the current cell.
    pub fn open(&mut self) {
        self.text("[");
    }

    /// Closes a loop; the host retests the current cell.
    pub fn close(&mut self) {
        self.text("]");
    }

    /// Moves the value at `from` onto every cell in `dests` (additive),
    /// leaving `from` zero. Cursor ends on `from`.
    pub fn transfer(&mut self, from: isize, dests: &[isize]) {
        self.seek(from);
        self.open();
        self.sub(1);
        for &d in dests {
            self.seek(d);
            self.add(1);
        }
        self.seek(from);
        self.close();
    }

    /// Copies the value at `from` onto every cell in `dests` without
    /// destroying it, using `scratch` (which must be zero and not alias
    /// `from` or any destination). Cursor ends on `scratch`.
    pub fn copy(&mut self, from: isize, dests: &[isize], scratch: isize) {
        let mut all = dests.to_vec();
        all.push(scratch);
        self.transfer(from, &all);
        self.transfer(scratch, &[from]);
    }

    /// Expands the named fragment here. `delta` is the fragment's declared
    /// cursor delta, applied to the tracked position.
    pub fn call(&mut self, name: &'static str, delta: isize) {
        self.pieces.push(Piece::Call(name));
        self.pos += delta;
    }

    /// Finishes the body; its declared delta is the final cursor position.
    pub fn into_body(self) -> FragmentBody {
        FragmentBody {
            delta: self.pos,
            dynamic: self.dynamic,
            pieces: self.pieces,
        }
    }
}

impl Default for Asm {
    fn default() -> Self {
        Self::new()
    }
}
