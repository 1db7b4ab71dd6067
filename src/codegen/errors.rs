use tapevm_derive::Error;

/// Errors raised while assembling the Brainfuck program.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GenError {
    /// A fragment body references a name that was never defined.
    #[error("undefined fragment: {name} (referenced from {referrer})")]
    UndefinedFragment { name: String, referrer: String },
    /// Fragment references form a cycle.
    #[error("fragment cycle through: {0}")]
    CyclicFragment(String),
    /// A fragment was defined twice.
    #[error("duplicate fragment: {0}")]
    DuplicateFragment(String),
    /// A fragment's loops do not balance.
    #[error("unbalanced loops in fragment {name}: depth ends at {depth}")]
    UnbalancedLoops { name: String, depth: i32 },
    /// A fragment's net cursor movement does not match its declaration.
    #[error("fragment {name} declares cursor delta {declared} but moves {actual}")]
    CursorDelta {
        name: String,
        declared: isize,
        actual: isize,
    },
    /// A loop body moves the cursor in a fragment not declared dynamic.
    #[error("fragment {name} has a moving loop (body delta {delta}) but is not dynamic")]
    MovingLoop { name: String, delta: isize },
}
