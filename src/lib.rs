//! tapevm library.
//!
//! Generates a virtual machine that executes inside a Brainfuck
//! interpreter: a register/memory model built on the host's single tape,
//! a loader that ingests a program from stdin, and a fetch/decode/execute
//! loop over the simulated RAM. Also provides an assembler for the
//! machine's instruction set.

pub mod codegen;
pub mod layout;
pub mod machine;
mod test_utils;
pub mod utils;
