//! The virtual machine: instruction set, assembler and program generator.
//!
//! The machine itself is a Brainfuck program; [`program::generate`]
//! produces it. [`isa`] is the canonical instruction table feeding both
//! the generator's decode ladder and the [`assembler`], which turns
//! mnemonic source into the byte stream the machine loads from stdin.
//!
//! # Architecture
//!
//! - **Registers**: sixteen 4-byte little-endian registers; r14 is the
//!   loader's stack pointer, r15 the instruction pointer.
//! - **Memory**: lazily-grown 4-byte cells addressed by 3-byte indices;
//!   the loader stores one program byte per cell.
//! - **Execution model**: sequential fetch/decode/execute; an unknown
//!   opcode halts the machine silently.

pub mod assembler;
pub mod errors;
pub mod isa;
mod isa_static_check;
pub mod program;
