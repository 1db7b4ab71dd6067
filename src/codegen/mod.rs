//! Brainfuck code generation.
//!
//! The generator assembles the machine from named fragments with
//! documented cursor and zero contracts:
//!
//! - [`fragment`]: the substitution engine, expansion and self-checks
//! - [`emitter`]: the cursor-tracked fragment body builder
//! - [`memory`]: random-access memory over the tape (INSHAME table)
//! - [`registers`]: the banked register file
//! - [`integer`]: 4-byte little-endian increment
//!
//! Composing two fragments is correct iff their contracts meet at the
//! cursor position and the zero set; the builders therefore state cell
//! positions symbolically and let [`emitter::Asm`] count the shifts.

pub mod emitter;
pub mod errors;
pub mod fragment;
pub mod integer;
pub mod memory;
pub mod registers;
