//! 4-byte little-endian in-place increment.
//!
//! Operand layout, relative to the entry cell:
//!
//! ```text
//! t0=0  t1=1  x0..x3=2..5
//! ```
//!
//! The increment itself is modelled as a carry into the low byte: `t0` is
//! set, and for each byte a pending carry bumps the byte and tests for
//! wrap by draining it into `t1`. A non-zero remainder clears the pending
//! carry and is restored; a zero remainder leaves the carry set for the
//! next byte. The carry out of the high byte is dropped, giving
//! `(x + 1) mod 2^32`. Entry and exit on `t0`; both scratch cells end
//! zero. Register slots share this layout, so the fragment applies to a
//! slot's first scratch cell directly.

use crate::codegen::emitter::Asm;
use crate::codegen::errors::GenError;
use crate::codegen::fragment::FragmentSet;
use crate::layout::CELL_WIDTH;

const T0: isize = 0;
const T1: isize = 1;

/// Position of byte `n` of the operand.
const fn byte(n: isize) -> isize {
    2 + n
}

/// Defines the `incr` fragment.
pub fn define(set: &mut FragmentSet) -> Result<(), GenError> {
    set.define("incr", incr().into_body())?;
    Ok(())
}

fn incr() -> Asm {
    let mut asm = Asm::new();
    asm.seek(T0);
    asm.add(1);
    carry(&mut asm, 0);
    asm
}

/// Consumes a pending carry on `t0`, bumping byte `n` and cascading.
fn carry(asm: &mut Asm, n: isize) {
    asm.seek(T0);
    asm.open();
    {
        asm.sub(1);
        asm.seek(byte(n));
        asm.add(1);
        // Wrap test: drain the byte, assume a carry, cancel it and
        // restore the byte if anything drained.
        asm.transfer(byte(n), &[T1]);
        asm.seek(T0);
        asm.add(1);
        asm.seek(T1);
        asm.open();
        {
            asm.seek(T0);
            asm.sub(1);
            asm.transfer(T1, &[byte(n)]);
        }
        asm.close();
        if n + 1 < CELL_WIDTH as isize {
            carry(asm, n + 1);
        } else {
            // Carry out of the high byte is discarded.
            asm.seek(T0);
            asm.clear();
        }
        asm.seek(T0);
    }
    asm.close();
}
