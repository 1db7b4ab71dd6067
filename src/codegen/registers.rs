//! Register-file primitives: a banked array behind a 1-byte index.
//!
//! Positions are relative to the index cell `i`:
//!
//! ```text
//! i=0  bank scratch=1,2  bus d0..d3=3..6  slot k: sa=7+6k sb=8+6k data=9+6k..12+6k
//! ```
//!
//! `fill_index` carries the index byte rightward through the slots'
//! second scratch cells, dropping a sentinel 1 into the first scratch of
//! every slot it leaves behind. The sentinel trail is what later walks
//! know: bytes hop between adjacent slots' scratch cells inside moving
//! loops that test successive trail cells and stop on the first zero
//! (the bank's own scratch on the way in, the target's own scratch on the
//! way out), so the trail survives until `remove_index` consumes it.
//!
//! Every slot is also a valid `incr` operand (`0 0 b0 b1 b2 b3`), which
//! lets the machine bump SP and IP in place without going through the
//! bus.

use crate::codegen::emitter::Asm;
use crate::codegen::errors::GenError;
use crate::codegen::fragment::FragmentSet;
use crate::layout::SLOT_WIDTH;

const STRIDE: isize = SLOT_WIDTH as isize;

/// Bank scratch cell used as the inbound stop marker.
const BANK_SA: isize = 1;
/// First bus byte.
const BUS: isize = 3;
/// Current slot's first scratch cell (in the rolling slot frame).
const SA: isize = 7;
/// Current slot's second scratch cell.
const SB: isize = 8;
/// First data byte of the current slot.
const DATA: isize = 9;

/// Declared delta of `fill_index`: entry on `i`, exit on the target
/// slot's second scratch (literally `+8` for register 0).
pub const FILL_DELTA: isize = SB;

/// Declared delta of `remove_index`: entry on the target slot's first
/// scratch, exit on `i`.
pub const REMOVE_DELTA: isize = -SA;

/// Defines the register fragments: the index walk pair and the four
/// transfer operations (entry and exit on the index cell).
pub fn define(set: &mut FragmentSet) -> Result<(), GenError> {
    set.define("fill_index", fill_index().into_body())?;
    set.define("remove_index", remove_index().into_body())?;
    set.define("r_read1", read_op(1).into_body())?;
    set.define("r_read4", read_op(4).into_body())?;
    set.define("r_write1", write_op(1).into_body())?;
    set.define("r_write4", write_op(4).into_body())?;
    Ok(())
}

/// `fill_index`: consume the index byte, leaving the sentinel trail and
/// the cursor on the target slot's second scratch.
fn fill_index() -> Asm {
    let mut asm = Asm::new();
    asm.mark_dynamic();
    // Index byte becomes the walk counter in slot 0's second scratch.
    asm.transfer(0, &[SB]);
    asm.seek(SB);
    asm.open();
    {
        asm.sub(1);
        asm.seek(SA);
        asm.add(1);
        // Remaining count moves one slot right; so does the frame.
        asm.transfer(SB, &[SB + STRIDE]);
        asm.seek(SB + STRIDE);
        asm.rebase(SB);
    }
    asm.close();
    asm
}

/// `remove_index`: zero the trail walking home; entry on the target
/// slot's first scratch, exit on `i`. Positions here are relative to the
/// entry cell, unlike the slot-frame helpers below.
fn remove_index() -> Asm {
    let mut asm = Asm::new();
    asm.mark_dynamic();
    asm.seek(-STRIDE);
    asm.open();
    {
        asm.sub(1);
        asm.seek(-2 * STRIDE);
        asm.rebase(-STRIDE);
    }
    asm.close();
    // The walk stops on the bank scratch, one cell right of `i`.
    asm.seek(-STRIDE - 1);
    asm
}

/// Walks the cursor home along the trail without touching it.
/// Entry on the target slot's second scratch, exit on the bank scratch.
fn walk_home(asm: &mut Asm) {
    asm.seek(SA - STRIDE);
    asm.open();
    {
        asm.seek(SA - 2 * STRIDE);
        asm.rebase(SA - STRIDE);
    }
    asm.close();
    asm.rebase(BANK_SA);
}

/// Walks the cursor back out along the trail. Entry anywhere in the bank
/// header frame; exit on the target slot's first scratch.
fn walk_out(asm: &mut Asm) {
    asm.seek(SA);
    asm.open();
    {
        asm.seek(SA + STRIDE);
        asm.rebase(SA);
    }
    asm.close();
}

/// `r_read{width}`: copy `width` slot bytes into the bus, preserving the
/// slot. Entry and exit on `i`; the index byte is consumed.
fn read_op(width: isize) -> Asm {
    let mut asm = Asm::new();
    asm.mark_dynamic();
    asm.call("fill_index", FILL_DELTA);

    for n in 0..width {
        if n > 0 {
            // The previous deposit left the cursor in the bank header.
            walk_out(&mut asm);
            asm.seek(SB);
        }
        // Non-destructive copy of the data byte into the scratch pair,
        // then put the first scratch's half back.
        asm.transfer(DATA + n, &[SB, SA]);
        asm.transfer(SA, &[DATA + n]);
        asm.seek(SA);
        // Hop the byte home one slot per trail sentinel.
        asm.seek(SA - STRIDE);
        asm.open();
        {
            asm.transfer(SB, &[SA - STRIDE + 1]);
            asm.seek(SA - 2 * STRIDE);
            asm.rebase(SA - STRIDE);
        }
        asm.close();
        asm.rebase(BANK_SA);
        // The byte landed on slot 0's second scratch; file it in the bus.
        asm.transfer(SB, &[BUS + n]);
    }

    walk_out(&mut asm);
    asm.call("remove_index", REMOVE_DELTA);
    asm
}

/// `r_write{width}`: move `width` bus bytes into the slot, zeroing the
/// written cells first. Entry and exit on `i`; index and bus consumed.
fn write_op(width: isize) -> Asm {
    let mut asm = Asm::new();
    asm.mark_dynamic();
    asm.call("fill_index", FILL_DELTA);

    for n in 0..width {
        walk_home(&mut asm);
        // Pick the bus byte up onto slot 0's second scratch.
        asm.transfer(BUS + n, &[SB]);
        // Hop it outward one slot per trail sentinel.
        asm.seek(SA);
        asm.open();
        {
            asm.transfer(SB, &[SB + STRIDE]);
            asm.seek(SA + STRIDE);
            asm.rebase(SA);
        }
        asm.close();
        // At the target: clear the data cell and move the byte in.
        asm.seek(DATA + n);
        asm.clear();
        asm.transfer(SB, &[DATA + n]);
        asm.seek(SB);
    }

    asm.seek(SA);
    asm.call("remove_index", REMOVE_DELTA);
    asm
}
