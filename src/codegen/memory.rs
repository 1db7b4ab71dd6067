//! Memory (array) primitives: the INSHAME efficient table.
//!
//! The memory region is an 11-cell header followed by contiguous 4-byte
//! cells. All positions here are relative to the header's sentinel `s`:
//!
//! ```text
//! s=0  i0..i2=1..3  j0..j2=4..6  d0..d3=7..10  cell bytes 11..14
//! ```
//!
//! A traversal step rotates the 15-cell window `[header | cell]` so the
//! header advances one memory cell and the passed cell's bytes jump over
//! it; the rotation is a chain of 14 single-cell moves threaded through
//! the hole that starts at the permanently-zero sentinel. The address
//! digits `i0,i1,i2` drive the outbound walk as a radix-256 borrow chain
//! (wrapping a digit past zero yields the implicit 256); the duplicate
//! digits `j0,j1,j2` drive the symmetric return, so both copies are
//! consumed and the header comes home zero.

use crate::codegen::emitter::Asm;
use crate::codegen::errors::GenError;
use crate::codegen::fragment::FragmentSet;
use crate::layout::{ADDRESS_DIGITS, CELL_WIDTH, HEADER_WIDTH};

const WINDOW: usize = HEADER_WIDTH + CELL_WIDTH;

/// First driving digit, relative to `s`.
const I0: isize = 1;
/// First return digit.
const J0: isize = 1 + ADDRESS_DIGITS as isize;
/// First data-bus byte.
const D0: isize = 1 + 2 * ADDRESS_DIGITS as isize;
/// First byte of the cell adjacent to the header.
const C0: isize = HEADER_WIDTH as isize;

/// Move chain for one rotation of the window, in sentinel-relative
/// coordinates. `outbound` rotates the header right (cell bytes jump
/// left); otherwise the inverse. Each `(src, dst)` pairs an occupied cell
/// with the hole left by the previous move, starting from the sentinel.
fn rotation_moves(outbound: bool) -> Vec<(isize, isize)> {
    let stride = CELL_WIDTH as isize;
    let dest = |x: isize| -> isize {
        if outbound {
            // Header cells 0..=10 advance; cell bytes 11..=14 jump left.
            if x < HEADER_WIDTH as isize {
                x + stride
            } else {
                x - HEADER_WIDTH as isize
            }
        } else {
            // Header cells retreat; the passed cell's bytes jump right.
            if x >= 0 {
                x - stride
            } else {
                x + HEADER_WIDTH as isize
            }
        }
    };

    let positions: Vec<isize> = if outbound {
        (0..WINDOW as isize).collect()
    } else {
        (-stride..(HEADER_WIDTH as isize)).collect()
    };

    let mut moves = Vec::with_capacity(WINDOW - 1);
    let mut moved = vec![false; WINDOW];
    let index = |x: isize| (x - positions[0]) as usize;

    // The sentinel never moves; its cell is the initial hole.
    let mut hole = 0isize;
    moved[index(0)] = true;
    for _ in 0..WINDOW - 1 {
        let src = positions
            .iter()
            .copied()
            .find(|&x| !moved[index(x)] && dest(x) == hole)
            .expect("rotation chain is a single cycle");
        moves.push((src, hole));
        moved[index(src)] = true;
        hole = src;
    }
    moves
}

/// Emits one traversal step. `entry` is the cursor cell (`i0` outbound,
/// `j0` on the return); the fragment enters and exits on that cell of the
/// current and next header position respectively.
fn step(entry: isize, outbound: bool) -> Asm {
    let mut asm = Asm::new();
    for (src, dst) in rotation_moves(outbound) {
        asm.transfer(src - entry, &[dst - entry]);
    }
    let stride = CELL_WIDTH as isize;
    asm.seek(if outbound { stride } else { -stride });
    asm
}

/// Emits the three-digit borrow-chain drive at the current cursor.
///
/// `digit0` is the least-significant digit's cell; the two higher digits
/// sit at `digit0 + 1` and `digit0 + 2`. `step_name` is the traversal
/// step fragment and `delta` its cursor delta. Positions are tracked in
/// the current-header frame, re-anchored after every step.
fn drive(asm: &mut Asm, digit0: isize, step_name: &'static str, delta: isize) {
    // One step: decrement already done by the caller context.
    let one = |asm: &mut Asm| {
        asm.call(step_name, delta);
        asm.rebase(digit0);
    };
    // Drain the low digit: [- step]
    let drain0 = |asm: &mut Asm| {
        asm.seek(digit0);
        asm.open();
        asm.sub(1);
        one(asm);
        asm.close();
    };
    // One unit of the middle digit: wrap the low digit to 255, step once,
    // then drain the remaining 255.
    let unit1 = |asm: &mut Asm| {
        asm.seek(digit0);
        asm.sub(1);
        one(asm);
        drain0(asm);
        asm.seek(digit0 + 1);
    };
    let drain1 = |asm: &mut Asm| {
        asm.seek(digit0 + 1);
        asm.open();
        asm.sub(1);
        unit1(asm);
        asm.close();
    };
    let unit2 = |asm: &mut Asm| {
        asm.seek(digit0 + 1);
        asm.sub(1);
        unit1(asm);
        drain1(asm);
        asm.seek(digit0 + 2);
    };

    drain0(asm);
    drain1(asm);
    asm.seek(digit0 + 2);
    asm.open();
    asm.sub(1);
    unit2(asm);
    asm.close();
}

/// Defines the memory fragments: the four traversal steps and the
/// composed `write`/`read` operations (entry and exit on the sentinel).
pub fn define(set: &mut FragmentSet) -> Result<(), GenError> {
    set.define("amovlw", step(I0, true).into_body())?;
    set.define("amovrw", step(J0, false).into_body())?;
    set.define("amovlr", step(I0, true).into_body())?;
    set.define("amovrr", step(J0, false).into_body())?;

    set.define("write", write_op().into_body())?;
    set.define("read", read_op().into_body())?;
    Ok(())
}

/// `write`: drive out on `i`, overwrite the target cell from the data
/// bus, drive back on `j`. Pre: `i = j = address`, `d = value`, cursor on
/// `s`. Post: header all zero, cursor on `s`.
fn write_op() -> Asm {
    let mut asm = Asm::new();
    asm.mark_dynamic();
    drive(&mut asm, I0, "amovlw", CELL_WIDTH as isize);

    // At the target: clear the cell, then move the bus in.
    for n in 0..CELL_WIDTH as isize {
        asm.seek(C0 + n);
        asm.clear();
    }
    for n in 0..CELL_WIDTH as isize {
        asm.transfer(D0 + n, &[C0 + n]);
    }

    drive(&mut asm, J0, "amovrw", -(CELL_WIDTH as isize));
    asm.seek(0);
    asm
}

/// `read`: drive out on `i`, copy the target cell into the data bus
/// without destroying it (through the spent `i0` as scratch), drive back
/// on `j`. Pre: `i = j = address`, `d = 0`, cursor on `s`. Post: `d`
/// holds the cell value, everything else zero, cursor on `s`.
fn read_op() -> Asm {
    let mut asm = Asm::new();
    asm.mark_dynamic();
    drive(&mut asm, I0, "amovlr", CELL_WIDTH as isize);

    for n in 0..CELL_WIDTH as isize {
        asm.copy(C0 + n, &[D0 + n], I0);
    }

    drive(&mut asm, J0, "amovrr", -(CELL_WIDTH as isize));
    asm.seek(0);
    asm
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::utils::{poke, run_program};

    const FUEL: u64 = 500_000_000;

    fn fragments() -> FragmentSet {
        let mut set = FragmentSet::new();
        define(&mut set).unwrap();
        set
    }

    /// Pre-state for a traversal: both address copies, plus the data bus.
    fn stage(addr: u32, val: u32) -> Vec<(usize, u8)> {
        let mut cells = stage_addr(addr);
        for (n, v) in val.to_le_bytes().iter().enumerate() {
            cells.push((D0 as usize + n, *v));
        }
        cells
    }

    fn stage_addr(addr: u32) -> Vec<(usize, u8)> {
        let digits = addr.to_le_bytes();
        let mut cells = Vec::new();
        for n in 0..ADDRESS_DIGITS {
            cells.push((I0 as usize + n, digits[n]));
            cells.push((J0 as usize + n, digits[n]));
        }
        cells
    }

    fn cell_base(addr: usize) -> usize {
        C0 as usize + CELL_WIDTH * addr
    }

    fn word(m: &crate::test_utils::utils::Machine, base: usize) -> u32 {
        m.word(base)
    }

    #[test]
    fn write_then_read_round_trips() {
        let set = fragments();
        let write = set.expand("write").unwrap();
        let read = set.expand("read").unwrap();

        // Addresses on both sides of the low-digit boundary.
        for (addr, val) in [
            (0u32, 0x1122_3344u32),
            (1, 42),
            (3, 0xDEAD_BEEF),
            (255, 7),
            (256, 0x0000_CAFE),
            (300, 1),
        ] {
            let program = format!(
                "{}{}{}{}",
                poke(&stage(addr, val)),
                write,
                poke(&stage_addr(addr)),
                read
            );
            let m = run_program(&program, &[], FUEL).unwrap();
            assert_eq!(m.cursor, 0, "cursor home after addr {addr}");
            assert_eq!(word(&m, D0 as usize), val, "bus after read of addr {addr}");
            assert_eq!(word(&m, cell_base(addr as usize)), val, "cell kept its value");
            // Sentinel and both address copies are spent.
            m.assert_zero(0, D0 as usize);
        }
    }

    #[test]
    fn write_restores_header_zeros() {
        let set = fragments();
        let program = format!("{}{}", poke(&stage(5, 0xA1B2_C3D4)), set.expand("write").unwrap());
        let m = run_program(&program, &[], FUEL).unwrap();
        assert_eq!(m.cursor, 0);
        m.assert_zero(0, C0 as usize);
        assert_eq!(word(&m, cell_base(5)), 0xA1B2_C3D4);
    }

    #[test]
    fn overwrite_replaces_previous_value() {
        let set = fragments();
        let write = set.expand("write").unwrap();
        let read = set.expand("read").unwrap();
        let program = format!(
            "{}{}{}{}{}{}",
            poke(&stage(2, 0xFFFF_FFFF)),
            write,
            poke(&stage(2, 0x0102_0304)),
            write,
            poke(&stage_addr(2)),
            read
        );
        let m = run_program(&program, &[], FUEL).unwrap();
        assert_eq!(word(&m, D0 as usize), 0x0102_0304);
        assert_eq!(word(&m, cell_base(2)), 0x0102_0304);
    }

    #[test]
    fn distinct_addresses_are_independent() {
        let set = fragments();
        let write = set.expand("write").unwrap();
        let read = set.expand("read").unwrap();
        let program = format!(
            "{}{}{}{}{}{}",
            poke(&stage(2, 111)),
            write,
            poke(&stage(5, 222)),
            write,
            poke(&stage_addr(2)),
            read
        );
        let m = run_program(&program, &[], FUEL).unwrap();
        assert_eq!(word(&m, D0 as usize), 111, "older write survives");
        assert_eq!(word(&m, cell_base(5)), 222);
        // Untouched neighbours read as zero.
        for a in [0, 1, 3, 4, 6] {
            assert_eq!(word(&m, cell_base(a)), 0, "cell {a}");
        }
    }

    #[test]
    #[ignore = "walks 64Ki cells each way; slow without optimizations"]
    fn high_digit_addressing() {
        let set = fragments();
        let program = format!(
            "{}{}{}{}",
            poke(&stage(65_536, 9)),
            set.expand("write").unwrap(),
            poke(&stage_addr(65_536)),
            set.expand("read").unwrap()
        );
        let m = run_program(&program, &[], u64::MAX).unwrap();
        assert_eq!(word(&m, D0 as usize), 9);
        assert_eq!(word(&m, cell_base(65_536)), 9);
    }

    #[test]
    fn rotation_covers_every_cell_once() {
        for outbound in [true, false] {
            let moves = rotation_moves(outbound);
            assert_eq!(moves.len(), WINDOW - 1);
            let mut sources: Vec<isize> = moves.iter().map(|m| m.0).collect();
            sources.sort_unstable();
            sources.dedup();
            assert_eq!(sources.len(), WINDOW - 1);
        }
    }

    #[test]
    fn outbound_rotation_frees_the_new_sentinel() {
        // The hole chain must terminate on the cell the sentinel would
        // occupy after the shift, leaving it zero.
        let moves = rotation_moves(true);
        assert_eq!(moves.last().unwrap().0, CELL_WIDTH as isize);
    }

    #[test]
    fn return_rotation_frees_the_new_sentinel() {
        let moves = rotation_moves(false);
        assert_eq!(moves.last().unwrap().0, -(CELL_WIDTH as isize));
    }

    #[test]
    fn step_fragments_declare_cell_stride() {
        let set = {
            let mut set = FragmentSet::new();
            define(&mut set).unwrap();
            set
        };
        assert_eq!(set.delta("amovlw"), Some(CELL_WIDTH as isize));
        assert_eq!(set.delta("amovrw"), Some(-(CELL_WIDTH as isize)));
        assert_eq!(set.delta("write"), Some(0));
        assert_eq!(set.delta("read"), Some(0));
        set.check().unwrap();
    }
}
