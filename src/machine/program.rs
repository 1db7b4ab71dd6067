//! Top-level program generator: loader + fetch/decode/execute loop.
//!
//! This module works in absolute tape coordinates (the generated
//! program's entry leaves the cursor on cell 0) and composes the memory,
//! register and integer fragments by seeking to their home cells between
//! calls. The decode ladder is generated mechanically from the opcode
//! table: a unary match that subtracts up to each tested opcode and runs
//! the arm whose flag survives.
//!
//! The machine:
//!
//! 1. Loader: reads bytes until four consecutive nulls, storing each byte
//!    in the low byte of memory[SP] and bumping SP (register 14) in
//!    place. Nulls are buffered and only stored when a later non-zero
//!    byte proves they were program content, so the terminator itself is
//!    never stored.
//! 2. Execute: while the `run` sentinel is set, copy IP (register 15)
//!    into the fetch address, fetch the opcode byte, decode, let the arm
//!    consume its operands and record its encoded length, then advance IP
//!    that many times and come home.

use crate::codegen::emitter::Asm;
use crate::codegen::errors::GenError;
use crate::codegen::fragment::{minify, FragmentSet};
use crate::codegen::{integer, memory, registers};
use crate::layout::{Layout, ADDRESS_DIGITS, CELL_WIDTH, IP, SP};
use crate::machine::isa::Opcode;

/// Builds the complete fragment set for the machine.
pub fn fragment_set(layout: &Layout) -> Result<FragmentSet, GenError> {
    let mut set = FragmentSet::new();
    memory::define(&mut set)?;
    registers::define(&mut set)?;
    integer::define(&mut set)?;

    set.define("loader", loader(layout).into_body())?;
    set.define("execute", execute(layout).into_body())?;

    let mut vm = Asm::new();
    vm.call("loader", 0);
    vm.call("execute", 0);
    set.define("vm", vm.into_body())?;
    Ok(set)
}

/// Generates the minified Brainfuck program.
pub fn generate(layout: &Layout) -> Result<String, GenError> {
    let set = fragment_set(layout)?;
    set.check()?;
    Ok(minify(&set.expand("vm")?))
}

/// Reads SP (register 14) onto the bank bus, duplicates its low three
/// bytes into the memory header's `i` and `j` digits, optionally moves
/// the pending input byte onto the data bus, then writes memory[SP] and
/// bumps SP in place.
fn store_at_sp(asm: &mut Asm, l: &Layout, with_byte: bool) {
    asm.seek(l.reg_index() as isize);
    asm.add(SP as usize);
    asm.call("r_read4", 0);
    for n in 0..ADDRESS_DIGITS {
        asm.transfer(
            l.reg_bus(n) as isize,
            &[l.mem_i(n) as isize, l.mem_j(n) as isize],
        );
    }
    asm.seek(l.reg_bus(3) as isize);
    asm.clear();

    if with_byte {
        asm.transfer(l.vm_byte() as isize, &[l.mem_bus(0) as isize]);
    }
    asm.seek(l.mem_sentinel() as isize);
    asm.call("write", 0);

    asm.seek(l.reg_slot(SP) as isize);
    asm.call("incr", 0);
}

/// Fetches the memory byte addressed by the fetch cursor into `dest`,
/// then bumps the fetch cursor. The fetch address is copied (not
/// consumed) so consecutive operand bytes stream without re-reading IP.
fn fetch_byte(asm: &mut Asm, l: &Layout, dest: usize) {
    for n in 0..ADDRESS_DIGITS {
        asm.copy(
            l.vm_fetch_byte(n) as isize,
            &[l.mem_i(n) as isize, l.mem_j(n) as isize],
            l.vm_tmp() as isize,
        );
    }
    asm.seek(l.mem_sentinel() as isize);
    asm.call("read", 0);
    asm.transfer(l.mem_bus(0) as isize, &[dest as isize]);
    asm.seek(l.vm_fetch() as isize);
    asm.call("incr", 0);
}

/// The loader phase. Entry and exit on cell 0.
fn loader(l: &Layout) -> Asm {
    let mut asm = Asm::new();
    asm.mark_dynamic();

    let run = l.vm_run() as isize;
    let rem = l.vm_rem() as isize;
    let pend = l.vm_pend() as isize;
    let byte = l.vm_byte() as isize;
    let t = l.vm_tmp() as isize;
    let t2 = l.vm_tmp2() as isize;

    asm.seek(rem);
    asm.add(4);
    asm.open();
    {
        asm.seek(byte);
        asm.input();
        // Duplicate the byte for the zero test, keeping the original.
        asm.transfer(byte, &[t, t2]);
        asm.transfer(t2, &[byte]);
        asm.add(1); // else-flag
        asm.seek(t);
        asm.open();
        {
            // Non-zero byte: it is program content.
            asm.clear();
            asm.seek(t2);
            asm.sub(1);
            // Buffered nulls were content too: store them, giving their
            // terminator budget back.
            asm.seek(pend);
            asm.open();
            {
                asm.sub(1);
                asm.seek(rem);
                asm.add(1);
                store_at_sp(&mut asm, l, false);
                asm.seek(pend);
            }
            asm.close();
            store_at_sp(&mut asm, l, true);
            asm.seek(t);
        }
        asm.close();
        asm.seek(t2);
        asm.open();
        {
            // Null byte: hold it back and count down the terminator.
            asm.sub(1);
            asm.seek(byte);
            asm.clear();
            asm.seek(pend);
            asm.add(1);
            asm.seek(rem);
            asm.sub(1);
            asm.seek(t2);
        }
        asm.close();
        asm.seek(rem);
    }
    asm.close();
    // The four terminator nulls are consumed, not stored.
    asm.seek(pend);
    asm.clear();
    asm.seek(run);
    asm
}

/// The fetch/decode/execute loop. Entry and exit on cell 0.
fn execute(l: &Layout) -> Asm {
    let mut asm = Asm::new();
    asm.mark_dynamic();

    let run = l.vm_run() as isize;

    asm.seek(run);
    asm.add(1);
    asm.open();
    {
        // Fetch address := IP.
        for n in 0..CELL_WIDTH {
            asm.seek(l.vm_fetch_byte(n) as isize);
            asm.clear();
        }
        asm.seek(l.reg_index() as isize);
        asm.add(IP as usize);
        asm.call("r_read4", 0);
        for n in 0..CELL_WIDTH {
            asm.transfer(l.reg_bus(n) as isize, &[l.vm_fetch_byte(n) as isize]);
        }

        fetch_byte(&mut asm, l, l.vm_op());

        asm.seek(l.vm_op() as isize);
        ladder(&mut asm, l, 0);

        // Scrub the data bus remnants before advancing.
        for n in 1..CELL_WIDTH {
            asm.seek(l.mem_bus(n) as isize);
            asm.clear();
        }

        // Advance IP by the arm's recorded length.
        asm.seek(l.mem_i(0) as isize);
        asm.open();
        {
            asm.sub(1);
            asm.seek(l.reg_slot(IP) as isize);
            asm.call("incr", 0);
            asm.seek(l.mem_i(0) as isize);
        }
        asm.close();
        asm.seek(run);
    }
    asm.close();
    asm
}

/// Emits decode level `k`: test the k-th table opcode, descend while the
/// value keeps not matching, and run the matching arm on the way back
/// out. Enter and exit on the opcode cell.
fn ladder(asm: &mut Asm, l: &Layout, k: usize) {
    let ops = Opcode::ALL;
    if k == ops.len() {
        // Unknown opcode: clear the halt sentinel and leave the advance
        // count at zero, so IP stays on the offending instruction.
        asm.clear();
        asm.seek(l.vm_run() as isize);
        asm.sub(1);
        asm.seek(l.vm_op() as isize);
        return;
    }

    let prev = if k == 0 { 0 } else { ops[k - 1] as u8 };
    let flag = l.vm_flag(k) as isize;
    let op = l.vm_op() as isize;

    asm.sub((ops[k] as u8 - prev) as usize);
    asm.seek(flag);
    asm.add(1);
    asm.seek(op);
    asm.open();
    {
        asm.seek(flag);
        asm.sub(1);
        asm.seek(op);
        ladder(asm, l, k + 1);
    }
    asm.close();
    asm.seek(flag);
    asm.open();
    {
        asm.sub(1);
        arm(asm, l, ops[k]);
        asm.seek(flag);
    }
    asm.close();
    asm.seek(op);
}

/// Emits one instruction arm. Arms consume their operand bytes through
/// the fetch cursor, apply their effect, and record their encoded length
/// in `i0` for the advance step.
fn arm(asm: &mut Asm, l: &Layout, op: Opcode) {
    match op {
        Opcode::Nop => {}
        Opcode::Clr => {
            fetch_byte(asm, l, l.reg_index());
            asm.seek(l.reg_index() as isize);
            asm.call("r_write4", 0);
        }
        Opcode::Setb => {
            fetch_byte(asm, l, l.reg_index());
            for n in 0..CELL_WIDTH {
                fetch_byte(asm, l, l.reg_bus(n));
            }
            asm.seek(l.reg_index() as isize);
            asm.call("r_write4", 0);
        }
    }
    asm.seek(l.mem_i(0) as isize);
    asm.add(op.encoded_len());
}
