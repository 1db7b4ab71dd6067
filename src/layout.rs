//! Tape layout for the generated machine.
//!
//! Every emitter takes a [`Layout`] and derives its cell positions from it;
//! no fragment hard-codes a tape offset. The tape is split into three
//! regions:
//!
//! ```text
//! 0                16                           128
//! [ vm scratch ..][ ri | bank hdr | slot 0..15 ][ s | i | j | d | cell 0.. ]
//! ```
//!
//! The scratch region holds the outer-loop sentinel, the loader counters
//! and the fetch cursor. The register file is a banked array of sixteen
//! 6-cell slots behind a 1-byte index cell. Memory is the INSHAME array:
//! an 11-cell header (sentinel, two address copies, data bus) followed by
//! 4-byte cells.

/// Number of cells in a memory cell (and in the data bus).
pub const CELL_WIDTH: usize = 4;

/// Number of cells in one register slot: two scratch cells plus the data.
pub const SLOT_WIDTH: usize = 2 + CELL_WIDTH;

/// Number of radix-256 digits in a memory address.
pub const ADDRESS_DIGITS: usize = 3;

/// Memory header: sentinel + two address copies + data bus.
pub const HEADER_WIDTH: usize = 1 + 2 * ADDRESS_DIGITS + CELL_WIDTH;

/// Number of registers in the file.
pub const REGISTER_COUNT: usize = 16;

/// Register used by the loader as its write cursor.
pub const SP: u8 = 14;

/// Register holding the instruction pointer.
pub const IP: u8 = 15;

/// Fixed cell positions on the host tape.
///
/// The `vm_*` fields name individual scratch cells used by the loader and
/// the fetch/decode/execute loop; everything else is derived from the two
/// region bases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    /// Base of the register file region.
    pub register_base: usize,
    /// Base of the memory region.
    pub memory_base: usize,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            register_base: 16,
            memory_base: 128,
        }
    }
}

impl Layout {
    // ---------- vm scratch cells ----------

    /// Outer execute-loop sentinel; also the machine's home position.
    pub const fn vm_run(&self) -> usize {
        0
    }

    /// Loader: terminator nulls still expected (counts down from 4).
    pub const fn vm_rem(&self) -> usize {
        1
    }

    /// Loader: nulls seen but not yet stored.
    pub const fn vm_pend(&self) -> usize {
        2
    }

    /// Loader: the byte just read.
    pub const fn vm_byte(&self) -> usize {
        3
    }

    /// General scratch.
    pub const fn vm_tmp(&self) -> usize {
        4
    }

    /// Second scratch, used as the else-flag of the loader's byte test.
    pub const fn vm_tmp2(&self) -> usize {
        5
    }

    /// Opcode being decoded.
    pub const fn vm_op(&self) -> usize {
        6
    }

    /// Decode ladder flag for the n-th tested opcode (n is 0-based).
    pub const fn vm_flag(&self, n: usize) -> usize {
        7 + n
    }

    /// Fetch cursor, laid out as an `incr` operand (`0 0 a0 a1 a2 a3`).
    /// Returns the position of the first scratch cell.
    pub const fn vm_fetch(&self) -> usize {
        10
    }

    /// Byte `n` of the fetch address.
    pub const fn vm_fetch_byte(&self, n: usize) -> usize {
        self.vm_fetch() + 2 + n
    }

    // ---------- register file ----------

    /// The 1-byte register index cell; home position for register ops.
    pub const fn reg_index(&self) -> usize {
        self.register_base
    }

    /// Byte `n` of the register data bus (in the bank header slot).
    pub const fn reg_bus(&self, n: usize) -> usize {
        self.register_base + 3 + n
    }

    /// First scratch cell of register `r`'s slot. The slot doubles as an
    /// `incr` operand, so `incr` applied here bumps the register in place.
    pub const fn reg_slot(&self, r: u8) -> usize {
        self.register_base + 1 + SLOT_WIDTH * (1 + r as usize)
    }

    /// Byte `n` of register `r`.
    pub const fn reg_byte(&self, r: u8, n: usize) -> usize {
        self.reg_slot(r) + 2 + n
    }

    // ---------- memory ----------

    /// The permanently-zero sentinel; home position for memory ops.
    pub const fn mem_sentinel(&self) -> usize {
        self.memory_base
    }

    /// Digit `n` of the driving address copy.
    pub const fn mem_i(&self, n: usize) -> usize {
        self.memory_base + 1 + n
    }

    /// Digit `n` of the return address copy.
    pub const fn mem_j(&self, n: usize) -> usize {
        self.memory_base + 1 + ADDRESS_DIGITS + n
    }

    /// Byte `n` of the memory data bus.
    pub const fn mem_bus(&self, n: usize) -> usize {
        self.memory_base + 1 + 2 * ADDRESS_DIGITS + n
    }

    /// First byte of memory cell `a` (as seen with the header at home).
    pub const fn mem_cell(&self, a: usize) -> usize {
        self.memory_base + HEADER_WIDTH + CELL_WIDTH * a
    }
}
