//! Instruction Set Architecture (ISA) definitions.
//!
//! [`for_each_opcode!`](crate::for_each_opcode) holds the canonical
//! instruction list and invokes a callback macro for code generation, so
//! the enum here, the assembler in [`assembler`](super::assembler) and
//! the decode ladder in [`program`](super::program) are all generated
//! from one definition.
//!
//! # Encoding
//!
//! One instruction byte per 4-byte memory cell (the loader stores each
//! input byte into the low byte of consecutive cells):
//! - Opcode: 1 byte
//! - Register operand: 1 byte
//! - Immediate u32: 4 bytes (little-endian)
//!
//! The encoded length drives the instruction-pointer advance; the decoder
//! treats any byte outside the table as a halt.

use crate::machine::errors::AsmError;

/// Invokes a callback macro with the complete opcode definition list.
///
/// This macro enables code generation for instructions in multiple
/// modules without duplicating the definitions.
#[macro_export]
macro_rules! for_each_opcode {
    ($callback:ident) => {
        $callback! {
            /// NOP ; no effect
            Nop = 0x01, "NOP" => [], 1,
            /// CLR r ; zero all four bytes of register r
            Clr = 0x02, "CLR" => [r: Reg], 2,
            /// SETB r, imm32 ; load a 32-bit immediate into register r
            Setb = 0x03, "SETB" => [r: Reg, imm: Imm32], 6,
        }
    };
}

#[macro_export]
macro_rules! define_opcodes {
    (
        $(
            $(#[$doc:meta])*
            $name:ident = $opcode:expr, $mnemonic:literal => [
                $( $field:ident : $kind:ident ),* $(,)?
            ], $len:expr
        ),* $(,)?
    ) => {
        /// A VM instruction opcode.
        #[derive(Copy, Clone, Debug, Eq, PartialEq)]
        pub enum Opcode {
            $(
                $(#[$doc])*
                $name = $opcode,
            )*
        }

        impl TryFrom<u8> for Opcode {
            type Error = AsmError;

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                match value {
                    $( $opcode => Ok(Opcode::$name), )*
                    _ => Err(AsmError::UnknownOpcode(value)),
                }
            }
        }

        impl Opcode {
            /// Every opcode, in table order.
            pub const ALL: &'static [Opcode] = &[ $( Opcode::$name, )* ];

            /// Returns the assembly mnemonic for this opcode.
            pub const fn mnemonic(&self) -> &'static str {
                match self {
                    $( Opcode::$name => $mnemonic, )*
                }
            }

            /// Returns the encoded length in bytes (opcode + operands).
            pub const fn encoded_len(&self) -> usize {
                match self {
                    $( Opcode::$name => $len, )*
                }
            }

            /// Returns the sum of the operand widths in bytes.
            pub const fn operand_len(&self) -> usize {
                match self {
                    $(
                        Opcode::$name => {
                            0usize $( + define_opcodes!(@size $kind) )*
                        }
                    ),*
                }
            }
        }
    };

    // ---------- operand types ----------
    (@ty Reg)   => { u8 };
    (@ty Imm32) => { u32 };

    // ---------- operand sizes ----------
    (@size Reg)   => { 1usize };
    (@size Imm32) => { 4usize };

    // ---------- encoding ----------
    (@emit $out:ident, Reg, $v:ident) => {
        $out.push(*$v);
    };

    (@emit $out:ident, Imm32, $v:ident) => {
        $out.extend_from_slice(&$v.to_le_bytes());
    };
}

for_each_opcode!(define_opcodes);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_try_from_invalid() {
        assert!(matches!(
            Opcode::try_from(0xFF),
            Err(AsmError::UnknownOpcode(0xFF))
        ));
        assert!(matches!(
            Opcode::try_from(0x00),
            Err(AsmError::UnknownOpcode(0x00))
        ));
    }

    #[test]
    fn opcode_try_from_valid() {
        assert_eq!(Opcode::try_from(0x01).unwrap(), Opcode::Nop);
        assert_eq!(Opcode::try_from(0x02).unwrap(), Opcode::Clr);
        assert_eq!(Opcode::try_from(0x03).unwrap(), Opcode::Setb);
    }

    #[test]
    fn declared_length_matches_operands() {
        for op in Opcode::ALL {
            assert_eq!(
                op.encoded_len(),
                1 + op.operand_len(),
                "{} length out of sync with its operand list",
                op.mnemonic()
            );
        }
    }
}
