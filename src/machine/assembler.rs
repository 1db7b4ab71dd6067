//! Assembly parser and byte-stream compiler for the VM's instruction set.
//!
//! Converts human-readable assembly into the byte stream the loader
//! expects on stdin. Uses [`for_each_opcode!`](crate::for_each_opcode) to
//! generate the assembler IR, the mnemonic lookup and the encoder.
//!
//! # Syntax
//!
//! ```text
//! INSTRUCTION operand1, operand2   # optional comment
//! ```
//!
//! - Instructions are uppercase (e.g. `SETB`, `CLR`)
//! - Registers use `r` prefix (e.g. `r0`, `r15`)
//! - Immediates are decimal or `0x` hexadecimal u32 (e.g. `42`, `0x2A`)
//! - Comments start with `#`
//! - Commas between operands are optional

use crate::define_opcodes;
use crate::for_each_opcode;
use crate::machine::errors::AsmError;
use crate::machine::isa::Opcode;

const COMMENT_CHAR: char = '#';

/// The four-null end-of-program marker consumed (and not stored) by the
/// loader.
pub const TERMINATOR: [u8; 4] = [0; 4];

/// Splits one line into tokens; `#` starts a comment, commas are
/// separators.
fn tokenize(line: &str) -> Vec<&str> {
    let code = line.split(COMMENT_CHAR).next().unwrap_or("");
    code.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .collect()
}

/// Parses a register token like `r0`, `r15`.
pub(crate) fn parse_reg(tok: &str) -> Result<u8, AsmError> {
    tok.strip_prefix('r')
        .ok_or_else(|| AsmError::ExpectedRegister(tok.to_string()))?
        .parse::<u8>()
        .map_err(|_| AsmError::InvalidRegister(tok.to_string()))
}

/// Parses a u32 immediate, decimal or `0x`-prefixed hexadecimal.
pub(crate) fn parse_imm32(tok: &str) -> Result<u32, AsmError> {
    let parsed = match tok.strip_prefix("0x") {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => tok.parse::<u32>(),
    };
    parsed.map_err(|_| AsmError::InvalidImmediate(tok.to_string()))
}

macro_rules! define_parse_opcode {
    (
        $(
            $(#[$doc:meta])*
            $name:ident = $opcode:expr, $mnemonic:literal => [
                $( $field:ident : $kind:ident ),* $(,)?
            ], $len:expr
        ),* $(,)?
    ) => {
        // =========================
        // Assembler IR
        // =========================
        #[derive(Debug, Clone)]
        enum AsmInstr {
            $(
                $name {
                    $( $field: define_opcodes!(@ty $kind) ),*
                },
            )*
        }

        impl AsmInstr {
            /// Encodes the instruction into the output stream.
            fn assemble(&self, out: &mut Vec<u8>) {
                match self {
                    $(
                        AsmInstr::$name { $( $field ),* } => {
                            out.push($opcode);
                            $(
                                define_opcodes!(@emit out, $kind, $field);
                            )*
                        }
                    ),*
                }
            }
        }

        fn opcode_from_str(name: &str) -> Result<Opcode, AsmError> {
            match name {
                $( $mnemonic => Ok(Opcode::$name), )*
                _ => Err(AsmError::UnknownMnemonic(name.to_string())),
            }
        }

        /// Parses one tokenized instruction into [`AsmInstr`].
        fn parse_instruction(tokens: &[&str]) -> Result<AsmInstr, AsmError> {
            let instr = opcode_from_str(tokens[0])?;
            match instr {
                $(
                    Opcode::$name => {
                        const EXPECTED: usize = define_parse_opcode!(@count $( $field ),*);
                        if tokens.len() != EXPECTED + 1 {
                            return Err(AsmError::ArityMismatch {
                                mnemonic: $mnemonic,
                                expected: EXPECTED,
                                actual: tokens.len() - 1,
                            });
                        }
                        define_parse_opcode!(@construct tokens; $name $( $field : $kind ),*)
                    }
                ),*
            }
        }
    };

    // ---------- counting ----------
    (@count $( $x:ident ),* ) => {
        <[()]>::len(&[ $( define_parse_opcode!(@unit $x) ),* ])
    };

    (@unit $x:ident) => { () };

    // ---------- parsing ----------
    (@construct $tokens:ident; $name:ident) => {
        Ok(AsmInstr::$name { })
    };

    (@construct $tokens:ident; $name:ident $( $field:ident : $kind:ident ),+ ) => {{
        let mut it = $tokens.iter().skip(1);
        Ok(AsmInstr::$name {
            $(
                $field: define_parse_opcode!(@parse $kind, it.next().unwrap())?,
            )*
        })
    }};

    (@parse Reg, $tok:expr) => {
        parse_reg($tok)
    };

    (@parse Imm32, $tok:expr) => {
        parse_imm32($tok)
    };
}

for_each_opcode!(define_parse_opcode);

/// Assembles a source string into the VM byte stream (terminator not
/// included; see [`input_stream`]).
pub fn assemble_source(source: &str) -> Result<Vec<u8>, AsmError> {
    let mut out = Vec::new();
    for (line_no, line) in source.lines().enumerate() {
        let tokens = tokenize(line);
        if tokens.is_empty() {
            continue;
        }
        let instr = parse_instruction(&tokens).map_err(|e| AsmError::AssemblyError {
            line: line_no + 1,
            source: e.to_string(),
        })?;
        instr.assemble(&mut out);
    }
    Ok(out)
}

/// Appends the four-null terminator, producing the loader's stdin stream.
pub fn input_stream(code: &[u8]) -> Vec<u8> {
    let mut out = code.to_vec();
    out.extend_from_slice(&TERMINATOR);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_reg_valid() {
        assert_eq!(parse_reg("r0").unwrap(), 0);
        assert_eq!(parse_reg("r15").unwrap(), 15);
        assert_eq!(parse_reg("r255").unwrap(), 255);
    }

    #[test]
    fn parse_reg_missing_prefix() {
        assert!(matches!(parse_reg("5"), Err(AsmError::ExpectedRegister(_))));
        assert!(matches!(parse_reg("x5"), Err(AsmError::ExpectedRegister(_))));
    }

    #[test]
    fn parse_reg_invalid_number() {
        assert!(matches!(parse_reg("r"), Err(AsmError::InvalidRegister(_))));
        assert!(matches!(parse_reg("r256"), Err(AsmError::InvalidRegister(_))));
        assert!(matches!(parse_reg("r-1"), Err(AsmError::InvalidRegister(_))));
    }

    #[test]
    fn parse_imm32_decimal_and_hex() {
        assert_eq!(parse_imm32("42").unwrap(), 42);
        assert_eq!(parse_imm32("0x2A").unwrap(), 42);
        assert_eq!(parse_imm32("4294967295").unwrap(), u32::MAX);
        assert!(matches!(
            parse_imm32("4294967296"),
            Err(AsmError::InvalidImmediate(_))
        ));
        assert!(matches!(parse_imm32("abc"), Err(AsmError::InvalidImmediate(_))));
    }

    #[test]
    fn assemble_empty_source() {
        assert!(assemble_source("").unwrap().is_empty());
    }

    #[test]
    fn assemble_comments_and_blank_lines() {
        let source = "\n# a comment\n\n  # another\n";
        assert!(assemble_source(source).unwrap().is_empty());
    }

    #[test]
    fn assemble_nop() {
        assert_eq!(assemble_source("NOP").unwrap(), vec![0x01]);
    }

    #[test]
    fn assemble_clr() {
        assert_eq!(assemble_source("CLR r3").unwrap(), vec![0x02, 0x03]);
    }

    #[test]
    fn assemble_setb() {
        let code = assemble_source("SETB r5, 42").unwrap();
        assert_eq!(code, vec![0x03, 0x05, 0x2A, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn assemble_setb_hex_immediate() {
        let code = assemble_source("SETB r0, 0xFFFFFFFF").unwrap();
        assert_eq!(code, vec![0x03, 0x00, 0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn assemble_inline_comment() {
        let code = assemble_source("SETB r5, 42 # meaning of life").unwrap();
        assert_eq!(code.len(), Opcode::Setb.encoded_len());
    }

    #[test]
    fn assemble_multiple_lines() {
        let source = "NOP\nCLR r1\nSETB r2, 7";
        let code = assemble_source(source).unwrap();
        assert_eq!(code.len(), 1 + 2 + 6);
        assert_eq!(code[0], 0x01);
        assert_eq!(code[1], 0x02);
        assert_eq!(code[3], 0x03);
    }

    #[test]
    fn assemble_unknown_mnemonic() {
        let err = assemble_source("HCF r0").unwrap_err();
        assert!(matches!(
            err,
            AsmError::AssemblyError { line: 1, ref source } if source.contains("unknown instruction")
        ));
    }

    #[test]
    fn assemble_wrong_arity() {
        let err = assemble_source("CLR r0, r1").unwrap_err();
        assert!(matches!(
            err,
            AsmError::AssemblyError { line: 1, ref source } if source.contains("operands")
        ));
    }

    #[test]
    fn assemble_error_reports_line() {
        let err = assemble_source("NOP\nBAD").unwrap_err();
        assert!(matches!(err, AsmError::AssemblyError { line: 2, .. }));
    }

    #[test]
    fn input_stream_appends_terminator() {
        let stream = input_stream(&[0x01]);
        assert_eq!(stream, vec![0x01, 0x00, 0x00, 0x00, 0x00]);
    }
}
