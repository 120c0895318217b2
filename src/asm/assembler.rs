//! Simple assembler for TD4 programs.
//!
//! Syntax:
//! ```text
//! ; Comment
//! LOOP:           ; Define a label
//!     MOV A, 1    ; A := 1
//!     ADD A, 0b11 ; A := A + 3
//!     MOV B, A    ; B := A
//!     OUT B       ; Output B
//!     JNC LOOP    ; Jump to label while there is no carry
//!     DB 0xB3     ; Raw byte
//! ```
//!
//! Immediates are decimal, `0x` hex or `0b` binary and must fit in 4 bits.

use crate::nibble::Nibble;
use crate::cpu::ROM_SIZE;
use crate::cpu::decode::{Instruction, encode};
use std::collections::HashMap;
use thiserror::Error;

/// Assemble source code to a program image.
pub fn assemble(source: &str) -> Result<Vec<u8>, AssemblerError> {
    let mut asm = Assembler::new();
    asm.assemble(source)
}

/// A source line that produces one byte.
struct Statement<'a> {
    line: usize,
    mnemonic: String,
    operands: Vec<&'a str>,
}

/// The assembler state.
struct Assembler<'a> {
    /// Symbol table (label -> address).
    symbols: HashMap<String, u8>,
    /// Statements collected in pass 1.
    statements: Vec<Statement<'a>>,
}

impl<'a> Assembler<'a> {
    fn new() -> Self {
        Self {
            symbols: HashMap::new(),
            statements: Vec::new(),
        }
    }

    fn assemble(&mut self, source: &'a str) -> Result<Vec<u8>, AssemblerError> {
        // Pass 1: collect labels and statements
        for (line_num, line) in source.lines().enumerate() {
            self.process_line(line, line_num + 1)?;
        }

        if self.statements.len() > ROM_SIZE {
            return Err(AssemblerError::ProgramTooLarge {
                size: self.statements.len(),
            });
        }

        // Pass 2: encode with every label known
        self.statements
            .iter()
            .map(|stmt| self.encode_statement(stmt))
            .collect()
    }

    fn process_line(&mut self, line: &'a str, line_num: usize) -> Result<(), AssemblerError> {
        // Remove comments
        let line = match line.find(';') {
            Some(idx) => &line[..idx],
            None => line,
        };
        let mut line = line.trim();

        if line.is_empty() {
            return Ok(());
        }

        // Check for label definition
        if let Some(colon_idx) = line.find(':') {
            let label = line[..colon_idx].trim().to_uppercase();
            if label.is_empty() || label.contains(char::is_whitespace) {
                return Err(AssemblerError::SyntaxError {
                    line: line_num,
                    message: format!("invalid label '{}'", &line[..colon_idx]),
                });
            }
            let addr = u8::try_from(self.statements.len()).unwrap_or(u8::MAX);
            if self.symbols.insert(label.clone(), addr).is_some() {
                return Err(AssemblerError::DuplicateLabel { line: line_num, label });
            }

            line = line[colon_idx + 1..].trim();
            if line.is_empty() {
                return Ok(());
            }
        }

        let mut parts = line.splitn(2, char::is_whitespace);
        let mnemonic = parts.next().unwrap_or_default().to_uppercase();
        let operands = parts
            .next()
            .map(|rest| {
                rest.split(|c: char| c == ',' || c.is_whitespace())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        self.statements.push(Statement {
            line: line_num,
            mnemonic,
            operands,
        });
        Ok(())
    }

    fn encode_statement(&self, stmt: &Statement<'a>) -> Result<u8, AssemblerError> {
        if stmt.mnemonic == "DB" || stmt.mnemonic == "DATA" {
            let [value] = self.expect_operands::<1>(stmt)?;
            let byte = parse_number(value, stmt.line)?;
            return u8::try_from(byte).map_err(|_| AssemblerError::ValueOutOfRange {
                line: stmt.line,
                value: byte,
            });
        }

        let instr = self.parse_instruction(stmt)?;
        Ok(encode(&instr))
    }

    fn parse_instruction(&self, stmt: &Statement<'_>) -> Result<Instruction, AssemblerError> {
        let line = stmt.line;
        let ops: Vec<String> = stmt.operands.iter().map(|s| s.to_uppercase()).collect();
        let ops: Vec<&str> = ops.iter().map(String::as_str).collect();

        let instr = match (stmt.mnemonic.as_str(), ops.as_slice()) {
            // Transfer
            ("MOV", ["A", "B"]) => Instruction::MovAB,
            ("MOV", ["B", "A"]) => Instruction::MovBA,
            ("MOV", ["A", value]) => Instruction::MovA { im: parse_immediate(value, line)? },
            ("MOV", ["B", value]) => Instruction::MovB { im: parse_immediate(value, line)? },

            // Arithmetic
            ("ADD", ["A", value]) => Instruction::AddA { im: parse_immediate(value, line)? },
            ("ADD", ["B", value]) => Instruction::AddB { im: parse_immediate(value, line)? },

            // Control flow
            ("JMP", [target]) => Instruction::Jmp { im: self.parse_target(target, line)? },
            ("JNC", [target]) => Instruction::Jnc { im: self.parse_target(target, line)? },

            // I/O
            ("IN", ["A"]) => Instruction::InA,
            ("IN", ["B"]) => Instruction::InB,
            ("OUT", ["B"]) => Instruction::OutB,
            ("OUT", [value]) => Instruction::OutIm { im: parse_immediate(value, line)? },

            ("MOV" | "ADD" | "JMP" | "JNC" | "IN" | "OUT", _) => {
                return Err(AssemblerError::SyntaxError {
                    line,
                    message: format!(
                        "invalid operands for {}: '{}'",
                        stmt.mnemonic,
                        stmt.operands.join(", ")
                    ),
                });
            }

            _ => return Err(AssemblerError::UnknownMnemonic {
                line,
                mnemonic: stmt.mnemonic.clone(),
            }),
        };

        Ok(instr)
    }

    fn expect_operands<const N: usize>(&self, stmt: &Statement<'a>) -> Result<[&'a str; N], AssemblerError> {
        <[&str; N]>::try_from(stmt.operands.as_slice()).map_err(|_| AssemblerError::SyntaxError {
            line: stmt.line,
            message: format!("{} expects {} operand(s)", stmt.mnemonic, N),
        })
    }

    /// A jump target is either a number or a label.
    fn parse_target(&self, operand: &str, line: usize) -> Result<Nibble, AssemblerError> {
        if operand.starts_with(|c: char| c.is_ascii_digit()) {
            return parse_immediate(operand, line);
        }
        let addr = *self.symbols.get(operand).ok_or_else(|| AssemblerError::UndefinedLabel {
            line,
            label: operand.to_string(),
        })?;
        // A label placed after the 16th instruction has no address to jump to.
        Nibble::checked(addr).ok_or(AssemblerError::ValueOutOfRange {
            line,
            value: i64::from(addr),
        })
    }
}

/// Parse a 4-bit immediate.
fn parse_immediate(operand: &str, line: usize) -> Result<Nibble, AssemblerError> {
    let value = parse_number(operand, line)?;
    u8::try_from(value)
        .ok()
        .and_then(Nibble::checked)
        .ok_or(AssemblerError::ValueOutOfRange { line, value })
}

/// Parse a decimal, `0x` hex or `0b` binary literal.
fn parse_number(operand: &str, line: usize) -> Result<i64, AssemblerError> {
    let operand = operand.trim().replace('_', "");
    let lower = operand.to_lowercase();

    let parsed = if let Some(hex) = lower.strip_prefix("0x") {
        i64::from_str_radix(hex, 16)
    } else if let Some(bin) = lower.strip_prefix("0b") {
        i64::from_str_radix(bin, 2)
    } else {
        lower.parse::<i64>()
    };

    parsed.map_err(|_| AssemblerError::SyntaxError {
        line,
        message: format!("invalid number '{}'", operand),
    })
}

/// Errors that can occur during assembly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblerError {
    #[error("syntax error on line {line}: {message}")]
    SyntaxError { line: usize, message: String },

    #[error("unknown mnemonic on line {line}: {mnemonic}")]
    UnknownMnemonic { line: usize, mnemonic: String },

    #[error("undefined label on line {line}: {label}")]
    UndefinedLabel { line: usize, label: String },

    #[error("duplicate label on line {line}: {label}")]
    DuplicateLabel { line: usize, label: String },

    #[error("value out of range on line {line}: {value}")]
    ValueOutOfRange { line: usize, value: i64 },

    #[error("program is {size} bytes, the ROM holds 16")]
    ProgramTooLarge { size: usize },
}
