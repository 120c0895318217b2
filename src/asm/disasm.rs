//! Disassembler for TD4 programs.
//!
//! Converts ROM bytes back to readable assembly.

use crate::cpu::decode::{decode_instruction, Instruction};

/// Disassemble a single instruction byte to text.
pub fn disassemble_byte(byte: u8) -> String {
    match decode_instruction(byte) {
        Ok(decoded) => format_instruction(&decoded),
        Err(_) => format!("??? ; {:#04x}", byte),
    }
}

/// Disassemble a whole program.
pub fn disassemble(program: &[u8]) -> String {
    let mut output = String::new();
    output.push_str("; TD4 Disassembly\n");
    output.push_str("; ---------------\n\n");

    for (addr, byte) in program.iter().enumerate() {
        let line = disassemble_byte(*byte);
        output.push_str(&format!("{:02}: {:04b}_{:04b}  {}\n", addr, byte >> 4, byte & 0x0F, line));
    }

    output
}

/// Format a decoded instruction as assembly text.
pub fn format_instruction(instr: &Instruction) -> String {
    match instr {
        // Transfer
        Instruction::MovA { im } => format!("MOV A, {}", im.get()),
        Instruction::MovB { im } => format!("MOV B, {}", im.get()),
        Instruction::MovBA => "MOV B, A".to_string(),
        Instruction::MovAB => "MOV A, B".to_string(),

        // Arithmetic
        Instruction::AddA { im } => format!("ADD A, {}", im.get()),
        Instruction::AddB { im } => format!("ADD B, {}", im.get()),

        // Control
        Instruction::Jmp { im } => format!("JMP {}", im.get()),
        Instruction::Jnc { im } => format!("JNC {}", im.get()),

        // I/O
        Instruction::InA => "IN A".to_string(),
        Instruction::InB => "IN B".to_string(),
        Instruction::OutB => "OUT B".to_string(),
        Instruction::OutIm { im } => format!("OUT 0b{}", im),
    }
}
