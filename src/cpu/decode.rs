//! Instruction decoder for the TD4.
//!
//! Every instruction is a single byte: the high nibble selects the
//! operation, the low nibble is an immediate operand. Register-to-register
//! moves and the register forms of IN/OUT ignore the low nibble.

use crate::nibble::Nibble;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Decoded TD4 instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    // ==================== Transfer ====================

    /// A := im
    MovA { im: Nibble },

    /// B := im
    MovB { im: Nibble },

    /// B := A
    MovBA,

    /// A := B
    MovAB,

    // ==================== Arithmetic ====================

    /// A := A + im, C set on overflow
    AddA { im: Nibble },

    /// B := B + im, C set on overflow
    AddB { im: Nibble },

    // ==================== Control Flow ====================

    /// PC := im
    Jmp { im: Nibble },

    /// Jump if no carry: if !C then PC := im
    Jnc { im: Nibble },

    // ==================== I/O ====================

    /// A := input port
    InA,

    /// B := input port
    InB,

    /// output port := B
    OutB,

    /// output port := im
    OutIm { im: Nibble },
}

/// Opcode values (high nibble of the instruction byte).
#[derive(Debug, Clone, Copy)]
struct Opcode;

impl Opcode {
    const ADD_A: u8 = 0b0000;
    const MOV_AB: u8 = 0b0001;
    const IN_A: u8 = 0b0010;
    const MOV_A: u8 = 0b0011;
    const MOV_BA: u8 = 0b0100;
    const ADD_B: u8 = 0b0101;
    const IN_B: u8 = 0b0110;
    const MOV_B: u8 = 0b0111;
    const OUT_B: u8 = 0b1001;
    const OUT_IM: u8 = 0b1011;
    const JNC: u8 = 0b1110;
    const JMP: u8 = 0b1111;
}

/// The raw fields of an instruction byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoded {
    pub opcode: Nibble,
    pub operand: Nibble,
}

/// Split an instruction byte into opcode and operand.
///
/// Never fails. For the forms without an immediate field (MOV A,B; MOV B,A;
/// IN A; IN B; OUT B) the operand is forced to 0. Whether the opcode names a
/// real instruction is checked by [`Instruction::try_from`].
pub fn decode(byte: u8) -> Decoded {
    let opcode = byte >> 4;
    let operand = match opcode {
        Opcode::MOV_AB | Opcode::MOV_BA | Opcode::IN_A | Opcode::IN_B | Opcode::OUT_B => 0,
        _ => byte & Nibble::MASK,
    };
    Decoded {
        opcode: Nibble::new(opcode),
        operand: Nibble::new(operand),
    }
}

impl TryFrom<Decoded> for Instruction {
    type Error = DecodeError;

    fn try_from(decoded: Decoded) -> Result<Self, Self::Error> {
        let im = decoded.operand;
        let instruction = match decoded.opcode.get() {
            Opcode::MOV_A => Instruction::MovA { im },
            Opcode::MOV_B => Instruction::MovB { im },
            Opcode::MOV_BA => Instruction::MovBA,
            Opcode::MOV_AB => Instruction::MovAB,
            Opcode::ADD_A => Instruction::AddA { im },
            Opcode::ADD_B => Instruction::AddB { im },
            Opcode::JMP => Instruction::Jmp { im },
            Opcode::JNC => Instruction::Jnc { im },
            Opcode::IN_A => Instruction::InA,
            Opcode::IN_B => Instruction::InB,
            Opcode::OUT_B => Instruction::OutB,
            Opcode::OUT_IM => Instruction::OutIm { im },
            op => return Err(DecodeError::InvalidOpcode(op)),
        };
        Ok(instruction)
    }
}

/// Decode an instruction byte straight to an [`Instruction`].
pub fn decode_instruction(byte: u8) -> Result<Instruction, DecodeError> {
    Instruction::try_from(decode(byte))
}

/// Encode an instruction back to its byte form.
///
/// Operand-less forms encode with a zero low nibble.
pub fn encode(instr: &Instruction) -> u8 {
    let (opcode, im) = match *instr {
        Instruction::MovA { im } => (Opcode::MOV_A, im),
        Instruction::MovB { im } => (Opcode::MOV_B, im),
        Instruction::MovBA => (Opcode::MOV_BA, Nibble::ZERO),
        Instruction::MovAB => (Opcode::MOV_AB, Nibble::ZERO),
        Instruction::AddA { im } => (Opcode::ADD_A, im),
        Instruction::AddB { im } => (Opcode::ADD_B, im),
        Instruction::Jmp { im } => (Opcode::JMP, im),
        Instruction::Jnc { im } => (Opcode::JNC, im),
        Instruction::InA => (Opcode::IN_A, Nibble::ZERO),
        Instruction::InB => (Opcode::IN_B, Nibble::ZERO),
        Instruction::OutB => (Opcode::OUT_B, Nibble::ZERO),
        Instruction::OutIm { im } => (Opcode::OUT_IM, im),
    };
    (opcode << 4) | im.get()
}

/// Errors that can occur during instruction decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid opcode: {0:04b}")]
    InvalidOpcode(u8),
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_decode_mov_a() {
        let d = decode(0b0011_0101);
        assert_eq!(d.opcode.get(), 0b0011);
        assert_eq!(d.operand.get(), 5);
        assert_eq!(
            Instruction::try_from(d).unwrap(),
            Instruction::MovA { im: Nibble::new(5) }
        );
    }

    #[test]
    fn test_decode_forces_operand_to_zero() {
        let d = decode(0b0100_0111);
        assert_eq!(d.opcode.get(), 0b0100);
        assert_eq!(d.operand, Nibble::ZERO);
        assert_eq!(Instruction::try_from(d).unwrap(), Instruction::MovBA);

        for byte in [0x1F, 0x2A, 0x63, 0x9C] {
            assert_eq!(decode(byte).operand, Nibble::ZERO, "byte {:#04x}", byte);
        }
    }

    #[test]
    fn test_decode_zero_is_add_a_zero() {
        assert_eq!(
            decode_instruction(0x00).unwrap(),
            Instruction::AddA { im: Nibble::ZERO }
        );
    }

    #[test]
    fn test_unassigned_opcodes() {
        for op in [0b1000u8, 0b1010, 0b1100, 0b1101] {
            let byte = (op << 4) | 0x3;
            assert_eq!(
                decode_instruction(byte),
                Err(DecodeError::InvalidOpcode(op))
            );
        }
    }

    #[test]
    fn test_encode_known_bytes() {
        assert_eq!(encode(&Instruction::MovA { im: Nibble::new(1) }), 0x31);
        assert_eq!(encode(&Instruction::AddA { im: Nibble::new(1) }), 0x01);
        assert_eq!(encode(&Instruction::MovBA), 0x40);
        assert_eq!(encode(&Instruction::OutB), 0x90);
        assert_eq!(encode(&Instruction::Jmp { im: Nibble::MAX }), 0xFF);
    }

    proptest! {
        #[test]
        fn prop_decoded_instruction_reencodes(byte in any::<u8>()) {
            if let Ok(instr) = decode_instruction(byte) {
                let d = decode(byte);
                let expected = (d.opcode.get() << 4) | d.operand.get();
                prop_assert_eq!(encode(&instr), expected);
            }
        }
    }
}
