//! TD4 registers and I/O port.
//!
//! The TD4 has four pieces of architectural state:
//! - A: 4-bit accumulator
//! - B: 4-bit accumulator
//! - C: carry flag
//! - PC: 4-bit program counter
//!
//! plus a 4-bit input port and a 4-bit output port.

use crate::nibble::Nibble;
use serde::{Serialize, Deserialize};

/// The TD4 register file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    /// A: first accumulator
    pub a: Nibble,

    /// B: second accumulator
    pub b: Nibble,

    /// C: carry flag, set by ADD on overflow and consumed by JNC
    pub c: bool,

    /// PC: program counter, addresses the ROM
    pub pc: Nibble,
}

impl Registers {
    /// Create a new register file with all values zeroed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset all registers to zero.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Increment the program counter by 1, wrapping at 16.
    /// Returns the old value.
    pub fn advance_pc(&mut self) -> Nibble {
        let old = self.pc;
        self.pc = self.pc.wrapping_add(Nibble::new(1));
        old
    }

    /// Set the program counter to an absolute address.
    pub fn jump(&mut self, addr: Nibble) {
        self.pc = addr;
    }
}

/// The I/O port.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    /// Input latch, driven from outside the CPU.
    pub input: Nibble,
    /// Output latch, written by OUT.
    pub output: Nibble,
}

impl Port {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
