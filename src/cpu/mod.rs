//! CPU emulation for the TD4.
//!
//! This module implements the complete TD4 architecture:
//! - 16-byte program ROM
//! - 4 registers: A, B (accumulators), C (carry), PC
//! - 4-bit input and output ports
//! - 12-instruction set, one byte per instruction

pub mod rom;
pub mod registers;
pub mod decode;
pub mod execute;
pub mod clock;

pub use rom::{Rom, RomError, ROM_SIZE};
pub use registers::{Registers, Port};
pub use decode::{Instruction, Decoded, DecodeError, decode, decode_instruction, encode};
pub use execute::{Cpu, CpuError, CpuState, Event, RunExit, Snapshot, Step, Trace};
pub use clock::{CancelToken, Clock, ClockEvent, Immediate, Ticker};
