//! # TD4 Emulator
//!
//! An emulator of the TD4, the minimal 4-bit CPU from the Japanese textbook
//! "CPUの創りかた". The machine has two 4-bit accumulators, a carry flag,
//! a 4-bit program counter, a 4-bit input and output port and a 16-byte ROM,
//! and executes one of twelve instructions per clock pulse.

pub mod nibble;
pub mod cpu;
pub mod asm;
pub mod config;

#[cfg(feature = "tui")]
pub mod tui;

// Re-export commonly used types
pub use nibble::Nibble;
pub use cpu::{Cpu, CpuState, CpuError, Rom, RomError, Registers, Port, Instruction, Event, RunExit};
pub use cpu::{CancelToken, Clock, Immediate, Ticker};
pub use asm::{assemble, disassemble, AssemblerError, load_program, load_rom, save_rom};
pub use config::{EmulatorConfig, ConfigError};

#[cfg(feature = "tui")]
pub use tui::run_debugger;
