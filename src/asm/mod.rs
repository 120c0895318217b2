//! Assembler, disassembler and ROM files for TD4 programs.
//!
//! This module provides:
//! - A simple two-pass assembler (text → ROM image)
//! - A disassembler (ROM image → readable text)
//! - Loading and saving of ROM image files

pub mod assembler;
pub mod disasm;
pub mod romfile;

pub use assembler::{assemble, AssemblerError};
pub use disasm::{disassemble, disassemble_byte};
pub use romfile::{format_rom, load_program, load_rom, parse_rom, save_rom, RomFileError};
