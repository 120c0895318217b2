//! ROM image file format for TD4 programs.
//!
//! A ROM file is plain text mirroring the DIP switch rows of the real board:
//! - One byte per line as 8 binary digits (`0b` prefix and `_` optional)
//! - Anything after `;` is a comment
//! - Blank lines are ignored

use crate::asm::assembler::{assemble, AssemblerError};
use crate::asm::disasm::disassemble_byte;
use crate::cpu::{Rom, RomError};
use std::fmt::Write as _;
use std::path::Path;
use thiserror::Error;

/// Parse the text of a ROM file.
pub fn parse_rom(text: &str) -> Result<Rom, RomFileError> {
    let mut bytes = Vec::new();

    for (line_num, line) in text.lines().enumerate() {
        let content = match line.find(';') {
            Some(idx) => &line[..idx],
            None => line,
        };
        let Some(token) = content.split_whitespace().next() else {
            continue;
        };

        let digits = token.strip_prefix("0b").unwrap_or(token).replace('_', "");
        if digits.len() != 8 || !digits.chars().all(|c| c == '0' || c == '1') {
            return Err(RomFileError::ParseError {
                line: line_num + 1,
                message: format!("expected 8 binary digits, found '{}'", token),
            });
        }

        let byte = u8::from_str_radix(&digits, 2).map_err(|e| RomFileError::ParseError {
            line: line_num + 1,
            message: e.to_string(),
        })?;
        bytes.push(byte);
    }

    Ok(Rom::new(bytes)?)
}

/// Render a ROM in file form, each byte annotated with its disassembly.
pub fn format_rom(rom: &Rom) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "; TD4 ROM image");
    let _ = writeln!(text, "; {} bytes", rom.len());
    let _ = writeln!(text);

    for (addr, byte) in rom.as_bytes().iter().enumerate() {
        let _ = writeln!(
            text,
            "{:04b}_{:04b} ; {:02}: {}",
            byte >> 4,
            byte & 0x0F,
            addr,
            disassemble_byte(*byte)
        );
    }

    text
}

/// Load a ROM file from disk.
pub fn load_rom<P: AsRef<Path>>(path: P) -> Result<Rom, RomFileError> {
    let text = std::fs::read_to_string(path.as_ref())
        .map_err(|e| RomFileError::IoError(e.to_string()))?;
    parse_rom(&text)
}

/// Save a ROM file to disk.
pub fn save_rom<P: AsRef<Path>>(path: P, rom: &Rom) -> Result<(), RomFileError> {
    std::fs::write(path.as_ref(), format_rom(rom))
        .map_err(|e| RomFileError::IoError(e.to_string()))
}

/// Load a program from either an assembly source (`.asm`) or a ROM file.
pub fn load_program<P: AsRef<Path>>(path: P) -> Result<Rom, RomFileError> {
    let path = path.as_ref();
    if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("asm")) {
        let source = std::fs::read_to_string(path)
            .map_err(|e| RomFileError::IoError(e.to_string()))?;
        let bytes = assemble(&source)?;
        Ok(Rom::new(bytes)?)
    } else {
        load_rom(path)
    }
}

/// Errors that can occur during ROM file operations.
#[derive(Debug, Clone, Error)]
pub enum RomFileError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("parse error on line {line}: {message}")]
    ParseError { line: usize, message: String },

    #[error("assembly error: {0}")]
    Assembler(#[from] AssemblerError),

    #[error(transparent)]
    Rom(#[from] RomError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rom() {
        let text = "
            ; 1 + 1
            00110001 ; MOV A, 1
            0b0000_0001
            0100_0000

            10010000
        ";
        let rom = parse_rom(text).unwrap();
        assert_eq!(rom.as_bytes(), &[0x31, 0x01, 0x40, 0x90]);
    }

    #[test]
    fn test_parse_rejects_bad_lines() {
        assert!(matches!(
            parse_rom("00110001\n0011"),
            Err(RomFileError::ParseError { line: 2, .. })
        ));
        assert!(matches!(
            parse_rom("0011200x"),
            Err(RomFileError::ParseError { line: 1, .. })
        ));
    }

    #[test]
    fn test_parse_rejects_oversize() {
        let text = "10110001\n".repeat(17);
        assert!(matches!(
            parse_rom(&text),
            Err(RomFileError::Rom(RomError::TooLarge { size: 17 }))
        ));
    }

    #[test]
    fn test_formatted_rom_parses_back() {
        let rom = Rom::new(vec![0xB3, 0x01, 0xE1, 0xF0]).unwrap();
        let text = format_rom(&rom);
        assert!(text.contains("1011_0011 ; 00: OUT 0b0011"));
        assert_eq!(parse_rom(&text).unwrap(), rom);
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("td4-romfile-test-{}.rom", std::process::id()));
        let rom = Rom::new(vec![0x31, 0x90]).unwrap();

        save_rom(&path, &rom).unwrap();
        let loaded = load_program(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, rom);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            load_rom("/nonexistent/td4.rom"),
            Err(RomFileError::IoError(_))
        ));
    }
}
