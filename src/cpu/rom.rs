//! TD4 program store.
//!
//! The TD4 reads instructions from a 16-byte ROM (on the real board, a bank
//! of DIP switches). Programs shorter than 16 bytes are allowed; the length
//! matters because the CPU halts once the program counter runs past it.

use crate::nibble::Nibble;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// The number of bytes the TD4 can address.
pub const ROM_SIZE: usize = 16;

/// An immutable program image of at most [`ROM_SIZE`] bytes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct Rom {
    bytes: Vec<u8>,
}

impl Rom {
    /// Create a ROM from a program image.
    pub fn new(bytes: Vec<u8>) -> Result<Self, RomError> {
        if bytes.len() > ROM_SIZE {
            return Err(RomError::TooLarge { size: bytes.len() });
        }
        Ok(Self { bytes })
    }

    /// Read the byte at `addr`.
    ///
    /// Addresses past the end of the program read as `0x00` (`ADD A,0`).
    #[inline]
    pub fn fetch(&self, addr: Nibble) -> u8 {
        self.bytes.get(usize::from(addr)).copied().unwrap_or(0)
    }

    /// Number of bytes in the program.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl TryFrom<Vec<u8>> for Rom {
    type Error = RomError;

    fn try_from(bytes: Vec<u8>) -> Result<Self, Self::Error> {
        Rom::new(bytes)
    }
}

impl From<Rom> for Vec<u8> {
    fn from(rom: Rom) -> Self {
        rom.bytes
    }
}

/// Errors that can occur while building a ROM.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RomError {
    #[error("ROM size {size} exceeds the maximum of 16 bytes")]
    TooLarge { size: usize },
}
