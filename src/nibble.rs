//! 4-bit unsigned values.
//!
//! Every register, port latch and operand of the TD4 is a nibble. The
//! [`Nibble`] type masks on construction so no value above 15 can ever be
//! stored.

use std::fmt;
use serde::{Serialize, Deserialize};

/// A 4-bit unsigned value (0-15).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub struct Nibble(u8);

impl Nibble {
    /// Mask selecting the low four bits of a byte.
    pub const MASK: u8 = 0x0F;
    /// Largest representable value.
    pub const MAX: Nibble = Nibble(0x0F);
    /// Zero.
    pub const ZERO: Nibble = Nibble(0);

    /// Create a nibble from the low four bits of `value`.
    #[inline]
    pub const fn new(value: u8) -> Self {
        Nibble(value & Self::MASK)
    }

    /// Create a nibble, rejecting values above 15.
    #[inline]
    pub const fn checked(value: u8) -> Option<Self> {
        if value > Self::MASK {
            None
        } else {
            Some(Nibble(value))
        }
    }

    /// Get the raw value.
    #[inline]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Add with 4-bit wraparound.
    ///
    /// Returns the masked sum and whether the unmasked sum exceeded 15.
    #[inline]
    pub const fn overflowing_add(self, rhs: Nibble) -> (Nibble, bool) {
        let sum = self.0 + rhs.0;
        (Nibble::new(sum), sum > Self::MASK)
    }

    /// Add with 4-bit wraparound, discarding the carry.
    #[inline]
    pub const fn wrapping_add(self, rhs: Nibble) -> Nibble {
        self.overflowing_add(rhs).0
    }

    /// The individual bits, most significant first.
    pub fn bits(self) -> [bool; 4] {
        [
            self.0 & 0b1000 != 0,
            self.0 & 0b0100 != 0,
            self.0 & 0b0010 != 0,
            self.0 & 0b0001 != 0,
        ]
    }
}

impl From<u8> for Nibble {
    fn from(value: u8) -> Self {
        Nibble::new(value)
    }
}

impl From<Nibble> for u8 {
    fn from(value: Nibble) -> Self {
        value.0
    }
}

impl From<Nibble> for usize {
    fn from(value: Nibble) -> Self {
        value.0 as usize
    }
}

/// Displays as four binary digits, e.g. `0101`.
impl fmt::Display for Nibble {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04b}", self.0)
    }
}

impl fmt::Debug for Nibble {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Nibble({:04b})", self.0)
    }
}

impl fmt::Binary for Nibble {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Binary::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_new_masks_high_bits() {
        assert_eq!(Nibble::new(0xF3).get(), 0x3);
        assert_eq!(Nibble::new(0x10).get(), 0);
        assert_eq!(Nibble::from(0x0Fu8), Nibble::MAX);
    }

    #[test]
    fn test_checked() {
        assert_eq!(Nibble::checked(15), Some(Nibble::MAX));
        assert_eq!(Nibble::checked(16), None);
    }

    #[test]
    fn test_overflowing_add() {
        assert_eq!(Nibble::new(15).overflowing_add(Nibble::new(1)), (Nibble::ZERO, true));
        assert_eq!(Nibble::new(1).overflowing_add(Nibble::new(1)), (Nibble::new(2), false));
        assert_eq!(Nibble::new(15).wrapping_add(Nibble::new(15)), Nibble::new(14));
    }

    #[test]
    fn test_display_binary() {
        assert_eq!(Nibble::new(2).to_string(), "0010");
        assert_eq!(format!("{:b}", Nibble::new(5)), "101");
        assert_eq!(Nibble::new(0b1010).bits(), [true, false, true, false]);
    }

    #[test]
    fn test_serde_as_integer() {
        let json = serde_json::to_string(&Nibble::new(9)).unwrap();
        assert_eq!(json, "9");
        let back: Nibble = serde_json::from_str("25").unwrap();
        assert_eq!(back, Nibble::new(9));
    }

    proptest! {
        #[test]
        fn prop_add_matches_modular_arithmetic(a in 0u8..16, b in 0u8..16) {
            let (sum, carry) = Nibble::new(a).overflowing_add(Nibble::new(b));
            prop_assert_eq!(sum.get(), (a + b) % 16);
            prop_assert_eq!(carry, a + b > 15);
        }

        #[test]
        fn prop_never_exceeds_fifteen(v in any::<u8>()) {
            prop_assert!(Nibble::new(v).get() <= 15);
        }
    }
}
