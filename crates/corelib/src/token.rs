//! Ring tokens.
//!
//! A token is a position in the 64-bit hash space. Both vnodes and hashed
//! identifiers are tokens, so ownership is a plain ordered comparison.

use std::fmt;

/// A position on the hash ring.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct Token(pub u64);

impl Token {
    /// Minimum token value (start of ring).
    pub const MIN: Token = Token(0);
    /// Maximum token value (end of ring).
    pub const MAX: Token = Token(u64::MAX);

    /// Clockwise distance from `self` to `other` on the ring.
    ///
    /// The distance from a token to itself is zero.
    #[inline]
    pub fn distance_to(&self, other: &Self) -> u64 {
        other.0.wrapping_sub(self.0)
    }

    /// Raw hash value.
    #[inline]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl From<u64> for Token {
    fn from(value: u64) -> Self {
        Token(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_forward() {
        assert_eq!(Token(100).distance_to(&Token(200)), 100);
    }

    #[test]
    fn test_distance_wraps() {
        assert_eq!(Token(u64::MAX).distance_to(&Token(0)), 1);
        assert_eq!(Token(200).distance_to(&Token(100)), u64::MAX - 99);
    }

    #[test]
    fn test_distance_to_self_is_zero() {
        assert_eq!(Token(42).distance_to(&Token(42)), 0);
    }

    #[test]
    fn test_display_is_fixed_width_hex() {
        assert_eq!(Token(0xab).to_string(), "00000000000000ab");
    }
}
