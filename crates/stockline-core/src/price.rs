//! # Price Module
//!
//! Provides the `Price` type for handling monetary values safely.
//!
//! ## Why Integer Prices?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  Import files make it worse: the same price can arrive as the           │
//! │  JSON number 15.5, the string "15.50", or the fragment ".99".           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    Every arriving value is resolved ONCE, at the parse boundary,        │
//! │    into i64 minor units with scale 2. Nothing downstream ever           │
//! │    touches a float or a raw string again.                               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockline_core::price::Price;
//!
//! // Create from cents (preferred)
//! let price = Price::from_cents(1550); // 15.50
//!
//! // Tolerant parsing of wire text - never fails, unparsable becomes 0.00
//! assert_eq!(Price::parse_lenient(".99"), Price::from_cents(99));
//! assert_eq!(Price::parse_lenient("garbage"), Price::ZERO);
//!
//! // Wire rendering trims trailing zeros, matching the export contract
//! assert_eq!(price.to_wire(), "15.5");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Price Type
// =============================================================================

/// A monetary value in minor units (cents), fixed-point with scale 2.
///
/// ## Design Decisions
/// - **i64 (signed)**: lenient parsing can produce negatives; validation
///   rejects them before anything is persisted
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Derives**: full serde support, total ordering for deterministic sorts
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Price(i64);

impl Price {
    /// A price of exactly 0.00.
    pub const ZERO: Price = Price(0);

    /// Creates a Price from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use stockline_core::price::Price;
    ///
    /// let price = Price::from_cents(1099); // 10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Price(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Whether the price is negative (never valid for a persisted product).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Resolves a floating-point wire value (a JSON number) into cents,
    /// rounding half away from zero.
    ///
    /// ## Example
    /// ```rust
    /// use stockline_core::price::Price;
    ///
    /// assert_eq!(Price::from_f64(15.5), Price::from_cents(1550));
    /// assert_eq!(Price::from_f64(0.005), Price::from_cents(1));
    /// ```
    pub fn from_f64(value: f64) -> Self {
        if !value.is_finite() {
            return Price::ZERO;
        }
        Price((value * 100.0).round() as i64)
    }

    /// Tolerant text parser for the price field of an incoming row.
    ///
    /// ## Accepted Shapes
    /// ```text
    /// ""      → 0.00     (absent)
    /// "."     → 0.00     (a lone separator)
    /// ".99"   → 0.99     (partial fraction)
    /// "9.99"  → 9.99
    /// "1,240" → 1240.00  (thousands separators tolerated)
    /// other   → 0.00     (unparsable never aborts an import)
    /// ```
    ///
    /// Parsing is locale-invariant: the period is the only decimal
    /// separator. Fractions beyond two digits round half away from zero.
    pub fn parse_lenient(raw: &str) -> Self {
        let s = raw.trim();
        if s.is_empty() || s == "." {
            return Price::ZERO;
        }

        let (sign, s) = match s.strip_prefix('-') {
            Some(rest) => (-1i64, rest),
            None => (1i64, s.strip_prefix('+').unwrap_or(s)),
        };

        let (int_part, frac_part) = match s.split_once('.') {
            Some((i, f)) => (i, f),
            None => (s, ""),
        };

        // Thousands separators in the integer part are dropped, everything
        // else must be a digit or the whole value normalizes to zero.
        let int_digits: String = int_part.chars().filter(|c| *c != ',').collect();
        if !int_digits.chars().all(|c| c.is_ascii_digit())
            || !frac_part.chars().all(|c| c.is_ascii_digit())
        {
            return Price::ZERO;
        }

        let whole: i64 = if int_digits.is_empty() {
            0
        } else {
            match int_digits.parse() {
                Ok(v) => v,
                Err(_) => return Price::ZERO,
            }
        };

        let cents = match frac_part.len() {
            0 => 0,
            1 => frac_part.parse::<i64>().unwrap_or(0) * 10,
            2 => frac_part.parse::<i64>().unwrap_or(0),
            _ => {
                // Round on the third fractional digit.
                let head: i64 = frac_part[..2].parse().unwrap_or(0);
                let next = frac_part.as_bytes()[2] - b'0';
                if next >= 5 {
                    head + 1
                } else {
                    head
                }
            }
        };

        Price(sign * (whole * 100 + cents))
    }

    /// Renders the price for the wire, trimming trailing zeros.
    ///
    /// ## Format
    /// Mirrors the `0.##` export contract so a round trip re-parses to the
    /// same cents value:
    /// ```text
    /// 1550 → "15.5"
    /// 1500 → "15"
    /// 999  → "9.99"
    /// 0    → "0"
    /// ```
    pub fn to_wire(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = abs / 100;
        let frac = abs % 100;

        if frac == 0 {
            format!("{sign}{whole}")
        } else if frac % 10 == 0 {
            format!("{sign}{whole}.{}", frac / 10)
        } else {
            format!("{sign}{whole}.{frac:02}")
        }
    }
}

impl fmt::Display for Price {
    /// Full two-decimal rendering for logs and UI surfaces.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lenient_edge_shapes() {
        assert_eq!(Price::parse_lenient(""), Price::ZERO);
        assert_eq!(Price::parse_lenient("   "), Price::ZERO);
        assert_eq!(Price::parse_lenient("."), Price::ZERO);
        assert_eq!(Price::parse_lenient(".99"), Price::from_cents(99));
        assert_eq!(Price::parse_lenient("9.99"), Price::from_cents(999));
        assert_eq!(Price::parse_lenient("15.50"), Price::from_cents(1550));
        assert_eq!(Price::parse_lenient(" 15.5 "), Price::from_cents(1550));
        assert_eq!(Price::parse_lenient("15"), Price::from_cents(1500));
    }

    #[test]
    fn test_parse_lenient_unparsable_is_zero() {
        assert_eq!(Price::parse_lenient("abc"), Price::ZERO);
        assert_eq!(Price::parse_lenient("9.9x"), Price::ZERO);
        assert_eq!(Price::parse_lenient("12.3.4"), Price::ZERO);
    }

    #[test]
    fn test_parse_lenient_thousands_and_sign() {
        assert_eq!(Price::parse_lenient("1,240"), Price::from_cents(124_000));
        assert_eq!(Price::parse_lenient("-3.25"), Price::from_cents(-325));
        assert_eq!(Price::parse_lenient("+3.25"), Price::from_cents(325));
    }

    #[test]
    fn test_parse_lenient_rounds_long_fractions() {
        assert_eq!(Price::parse_lenient("1.005"), Price::from_cents(101));
        assert_eq!(Price::parse_lenient("1.004"), Price::from_cents(100));
    }

    #[test]
    fn test_from_f64() {
        assert_eq!(Price::from_f64(15.5), Price::from_cents(1550));
        assert_eq!(Price::from_f64(9.99), Price::from_cents(999));
        assert_eq!(Price::from_f64(f64::NAN), Price::ZERO);
    }

    #[test]
    fn test_to_wire_trims_trailing_zeros() {
        assert_eq!(Price::from_cents(1550).to_wire(), "15.5");
        assert_eq!(Price::from_cents(1500).to_wire(), "15");
        assert_eq!(Price::from_cents(999).to_wire(), "9.99");
        assert_eq!(Price::from_cents(0).to_wire(), "0");
        assert_eq!(Price::from_cents(5).to_wire(), "0.05");
    }

    #[test]
    fn test_wire_round_trip() {
        for cents in [0, 5, 50, 99, 100, 999, 1500, 1550, 123_456] {
            let p = Price::from_cents(cents);
            assert_eq!(Price::parse_lenient(&p.to_wire()), p);
        }
    }

    #[test]
    fn test_display_is_two_decimals() {
        assert_eq!(Price::from_cents(1550).to_string(), "15.50");
        assert_eq!(Price::from_cents(-325).to_string(), "-3.25");
    }
}
