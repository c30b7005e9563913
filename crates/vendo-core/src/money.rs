//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  With floating point leva:                                              │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A change engine comparing `remaining - coin >= 0` on floats will       │
//! │  eventually refuse a coin it should return, or return one too many.     │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Stotinki                                         │
//! │    1.50lv = 150 stotinki, every comparison is exact                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use vendo_core::money::Money;
//!
//! let price = Money::from_stotinki(150); // 1.50lv
//! let paid = Money::from_stotinki(200);
//!
//! assert_eq!(paid.checked_sub(price), Some(Money::from_stotinki(50)));
//! assert_eq!(price.checked_sub(paid), None); // never negative
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul};

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// A non-negative amount in the smallest currency unit (stotinki).
///
/// ## Design Decisions
/// - **u64 (unsigned)**: a vending machine never owes a negative amount;
///   shortfalls are computed with [`Money::checked_sub`] instead
/// - **Single field tuple struct**: zero-cost abstraction over u64
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    /// Creates a Money value from stotinki.
    ///
    /// ## Example
    /// ```rust
    /// use vendo_core::money::Money;
    ///
    /// let price = Money::from_stotinki(120); // 1.20lv
    /// assert_eq!(price.stotinki(), 120);
    /// ```
    #[inline]
    pub const fn from_stotinki(stotinki: u64) -> Self {
        Money(stotinki)
    }

    /// Creates a Money value from leva and stotinki.
    ///
    /// ## Example
    /// ```rust
    /// use vendo_core::money::Money;
    ///
    /// assert_eq!(Money::from_leva_stotinki(1, 50).stotinki(), 150);
    /// ```
    #[inline]
    pub const fn from_leva_stotinki(leva: u64, stotinki: u64) -> Self {
        Money(leva * 100 + stotinki)
    }

    /// Returns the value in stotinki.
    #[inline]
    pub const fn stotinki(&self) -> u64 {
        self.0
    }

    /// Returns the whole leva portion.
    #[inline]
    pub const fn leva(&self) -> u64 {
        self.0 / 100
    }

    /// Returns the stotinki portion (always 0-99).
    #[inline]
    pub const fn stotinki_part(&self) -> u64 {
        self.0 % 100
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is greater than zero.
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Subtracts `other`, returning `None` if the result would be negative.
    ///
    /// ## User Workflow
    /// ```text
    /// Inserted: 1.00lv   Price: 1.50lv
    ///      │
    ///      ▼
    /// inserted.checked_sub(price) → None  → InsufficientFunds
    /// price.checked_sub(inserted) → 0.50lv (the shortfall shown)
    /// ```
    #[inline]
    pub const fn checked_sub(&self, other: Money) -> Option<Money> {
        match self.0.checked_sub(other.0) {
            Some(value) => Some(Money(value)),
            None => None,
        }
    }

    /// Subtracts `other`, clamping at zero.
    #[inline]
    pub const fn saturating_sub(&self, other: Money) -> Money {
        Money(self.0.saturating_sub(other.0))
    }

    /// Parses a vendor-entered leva amount such as `"1.20"`, `"1.2"` or `"3"`.
    ///
    /// More than two decimal places is rejected rather than rounded.
    ///
    /// ## Example
    /// ```rust
    /// use vendo_core::money::Money;
    ///
    /// assert_eq!(Money::parse_leva("1.2").unwrap().stotinki(), 120);
    /// assert_eq!(Money::parse_leva("0.05").unwrap().stotinki(), 5);
    /// assert!(Money::parse_leva("1.205").is_err());
    /// ```
    pub fn parse_leva(input: &str) -> Result<Money, ValidationError> {
        let input = input.trim().trim_end_matches("lv").trim();
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "price".to_string(),
            reason: reason.to_string(),
        };

        if input.is_empty() {
            return Err(ValidationError::Required {
                field: "price".to_string(),
            });
        }

        let (whole, fraction) = match input.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (input, ""),
        };

        if fraction.len() > 2 {
            return Err(invalid("at most two decimal places are allowed"));
        }

        let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
        if (whole.is_empty() && fraction.is_empty()) || !all_digits(whole) || !all_digits(fraction)
        {
            return Err(invalid("expected an amount in leva, e.g. 1.20"));
        }

        let leva: u64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid("amount is too large"))?
        };

        let stotinki: u64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<u64>().unwrap_or(0) * 10,
            _ => fraction.parse::<u64>().unwrap_or(0),
        };

        leva.checked_mul(100)
            .and_then(|v| v.checked_add(stotinki))
            .map(Money)
            .ok_or_else(|| invalid("amount is too large"))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows money the way the machine's display does: `1.50lv`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}lv", self.leva(), self.stotinki_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// Multiplication by a coin count.
impl Mul<u32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: u32) -> Self {
        Money(self.0 * qty as u64)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_stotinki() {
        let money = Money::from_stotinki(1099);
        assert_eq!(money.stotinki(), 1099);
        assert_eq!(money.leva(), 10);
        assert_eq!(money.stotinki_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_stotinki(150).to_string(), "1.50lv");
        assert_eq!(Money::from_stotinki(5).to_string(), "0.05lv");
        assert_eq!(Money::from_stotinki(0).to_string(), "0.00lv");
        assert_eq!(Money::from_leva_stotinki(12, 0).to_string(), "12.00lv");
    }

    #[test]
    fn test_checked_and_saturating_sub() {
        let a = Money::from_stotinki(200);
        let b = Money::from_stotinki(150);

        assert_eq!(a.checked_sub(b), Some(Money::from_stotinki(50)));
        assert_eq!(b.checked_sub(a), None);
        assert_eq!(b.saturating_sub(a), Money::zero());
    }

    #[test]
    fn test_arithmetic_and_sum() {
        let coin = Money::from_stotinki(50);
        assert_eq!((coin * 3).stotinki(), 150);

        let total: Money = [10, 20, 50].iter().map(|v| Money::from_stotinki(*v)).sum();
        assert_eq!(total.stotinki(), 80);

        let mut running = Money::zero();
        running += coin;
        assert!(running.is_positive());
    }

    #[test]
    fn test_parse_leva() {
        assert_eq!(Money::parse_leva("1.20").unwrap().stotinki(), 120);
        assert_eq!(Money::parse_leva("1.2").unwrap().stotinki(), 120);
        assert_eq!(Money::parse_leva("3").unwrap().stotinki(), 300);
        assert_eq!(Money::parse_leva(".5").unwrap().stotinki(), 50);
        assert_eq!(Money::parse_leva("2.50lv").unwrap().stotinki(), 250);
    }

    #[test]
    fn test_parse_leva_rejects_garbage() {
        assert!(Money::parse_leva("").is_err());
        assert!(Money::parse_leva(".").is_err());
        assert!(Money::parse_leva("-1").is_err());
        assert!(Money::parse_leva("1.234").is_err());
        assert!(Money::parse_leva("abc").is_err());
        assert!(Money::parse_leva("1,20").is_err());
    }
}
