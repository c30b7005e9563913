//! # Denominations
//!
//! Coin values the machine recognizes.
//!
//! ## The Allowed Set
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Denominations (always stored largest first)                           │
//! │                                                                         │
//! │    200  ──►  "2lv"                                                      │
//! │    100  ──►  "1lv"                                                      │
//! │     50  ──►  "50st"                                                     │
//! │     20  ──►  "20st"                                                     │
//! │     10  ──►  "10st"                                                     │
//! │                                                                         │
//! │  Invariants: non-empty, strictly positive, no duplicates               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Greedy Change Assumption
//! Change is made largest-coin-first. That is only optimal for a canonical
//! coin system; [`Denominations::is_canonical`] checks a configured set so the
//! app can warn about one that is not.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;

/// The default Bulgarian coin set accepted by the machine, in stotinki.
pub const DEFAULT_DENOMINATIONS: [u32; 5] = [10, 20, 50, 100, 200];

/// Widest amount window, in gcd units, that
/// [`Denominations::is_canonical`] will search.
pub const CANONICAL_CHECK_LIMIT: usize = 1_000_000;

// =============================================================================
// Denomination
// =============================================================================

/// A single coin value in stotinki.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Denomination(u32);

impl Denomination {
    /// Wraps a raw stotinki value. Membership in the allowed set is checked
    /// by [`Denominations`], not here.
    #[inline]
    pub const fn new(stotinki: u32) -> Self {
        Denomination(stotinki)
    }

    /// Raw value in stotinki.
    #[inline]
    pub const fn stotinki(&self) -> u32 {
        self.0
    }

    /// Face value as Money.
    #[inline]
    pub const fn value(&self) -> Money {
        Money::from_stotinki(self.0 as u64)
    }
}

/// Coin label as printed on the coin: `50st`, `1lv`, `2lv`.
impl fmt::Display for Denomination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 >= 100 {
            if self.0 % 100 == 0 {
                write!(f, "{}lv", self.0 / 100)
            } else {
                write!(f, "{}", self.value())
            }
        } else {
            write!(f, "{}st", self.0)
        }
    }
}

// =============================================================================
// Denominations (allowed set)
// =============================================================================

/// The machine's allowed coin set, largest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u32>", into = "Vec<u32>")]
pub struct Denominations(Vec<Denomination>);

impl Denominations {
    /// Builds the allowed set.
    ///
    /// ## Errors
    /// `InvalidConfig` if the set is empty, contains zero or a duplicate.
    pub fn new(values: impl IntoIterator<Item = u32>) -> CoreResult<Self> {
        let mut values: Vec<u32> = values.into_iter().collect();

        if values.is_empty() {
            return Err(CoreError::InvalidConfig(
                "at least one denomination is required".to_string(),
            ));
        }
        if values.contains(&0) {
            return Err(CoreError::InvalidConfig(
                "denominations must be positive".to_string(),
            ));
        }

        values.sort_unstable_by(|a, b| b.cmp(a));
        if let Some(pair) = values.windows(2).find(|w| w[0] == w[1]) {
            return Err(CoreError::InvalidConfig(format!(
                "duplicate denomination {}",
                pair[0]
            )));
        }

        Ok(Denominations(values.into_iter().map(Denomination).collect()))
    }

    /// Checks membership.
    pub fn contains(&self, denomination: Denomination) -> bool {
        self.0.contains(&denomination)
    }

    /// Iterates largest first.
    pub fn iter(&self) -> impl Iterator<Item = Denomination> + '_ {
        self.0.iter().copied()
    }

    /// Number of denominations.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for a validated set; present for API completeness.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Looks up a raw stotinki value.
    ///
    /// ## Errors
    /// `UnknownDenomination` if the value is not in the set.
    pub fn get(&self, stotinki: u32) -> CoreResult<Denomination> {
        let denomination = Denomination(stotinki);
        if self.contains(denomination) {
            Ok(denomination)
        } else {
            Err(CoreError::UnknownDenomination(stotinki))
        }
    }

    /// Parses customer or vendor input: `"50"`, `"50st"`, `"1lv"`, `"2lv"`.
    ///
    /// ## Example
    /// ```rust
    /// use vendo_core::denomination::Denominations;
    ///
    /// let allowed = Denominations::default();
    /// assert_eq!(allowed.parse("1lv").unwrap().stotinki(), 100);
    /// assert_eq!(allowed.parse("20").unwrap().stotinki(), 20);
    /// assert!(allowed.parse("5").is_err());
    /// ```
    pub fn parse(&self, input: &str) -> Result<Denomination, ValidationError> {
        let input = input.trim().to_ascii_lowercase();

        let stotinki = if input.ends_with("lv") {
            Money::parse_leva(&input).ok().map(|m| m.stotinki())
        } else {
            input.trim_end_matches("st").trim().parse::<u64>().ok()
        };

        stotinki
            .and_then(|v| u32::try_from(v).ok())
            .map(Denomination)
            .filter(|d| self.contains(*d))
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "coin".to_string(),
                allowed: self.iter().map(|d| d.to_string()).collect(),
            })
    }

    /// Checks whether greedy largest-first selection is optimal for this set.
    ///
    /// Compares greedy against a dynamic-programming minimum for every amount
    /// up to `(c[n-1] + c[n]) * c[1]` in units of the set's gcd. Past that
    /// window a counterexample cannot first appear.
    ///
    /// Returns `None` when the window is wider than
    /// [`CANONICAL_CHECK_LIMIT`] units and the set was not checked.
    pub fn is_canonical(&self) -> Option<bool> {
        let mut coins: Vec<usize> = self.iter().map(|d| d.stotinki() as usize).collect();
        coins.reverse();

        if coins.len() < 2 {
            return Some(true);
        }

        let divisor = coins.iter().copied().fold(0, gcd);
        for c in coins.iter_mut() {
            *c /= divisor;
        }

        let n = coins.len();
        let bound = coins[n - 2]
            .checked_add(coins[n - 1])
            .and_then(|sum| sum.checked_mul(coins[0]))
            .filter(|&bound| bound <= CANONICAL_CHECK_LIMIT);
        let Some(bound) = bound else {
            warn!(denominations = ?self, "Coin set too wide to check greedy optimality");
            return None;
        };

        let mut best: Vec<Option<usize>> = vec![None; bound + 1];
        best[0] = Some(0);
        for amount in 1..=bound {
            best[amount] = coins
                .iter()
                .filter(|&&c| c <= amount)
                .filter_map(|&c| best[amount - c].map(|k| k + 1))
                .min();
        }

        Some((1..=bound).all(|amount| {
            let mut rest = amount;
            let mut count = 0;
            for &c in coins.iter().rev() {
                count += rest / c;
                rest %= c;
            }
            let greedy = if rest == 0 { Some(count) } else { None };
            greedy == best[amount]
        }))
    }
}

impl Default for Denominations {
    fn default() -> Self {
        Denominations(
            DEFAULT_DENOMINATIONS
                .iter()
                .rev()
                .map(|&v| Denomination(v))
                .collect(),
        )
    }
}

impl TryFrom<Vec<u32>> for Denominations {
    type Error = CoreError;

    fn try_from(values: Vec<u32>) -> Result<Self, Self::Error> {
        Denominations::new(values)
    }
}

impl From<Denominations> for Vec<u32> {
    fn from(set: Denominations) -> Self {
        set.0.into_iter().map(|d| d.0).collect()
    }
}

fn gcd(a: usize, b: usize) -> usize {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
