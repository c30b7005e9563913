//! # Coin Batches
//!
//! An ordered multiset of coins: what the customer inserted, what is handed
//! back as change, what is banked into the till.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::denomination::Denomination;
use crate::money::Money;

/// Coins in the order they were inserted or selected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoinBatch(Vec<Denomination>);

impl CoinBatch {
    /// Creates an empty batch.
    pub fn new() -> Self {
        CoinBatch(Vec::new())
    }

    /// Builds a batch from `(denomination, count)` pairs, largest first.
    pub fn from_counts(counts: &BTreeMap<Denomination, u32>) -> Self {
        let mut coins = Vec::new();
        for (&denomination, &count) in counts.iter().rev() {
            coins.extend(std::iter::repeat(denomination).take(count as usize));
        }
        CoinBatch(coins)
    }

    /// Appends one coin.
    pub fn push(&mut self, coin: Denomination) {
        self.0.push(coin);
    }

    /// Appends every coin of `other`.
    pub fn extend(&mut self, other: &CoinBatch) {
        self.0.extend_from_slice(&other.0);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all coin values.
    pub fn total(&self) -> Money {
        self.0.iter().map(|d| d.value()).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = Denomination> + '_ {
        self.0.iter().copied()
    }

    /// Copy of the coins, largest first.
    pub fn sorted_desc(&self) -> Vec<Denomination> {
        let mut coins = self.0.clone();
        coins.sort_unstable_by(|a, b| b.cmp(a));
        coins
    }

    /// Quantity per denomination.
    pub fn counts(&self) -> BTreeMap<Denomination, u32> {
        let mut counts = BTreeMap::new();
        for coin in &self.0 {
            *counts.entry(*coin).or_insert(0) += 1;
        }
        counts
    }
}

impl FromIterator<Denomination> for CoinBatch {
    fn from_iter<I: IntoIterator<Item = Denomination>>(iter: I) -> Self {
        CoinBatch(iter.into_iter().collect())
    }
}

/// `2 x 1lv, 1 x 50st`, largest first.
impl fmt::Display for CoinBatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "none");
        }
        let parts: Vec<String> = self
            .counts()
            .iter()
            .rev()
            .map(|(denomination, count)| format!("{} x {}", count, denomination))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(values: &[u32]) -> CoinBatch {
        values.iter().map(|&v| Denomination::new(v)).collect()
    }

    #[test]
    fn test_total_and_counts() {
        let coins = batch(&[100, 50, 100, 20]);
        assert_eq!(coins.total(), Money::from_stotinki(270));
        assert_eq!(coins.len(), 4);
        assert_eq!(coins.counts()[&Denomination::new(100)], 2);
    }

    #[test]
    fn test_sorted_desc_keeps_original_order() {
        let coins = batch(&[20, 200, 50]);
        let sorted: Vec<u32> = coins.sorted_desc().iter().map(|d| d.stotinki()).collect();
        assert_eq!(sorted, vec![200, 50, 20]);
        assert_eq!(coins.iter().next(), Some(Denomination::new(20)));
    }

    #[test]
    fn test_from_counts_is_largest_first() {
        let counts = batch(&[10, 50, 10]).counts();
        let rebuilt = CoinBatch::from_counts(&counts);
        assert_eq!(rebuilt, batch(&[50, 10, 10]));
    }

    #[test]
    fn test_display() {
        assert_eq!(batch(&[50, 100, 100]).to_string(), "2 x 1lv, 1 x 50st");
        assert_eq!(CoinBatch::new().to_string(), "none");
    }
}
