//! # Change Calculator
//!
//! Decides which coins go back to the customer after a sale.
//!
//! ## Two Greedy Phases
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  owed = inserted - price                                                │
//! │                                                                         │
//! │  Phase 1: inserted coins, largest first                                 │
//! │    coin <= remaining ──► returned_from_inserted                         │
//! │    otherwise         ──► banked (customer's money stays in the till)    │
//! │                                                                         │
//! │  Phase 2: only if remaining > 0, till coins largest first               │
//! │    while available above reserve AND coin <= remaining                  │
//! │                      ──► returned_from_till                             │
//! │                                                                         │
//! │  Whatever is left    ──► unpayable (disclosed, sale still completes)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - `inserted == returned_from_inserted + banked`, coin for coin
//! - `returned_total() + unpayable == owed`
//! - Phase 2 never plans a withdrawal below a denomination's reserve
//!
//! Greedy selection is minimal only for a canonical coin set. See
//! [`Denominations::is_canonical`](crate::denomination::Denominations::is_canonical).

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::coins::CoinBatch;
use crate::error::CoreResult;
use crate::inventory::CoinInventory;
use crate::money::Money;

/// Whether a sale returned all the change it owed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum ChangeStatus {
    /// Every stotinka owed was returned.
    Exact,
    /// Part of the change could not be paid.
    Partial,
}

/// Result of a change computation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeOutcome {
    /// Inserted coins handed straight back.
    pub returned_from_inserted: CoinBatch,
    /// Coins drawn from the till.
    pub returned_from_till: CoinBatch,
    /// Inserted coins kept by the machine.
    pub banked: CoinBatch,
    /// Change owed that no available coin could cover.
    pub unpayable: Money,
}

impl ChangeOutcome {
    /// Every coin dispensed to the customer, inserted coins first.
    pub fn returned(&self) -> CoinBatch {
        let mut coins = self.returned_from_inserted.clone();
        coins.extend(&self.returned_from_till);
        coins
    }

    /// Value of the dispensed coins.
    pub fn returned_total(&self) -> Money {
        self.returned_from_inserted.total() + self.returned_from_till.total()
    }

    /// True when the full amount owed was returned.
    pub fn is_exact(&self) -> bool {
        self.unpayable.is_zero()
    }

    pub fn status(&self) -> ChangeStatus {
        if self.is_exact() {
            ChangeStatus::Exact
        } else {
            ChangeStatus::Partial
        }
    }
}

/// Plans change without touching the inventory.
pub fn plan_change(inserted: &CoinBatch, owed: Money, inventory: &CoinInventory) -> ChangeOutcome {
    let mut outcome = ChangeOutcome::default();
    let mut remaining = owed;

    for coin in inserted.sorted_desc() {
        match remaining.checked_sub(coin.value()) {
            Some(rest) if remaining.is_positive() => {
                outcome.returned_from_inserted.push(coin);
                remaining = rest;
            }
            _ => outcome.banked.push(coin),
        }
    }

    if remaining.is_positive() {
        for stock in inventory.snapshot() {
            let mut available = stock.available();
            while available > 0 {
                match remaining.checked_sub(stock.denomination.value()) {
                    Some(rest) => {
                        outcome.returned_from_till.push(stock.denomination);
                        remaining = rest;
                        available -= 1;
                    }
                    None => break,
                }
            }
            if remaining.is_zero() {
                break;
            }
        }
    }

    outcome.unpayable = remaining;
    debug!(
        %owed,
        from_inserted = %outcome.returned_from_inserted,
        from_till = %outcome.returned_from_till,
        banked = %outcome.banked,
        unpayable = %outcome.unpayable,
        "Change planned"
    );
    outcome
}

/// Plans change and withdraws the till part from `inventory`.
///
/// Banked coins are NOT deposited here; the caller commits them together
/// with the product stock change.
///
/// ## Errors
/// `InventoryUnderflow` if the till changed between planning and
/// withdrawal. The inventory is unchanged in that case.
pub fn compute_change(
    inserted: &CoinBatch,
    owed: Money,
    inventory: &mut CoinInventory,
) -> CoreResult<ChangeOutcome> {
    let outcome = plan_change(inserted, owed, inventory);
    inventory.withdraw_batch(&outcome.returned_from_till)?;

    if !outcome.is_exact() {
        warn!(
            %owed,
            unpayable = %outcome.unpayable,
            "Could not return full change"
        );
    }
    Ok(outcome)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MachineConfig;
    use crate::denomination::{Denomination, DEFAULT_DENOMINATIONS};
    use proptest::prelude::*;

    fn batch(values: &[u32]) -> CoinBatch {
        values.iter().map(|&v| Denomination::new(v)).collect()
    }

    fn inventory(stock: &[(u32, u32)]) -> CoinInventory {
        CoinInventory::with_stock(&MachineConfig::default(), stock.iter().copied()).unwrap()
    }

    fn st(value: u64) -> Money {
        Money::from_stotinki(value)
    }

    #[test]
    fn test_zero_owed_banks_everything() {
        let inv = inventory(&[(10, 20)]);
        let outcome = plan_change(&batch(&[200]), Money::zero(), &inv);

        assert!(outcome.returned().is_empty());
        assert_eq!(outcome.banked, batch(&[200]));
        assert!(outcome.is_exact());
    }

    #[test]
    fn test_returns_inserted_coins_first() {
        // Paid 1lv + 50st + 20st for a 1.20lv item: the 50st goes straight back
        let inv = inventory(&[(50, 20)]);
        let outcome = plan_change(&batch(&[100, 50, 20]), st(50), &inv);

        assert_eq!(outcome.returned_from_inserted, batch(&[50]));
        assert!(outcome.returned_from_till.is_empty());
        assert_eq!(outcome.banked, batch(&[100, 20]));
    }

    #[test]
    fn test_falls_back_to_till() {
        let inv = inventory(&[(50, 11), (20, 12), (10, 10)]);
        let outcome = plan_change(&batch(&[200, 200]), st(90), &inv);

        // One 50st above reserve, two 20st above reserve, no 10st
        assert_eq!(outcome.returned_from_till, batch(&[50, 20, 20]));
        assert_eq!(outcome.unpayable, Money::zero());
        assert_eq!(outcome.banked, batch(&[200, 200]));
    }

    #[test]
    fn test_unpayable_remainder() {
        let inv = inventory(&[(20, 10)]);
        let outcome = plan_change(&batch(&[100, 100]), st(30), &inv);

        assert!(outcome.returned().is_empty());
        assert_eq!(outcome.unpayable, st(30));
        assert_eq!(outcome.status(), ChangeStatus::Partial);
    }

    #[test]
    fn test_compute_change_withdraws_only_till_part() {
        let mut inv = inventory(&[(50, 12)]);
        let outcome = compute_change(&batch(&[100, 100]), st(50), &mut inv).unwrap();

        assert_eq!(outcome.returned_from_till, batch(&[50]));
        assert_eq!(inv.quantity(Denomination::new(50)), 11);
        // Banked coins are the caller's to deposit
        assert_eq!(inv.quantity(Denomination::new(100)), 0);
    }

    fn coin_strategy() -> impl Strategy<Value = Denomination> {
        prop::sample::select(DEFAULT_DENOMINATIONS.to_vec()).prop_map(Denomination::new)
    }

    fn stock_strategy() -> impl Strategy<Value = Vec<(u32, u32)>> {
        prop::collection::vec(0u32..30, DEFAULT_DENOMINATIONS.len()).prop_map(|counts| {
            DEFAULT_DENOMINATIONS
                .iter()
                .copied()
                .zip(counts)
                .collect()
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: every inserted coin is either returned or banked.
        #[test]
        fn coin_conservation(
            coins in prop::collection::vec(coin_strategy(), 0..12),
            owed in 0u64..1_500,
            stock in stock_strategy(),
        ) {
            let inserted: CoinBatch = coins.into_iter().collect();
            let owed = Money::from_stotinki(owed.min(inserted.total().stotinki()));
            let outcome = plan_change(&inserted, owed, &inventory(&stock));

            let mut accounted = outcome.returned_from_inserted.clone();
            accounted.extend(&outcome.banked);
            prop_assert_eq!(accounted.counts(), inserted.counts());
            prop_assert_eq!(
                outcome.returned_from_inserted.total() + outcome.banked.total(),
                inserted.total()
            );
        }

        /// Property: change never exceeds what is owed, and the gap is the
        /// disclosed remainder.
        #[test]
        fn bounded_change(
            coins in prop::collection::vec(coin_strategy(), 1..12),
            owed in 0u64..1_500,
            stock in stock_strategy(),
        ) {
            let inserted: CoinBatch = coins.into_iter().collect();
            let owed = Money::from_stotinki(owed.min(inserted.total().stotinki()));
            let outcome = plan_change(&inserted, owed, &inventory(&stock));

            prop_assert!(outcome.returned_total() <= owed);
            prop_assert_eq!(outcome.returned_total() + outcome.unpayable, owed);
        }

        /// Property: the till never drops below its reserve.
        #[test]
        fn reserve_is_never_touched(
            coins in prop::collection::vec(coin_strategy(), 1..12),
            owed in 0u64..1_500,
            stock in stock_strategy(),
        ) {
            let inserted: CoinBatch = coins.into_iter().collect();
            let owed = Money::from_stotinki(owed.min(inserted.total().stotinki()));
            let mut inv = inventory(&stock);
            let before = inv.clone();

            compute_change(&inserted, owed, &mut inv).unwrap();

            for (after, before) in inv.snapshot().iter().zip(before.snapshot()) {
                prop_assert!(after.quantity >= after.reserve.min(before.quantity));
            }
        }

        /// Property: nothing owed means nothing returned.
        #[test]
        fn zero_owed_returns_nothing(
            coins in prop::collection::vec(coin_strategy(), 0..12),
            stock in stock_strategy(),
        ) {
            let inserted: CoinBatch = coins.into_iter().collect();
            let outcome = plan_change(&inserted, Money::zero(), &inventory(&stock));

            prop_assert!(outcome.returned().is_empty());
            prop_assert_eq!(outcome.unpayable, Money::zero());
            prop_assert_eq!(outcome.banked.counts(), inserted.counts());
        }
    }
}
