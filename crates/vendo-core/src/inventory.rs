//! # Coin Inventory
//!
//! Per-denomination coin counts held in the till.
//!
//! ## Reserve-Aware Withdrawals
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  50st slot: quantity 14, reserve 10                                    │
//! │                                                                         │
//! │  ████████████████████████████░░░░░░░░                                  │
//! │  └──────── reserve (10) ────┘└ available (4) ┘                          │
//! │                                                                         │
//! │  withdraw(50st, 4) ✓   → quantity 10                                    │
//! │  withdraw(50st, 5) ✗   → InventoryUnderflow { available: 4 }            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Atomicity
//! Batch operations validate every denomination before touching any count,
//! so a failed batch leaves the inventory exactly as it was.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::coins::CoinBatch;
use crate::config::MachineConfig;
use crate::denomination::{Denomination, Denominations};
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;

/// One row of an inventory snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinStock {
    pub denomination: Denomination,
    pub quantity: u32,
    pub reserve: u32,
}

impl CoinStock {
    /// Coins that may be withdrawn without touching the reserve.
    pub fn available(&self) -> u32 {
        self.quantity.saturating_sub(self.reserve)
    }
}

/// Coins currently held by the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinInventory {
    denominations: Denominations,
    reserves: BTreeMap<Denomination, u32>,
    stock: BTreeMap<Denomination, u32>,
}

impl CoinInventory {
    /// Creates an empty till for the configured denominations.
    pub fn new(config: &MachineConfig) -> Self {
        let denominations = config.denominations.clone();
        let reserves = denominations
            .iter()
            .map(|d| (d, config.reserve_for(d)))
            .collect();
        let stock = denominations.iter().map(|d| (d, 0)).collect();

        CoinInventory {
            denominations,
            reserves,
            stock,
        }
    }

    /// Creates a till seeded from storage.
    ///
    /// ## Errors
    /// `UnknownDenomination` if storage holds a value the configuration
    /// does not allow.
    pub fn with_stock(
        config: &MachineConfig,
        stock: impl IntoIterator<Item = (u32, u32)>,
    ) -> CoreResult<Self> {
        let mut inventory = CoinInventory::new(config);
        for (value, quantity) in stock {
            let denomination = inventory.denominations.get(value)?;
            inventory.stock.insert(denomination, quantity);
        }
        Ok(inventory)
    }

    /// Allowed denominations, largest first.
    pub fn denominations(&self) -> &Denominations {
        &self.denominations
    }

    /// Coins held of one denomination (0 for unknown values).
    pub fn quantity(&self, denomination: Denomination) -> u32 {
        self.stock.get(&denomination).copied().unwrap_or(0)
    }

    /// Reserve for one denomination.
    pub fn reserve(&self, denomination: Denomination) -> u32 {
        self.reserves.get(&denomination).copied().unwrap_or(0)
    }

    /// Coins withdrawable without touching the reserve.
    pub fn available(&self, denomination: Denomination) -> u32 {
        self.quantity(denomination)
            .saturating_sub(self.reserve(denomination))
    }

    /// Adds coins of one denomination.
    pub fn deposit(&mut self, denomination: Denomination, quantity: u32) -> CoreResult<()> {
        let mut counts = BTreeMap::new();
        counts.insert(denomination, quantity);
        self.deposit_counts(&counts)
    }

    /// Removes coins of one denomination, honouring the reserve.
    pub fn withdraw(&mut self, denomination: Denomination, quantity: u32) -> CoreResult<()> {
        let mut counts = BTreeMap::new();
        counts.insert(denomination, quantity);
        self.withdraw_counts(&counts)
    }

    /// Adds a whole batch, all or nothing.
    pub fn deposit_batch(&mut self, coins: &CoinBatch) -> CoreResult<()> {
        self.deposit_counts(&coins.counts())
    }

    /// Removes a whole batch, all or nothing.
    pub fn withdraw_batch(&mut self, coins: &CoinBatch) -> CoreResult<()> {
        self.withdraw_counts(&coins.counts())
    }

    fn deposit_counts(&mut self, counts: &BTreeMap<Denomination, u32>) -> CoreResult<()> {
        let mut updated = Vec::with_capacity(counts.len());
        for (&denomination, &quantity) in counts {
            if !self.denominations.contains(denomination) {
                return Err(CoreError::UnknownDenomination(denomination.stotinki()));
            }
            let new_quantity = self
                .quantity(denomination)
                .checked_add(quantity)
                .ok_or_else(|| ValidationError::OutOfRange {
                    field: "coin quantity".to_string(),
                    min: 0,
                    max: u32::MAX as u64,
                })?;
            updated.push((denomination, new_quantity));
        }

        for (denomination, quantity) in updated {
            debug!(%denomination, quantity, "Coin stock increased");
            self.stock.insert(denomination, quantity);
        }
        Ok(())
    }

    fn withdraw_counts(&mut self, counts: &BTreeMap<Denomination, u32>) -> CoreResult<()> {
        let mut updated = Vec::with_capacity(counts.len());
        for (&denomination, &quantity) in counts {
            if !self.denominations.contains(denomination) {
                return Err(CoreError::UnknownDenomination(denomination.stotinki()));
            }
            let available = self.available(denomination);
            if quantity > available {
                return Err(CoreError::InventoryUnderflow {
                    denomination,
                    requested: quantity,
                    available,
                });
            }
            updated.push((denomination, self.quantity(denomination) - quantity));
        }

        for (denomination, quantity) in updated {
            debug!(%denomination, quantity, "Coin stock decreased");
            self.stock.insert(denomination, quantity);
        }
        Ok(())
    }

    /// Stock per denomination, largest first.
    pub fn snapshot(&self) -> Vec<CoinStock> {
        self.denominations
            .iter()
            .map(|denomination| CoinStock {
                denomination,
                quantity: self.quantity(denomination),
                reserve: self.reserve(denomination),
            })
            .collect()
    }

    /// Value of every coin in the till.
    pub fn total_value(&self) -> Money {
        self.stock.iter().map(|(d, &q)| d.value() * q).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(value: u32) -> Denomination {
        Denomination::new(value)
    }

    fn inventory(stock: &[(u32, u32)]) -> CoinInventory {
        CoinInventory::with_stock(&MachineConfig::default(), stock.iter().copied()).unwrap()
    }

    #[test]
    fn test_new_inventory_is_empty() {
        let inv = CoinInventory::new(&MachineConfig::default());
        assert_eq!(inv.total_value(), Money::zero());
        assert_eq!(inv.snapshot().len(), 5);
    }

    #[test]
    fn test_with_stock_rejects_unknown() {
        let result = CoinInventory::with_stock(&MachineConfig::default(), [(10, 5), (5, 1)]);
        assert_eq!(result.unwrap_err(), CoreError::UnknownDenomination(5));
    }

    #[test]
    fn test_deposit() {
        let mut inv = inventory(&[(50, 3)]);
        inv.deposit(d(50), 2).unwrap();
        assert_eq!(inv.quantity(d(50)), 5);

        assert_eq!(
            inv.deposit(d(5), 1).unwrap_err(),
            CoreError::UnknownDenomination(5)
        );
    }

    #[test]
    fn test_withdraw_respects_reserve() {
        let mut inv = inventory(&[(50, 14)]);
        assert_eq!(inv.available(d(50)), 4);

        let err = inv.withdraw(d(50), 5).unwrap_err();
        assert_eq!(
            err,
            CoreError::InventoryUnderflow {
                denomination: d(50),
                requested: 5,
                available: 4,
            }
        );
        assert_eq!(inv.quantity(d(50)), 14);

        inv.withdraw(d(50), 4).unwrap();
        assert_eq!(inv.quantity(d(50)), 10);
    }

    #[test]
    fn test_withdraw_batch_is_all_or_nothing() {
        let mut inv = inventory(&[(100, 12), (20, 10)]);
        let before = inv.clone();

        let coins: CoinBatch = [d(100), d(100), d(20)].into_iter().collect();
        assert!(inv.withdraw_batch(&coins).is_err());
        assert_eq!(inv, before);
    }

    #[test]
    fn test_deposit_batch_is_all_or_nothing() {
        let mut inv = inventory(&[(10, 1)]);
        let before = inv.clone();

        let coins: CoinBatch = [d(10), d(30)].into_iter().collect();
        assert_eq!(
            inv.deposit_batch(&coins).unwrap_err(),
            CoreError::UnknownDenomination(30)
        );
        assert_eq!(inv, before);
    }

    #[test]
    fn test_snapshot_descending_and_total() {
        let inv = inventory(&[(10, 2), (200, 1)]);
        let snapshot = inv.snapshot();
        assert_eq!(snapshot[0].denomination, d(200));
        assert_eq!(snapshot[4].denomination, d(10));
        assert_eq!(snapshot[4].quantity, 2);
        assert_eq!(snapshot[4].available(), 0);
        assert_eq!(inv.total_value(), Money::from_stotinki(220));
    }
}
