//! # Transaction Coordinator
//!
//! One customer's visit, from the first coin to the dispensed product or
//! the refund.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   CollectingCoins ──proceed()──► SelectingProduct                       │
//! │     ▲   │ insert_coin()              │ select_product(code)             │
//! │     │   │                            ▼                                  │
//! │     │   │                       (evaluate)                              │
//! │     │   │      ProductNotFound / OutOfStock ──► SelectingProduct        │
//! │     └───┼──────────── InsufficientFunds                                 │
//! │         │                        Completed ──► Completed  (terminal)    │
//! │         │                        Aborted   ──► Cancelled  (terminal)    │
//! │         │                                                               │
//! │         └──cancel()── from either open state ──► Cancelled (terminal)   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Commit
//! A sale is staged on a copy of the till: till change withdrawn, banked
//! coins deposited. The product stock is decremented next, and only then
//! the staged till replaces the live one. Any failure on the way leaves
//! both coins and stock exactly as they were and refunds every inserted
//! coin.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

use crate::catalog::{Product, ProductCatalog};
use crate::change::{compute_change, ChangeOutcome};
use crate::coins::CoinBatch;
use crate::denomination::Denomination;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::machine::VendingMachine;
use crate::money::Money;

// =============================================================================
// State & Results
// =============================================================================

/// Where the customer is in the purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionState {
    /// Accepting coins.
    CollectingCoins,
    /// Waiting for a product code.
    SelectingProduct,
    /// Product dispensed.
    Completed,
    /// Coins refunded.
    Cancelled,
}

impl TransactionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionState::Completed | TransactionState::Cancelled)
    }
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransactionState::CollectingCoins => "collecting coins",
            TransactionState::SelectingProduct => "selecting a product",
            TransactionState::Completed => "completed",
            TransactionState::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

/// A completed sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendReceipt {
    /// The product as it is after the sale.
    pub product: Product,
    /// Price charged.
    pub price: Money,
    /// Every coin the customer inserted.
    pub inserted: CoinBatch,
    /// How the change was made.
    pub change: ChangeOutcome,
    /// Units left in the slot.
    pub remaining_stock: u32,
}

/// Outcome of selecting a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
    /// Product dispensed; change in the receipt.
    Completed(VendReceipt),
    /// No such code. Pick again.
    ProductNotFound { code: String },
    /// Slot is empty. Pick again.
    OutOfStock { code: String },
    /// Not enough money. Insert more coins.
    InsufficientFunds {
        price: Money,
        inserted: Money,
        shortfall: Money,
    },
    /// Sale could not be committed. Every coin is refunded.
    Aborted { reason: CoreError, refund: CoinBatch },
}

// =============================================================================
// Coordinator
// =============================================================================

/// Drives one purchase against a borrowed machine.
#[derive(Debug)]
pub struct TransactionCoordinator<'m, C> {
    machine: &'m mut VendingMachine<C>,
    inserted: CoinBatch,
    state: TransactionState,
    /// Code that came back InsufficientFunds, offered again after a top-up.
    pending: Option<String>,
}

impl<'m, C: ProductCatalog> TransactionCoordinator<'m, C> {
    pub(crate) fn new(machine: &'m mut VendingMachine<C>) -> Self {
        debug!("Transaction started");
        TransactionCoordinator {
            machine,
            inserted: CoinBatch::new(),
            state: TransactionState::CollectingCoins,
            pending: None,
        }
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Coins inserted so far.
    pub fn inserted(&self) -> &CoinBatch {
        &self.inserted
    }

    pub fn inserted_total(&self) -> Money {
        self.inserted.total()
    }

    /// The product the customer could not yet afford, if any.
    pub fn pending_selection(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    /// Read access to the machine while the customer is being served.
    pub fn machine(&self) -> &VendingMachine<C> {
        &*self.machine
    }

    /// Parses a typed coin against the machine's denominations.
    pub fn parse_coin(&self, input: &str) -> Result<Denomination, ValidationError> {
        self.machine.config().denominations.parse(input)
    }

    /// Adds a coin and returns the running total.
    ///
    /// ## Errors
    /// - `InvalidTransactionState` outside CollectingCoins
    /// - `Validation` if the coin is not an allowed denomination
    pub fn insert_coin(&mut self, coin: Denomination) -> CoreResult<Money> {
        self.require(TransactionState::CollectingCoins, "insert a coin")?;

        let allowed = &self.machine.config().denominations;
        if !allowed.contains(coin) {
            return Err(ValidationError::NotAllowed {
                field: "coin".to_string(),
                allowed: allowed.iter().map(|d| d.to_string()).collect(),
            }
            .into());
        }

        self.inserted.push(coin);
        debug!(%coin, total = %self.inserted.total(), "Coin inserted");
        Ok(self.inserted.total())
    }

    /// Finishes inserting coins and moves on to product selection.
    pub fn proceed(&mut self) -> CoreResult<()> {
        self.require(TransactionState::CollectingCoins, "continue")?;

        if self.inserted.is_empty() {
            return Err(ValidationError::Required {
                field: "coin".to_string(),
            }
            .into());
        }

        self.state = TransactionState::SelectingProduct;
        Ok(())
    }

    /// Evaluates the customer's choice and, when paid for, commits the sale.
    pub fn select_product(&mut self, code: &str) -> CoreResult<Evaluation> {
        self.require(TransactionState::SelectingProduct, "select a product")?;
        self.pending = None;

        let product = match self.machine.catalog().get_by_code(code) {
            Ok(product) => product,
            Err(CoreError::ProductNotFound(code)) => {
                debug!(%code, "Unknown product selected");
                return Ok(Evaluation::ProductNotFound { code });
            }
            Err(reason) => return Ok(self.abort(reason)),
        };

        if !product.in_stock() {
            debug!(code = %product.code, "Out of stock");
            return Ok(Evaluation::OutOfStock { code: product.code });
        }

        let inserted = self.inserted.total();
        let Some(owed) = inserted.checked_sub(product.price) else {
            let shortfall = product.price.saturating_sub(inserted);
            debug!(code = %product.code, %shortfall, "Insufficient funds");
            self.state = TransactionState::CollectingCoins;
            self.pending = Some(product.code.clone());
            return Ok(Evaluation::InsufficientFunds {
                price: product.price,
                inserted,
                shortfall,
            });
        };

        match self.commit(&product, owed) {
            Ok(receipt) => {
                self.state = TransactionState::Completed;
                info!(
                    code = %receipt.product.code,
                    price = %receipt.price,
                    inserted = %inserted,
                    returned = %receipt.change.returned(),
                    unpayable = %receipt.change.unpayable,
                    "Sale completed"
                );
                Ok(Evaluation::Completed(receipt))
            }
            Err(reason) => Ok(self.abort(reason)),
        }
    }

    /// Refunds every inserted coin. Nothing in the machine changes.
    pub fn cancel(&mut self) -> CoreResult<CoinBatch> {
        if self.state.is_terminal() {
            return Err(self.invalid("cancel"));
        }

        self.state = TransactionState::Cancelled;
        let refund = std::mem::take(&mut self.inserted);
        debug!(%refund, "Transaction cancelled");
        Ok(refund)
    }

    fn commit(&mut self, product: &Product, owed: Money) -> CoreResult<VendReceipt> {
        let (inventory, catalog) = self.machine.parts_mut();

        let mut staged = inventory.clone();
        let change = compute_change(&self.inserted, owed, &mut staged)?;
        staged.deposit_batch(&change.banked)?;

        let remaining_stock = catalog.decrement_stock(&product.code)?;
        *inventory = staged;

        Ok(VendReceipt {
            product: Product {
                quantity: remaining_stock,
                ..product.clone()
            },
            price: product.price,
            inserted: self.inserted.clone(),
            change,
            remaining_stock,
        })
    }

    fn abort(&mut self, reason: CoreError) -> Evaluation {
        let refund = std::mem::take(&mut self.inserted);
        warn!(error = %reason, %refund, "Sale aborted, refunding coins");
        self.state = TransactionState::Cancelled;
        Evaluation::Aborted { reason, refund }
    }

    fn require(&self, expected: TransactionState, action: &'static str) -> CoreResult<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    fn invalid(&self, action: &'static str) -> CoreError {
        CoreError::InvalidTransactionState {
            state: self.state.to_string(),
            action,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::config::MachineConfig;
    use crate::denomination::DEFAULT_DENOMINATIONS;
    use crate::inventory::CoinInventory;
    use proptest::prelude::*;

    fn d(value: u32) -> Denomination {
        Denomination::new(value)
    }

    fn batch(values: &[u32]) -> CoinBatch {
        values.iter().map(|&v| d(v)).collect()
    }

    fn machine(stock: &[(u32, u32)], products: Vec<Product>) -> VendingMachine {
        let config = MachineConfig::default();
        let inventory = CoinInventory::with_stock(&config, stock.iter().copied()).unwrap();
        let catalog = Catalog::with_products(&config, products).unwrap();
        VendingMachine::new(config, inventory, catalog).unwrap()
    }

    fn product(code: &str, price: u64, quantity: u32) -> Product {
        Product::new(code, code, Money::from_stotinki(price), quantity)
    }

    fn insert_all<C: ProductCatalog>(tx: &mut TransactionCoordinator<'_, C>, coins: &[u32]) {
        for &coin in coins {
            tx.insert_coin(d(coin)).unwrap();
        }
    }

    #[test]
    fn scenario_a_change_from_till() {
        let mut vm = machine(&[(50, 11)], vec![product("A1", 150, 2)]);

        let mut tx = vm.begin_transaction();
        insert_all(&mut tx, &[100, 100]);
        tx.proceed().unwrap();
        let Evaluation::Completed(receipt) = tx.select_product("A1").unwrap() else {
            panic!("expected a completed sale");
        };
        assert_eq!(tx.state(), TransactionState::Completed);

        assert!(receipt.change.returned_from_inserted.is_empty());
        assert_eq!(receipt.change.returned_from_till, batch(&[50]));
        assert_eq!(receipt.change.banked, batch(&[100, 100]));
        assert_eq!(receipt.change.unpayable, Money::zero());
        assert_eq!(receipt.remaining_stock, 1);

        assert_eq!(vm.inventory().quantity(d(50)), 10);
        assert_eq!(vm.inventory().quantity(d(100)), 2);
        assert_eq!(vm.catalog().get_by_code("A1").unwrap().quantity, 1);
    }

    #[test]
    fn scenario_b_exact_payment() {
        let mut vm = machine(&[], vec![product("A1", 200, 1)]);

        let mut tx = vm.begin_transaction();
        insert_all(&mut tx, &[200]);
        tx.proceed().unwrap();
        let Evaluation::Completed(receipt) = tx.select_product("A1").unwrap() else {
            panic!("expected a completed sale");
        };

        assert!(receipt.change.returned().is_empty());
        assert_eq!(receipt.change.banked, batch(&[200]));
        assert!(receipt.change.is_exact());
        assert_eq!(vm.inventory().quantity(d(200)), 1);
    }

    #[test]
    fn scenario_c_insufficient_funds() {
        let mut vm = machine(&[(50, 20)], vec![product("A1", 150, 1)]);
        let before = vm.inventory().clone();

        let mut tx = vm.begin_transaction();
        insert_all(&mut tx, &[100]);
        tx.proceed().unwrap();
        assert_eq!(
            tx.select_product("A1").unwrap(),
            Evaluation::InsufficientFunds {
                price: Money::from_stotinki(150),
                inserted: Money::from_stotinki(100),
                shortfall: Money::from_stotinki(50),
            }
        );
        assert_eq!(tx.state(), TransactionState::CollectingCoins);
        assert_eq!(tx.inserted(), &batch(&[100]));
        assert_eq!(tx.pending_selection(), Some("A1"));

        // Topping up completes the sale with the same coins kept
        insert_all(&mut tx, &[50]);
        tx.proceed().unwrap();
        assert!(matches!(
            tx.select_product("A1").unwrap(),
            Evaluation::Completed(_)
        ));
        assert_ne!(vm.inventory(), &before);
    }

    #[test]
    fn test_pending_selection_follows_last_choice() {
        let mut vm = machine(&[], vec![product("A1", 150, 1), product("B1", 300, 1)]);

        let mut tx = vm.begin_transaction();
        assert_eq!(tx.pending_selection(), None);
        insert_all(&mut tx, &[100]);
        tx.proceed().unwrap();
        tx.select_product("b1").unwrap();
        assert_eq!(tx.pending_selection(), Some("B1"));

        // A different choice replaces it
        tx.proceed().unwrap();
        assert!(matches!(
            tx.select_product("Z9").unwrap(),
            Evaluation::ProductNotFound { .. }
        ));
        assert_eq!(tx.pending_selection(), None);

        tx.select_product("A1").unwrap();
        assert_eq!(tx.pending_selection(), Some("A1"));
    }

    #[test]
    fn scenario_c_leaves_inventory_untouched() {
        let mut vm = machine(&[(50, 20)], vec![product("A1", 150, 1)]);
        let before = vm.inventory().clone();

        let mut tx = vm.begin_transaction();
        insert_all(&mut tx, &[100]);
        tx.proceed().unwrap();
        tx.select_product("A1").unwrap();
        tx.cancel().unwrap();

        assert_eq!(vm.inventory(), &before);
        assert_eq!(vm.catalog().get_by_code("A1").unwrap().quantity, 1);
    }

    #[test]
    fn scenario_d_unpayable_change_still_dispenses() {
        let mut vm = machine(&[(20, 10)], vec![product("A1", 170, 1)]);

        let mut tx = vm.begin_transaction();
        insert_all(&mut tx, &[200]);
        tx.proceed().unwrap();
        let Evaluation::Completed(receipt) = tx.select_product("A1").unwrap() else {
            panic!("expected a completed sale");
        };

        assert!(receipt.change.returned().is_empty());
        assert_eq!(receipt.change.unpayable, Money::from_stotinki(30));
        assert_eq!(receipt.remaining_stock, 0);
        assert_eq!(vm.inventory().quantity(d(20)), 10);
    }

    #[test]
    fn scenario_e_cancel_refunds_exactly() {
        let mut vm = machine(&[(50, 15)], vec![product("A1", 100, 1)]);
        let before = vm.inventory().clone();

        let mut tx = vm.begin_transaction();
        insert_all(&mut tx, &[20, 50]);
        assert_eq!(tx.cancel().unwrap(), batch(&[20, 50]));
        assert_eq!(tx.state(), TransactionState::Cancelled);

        assert_eq!(vm.inventory(), &before);
    }

    #[test]
    fn test_out_of_stock_and_unknown_code_keep_coins() {
        let mut vm = machine(&[], vec![product("A1", 100, 0), product("A2", 100, 1)]);

        let mut tx = vm.begin_transaction();
        insert_all(&mut tx, &[100]);
        tx.proceed().unwrap();

        assert_eq!(
            tx.select_product("A1").unwrap(),
            Evaluation::OutOfStock {
                code: "A1".to_string()
            }
        );
        assert_eq!(
            tx.select_product("Z9").unwrap(),
            Evaluation::ProductNotFound {
                code: "Z9".to_string()
            }
        );
        assert_eq!(tx.state(), TransactionState::SelectingProduct);
        assert!(matches!(
            tx.select_product("a2").unwrap(),
            Evaluation::Completed(_)
        ));
    }

    #[test]
    fn test_state_guards() {
        let mut vm = machine(&[], vec![product("A1", 100, 1)]);
        let mut tx = vm.begin_transaction();

        // Nothing inserted yet
        assert!(matches!(
            tx.proceed(),
            Err(CoreError::Validation(ValidationError::Required { .. }))
        ));
        assert!(matches!(
            tx.select_product("A1"),
            Err(CoreError::InvalidTransactionState { .. })
        ));
        assert!(matches!(
            tx.insert_coin(d(5)),
            Err(CoreError::Validation(ValidationError::NotAllowed { .. }))
        ));
        assert!(tx.inserted().is_empty());

        insert_all(&mut tx, &[100]);
        tx.proceed().unwrap();
        assert!(matches!(
            tx.insert_coin(d(10)),
            Err(CoreError::InvalidTransactionState { .. })
        ));

        tx.cancel().unwrap();
        assert!(matches!(
            tx.cancel(),
            Err(CoreError::InvalidTransactionState { .. })
        ));
    }

    #[test]
    fn test_parse_coin() {
        let mut vm = machine(&[], vec![]);
        let tx = vm.begin_transaction();
        assert_eq!(tx.parse_coin("1lv").unwrap(), d(100));
        assert!(tx.parse_coin("3lv").is_err());
    }

    /// Catalog whose stock disappears between lookup and decrement.
    struct DepletingCatalog {
        product: Product,
    }

    impl ProductCatalog for DepletingCatalog {
        fn get_by_code(&self, _code: &str) -> CoreResult<Product> {
            Ok(self.product.clone())
        }

        fn decrement_stock(&mut self, code: &str) -> CoreResult<u32> {
            Err(CoreError::OutOfStock {
                code: code.to_string(),
            })
        }
    }

    #[test]
    fn test_concurrent_depletion_aborts_with_full_refund() {
        let config = MachineConfig::default();
        let inventory = CoinInventory::with_stock(&config, [(50, 12)]).unwrap();
        let catalog = DepletingCatalog {
            product: product("A1", 150, 1),
        };
        let mut vm = VendingMachine::new(config, inventory, catalog).unwrap();
        let before = vm.inventory().clone();

        let mut tx = vm.begin_transaction();
        insert_all(&mut tx, &[100, 100]);
        tx.proceed().unwrap();

        match tx.select_product("A1").unwrap() {
            Evaluation::Aborted { reason, refund } => {
                assert!(matches!(reason, CoreError::OutOfStock { .. }));
                assert_eq!(refund, batch(&[100, 100]));
            }
            other => panic!("expected abort, got {other:?}"),
        }
        assert_eq!(tx.state(), TransactionState::Cancelled);
        assert!(tx.inserted().is_empty());

        assert_eq!(vm.inventory(), &before);
    }

    fn coin_strategy() -> impl Strategy<Value = u32> {
        prop::sample::select(DEFAULT_DENOMINATIONS.to_vec())
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Property: cancelling returns exactly the inserted coins and
        /// leaves the machine untouched, from either open state.
        #[test]
        fn cancellation_refunds_exactly(
            coins in prop::collection::vec(coin_strategy(), 1..10),
            after_proceed in any::<bool>(),
        ) {
            let mut vm = machine(&[(10, 15), (50, 15)], vec![product("A1", 100, 1)]);
            let before = vm.inventory().clone();

            let mut tx = vm.begin_transaction();
            insert_all(&mut tx, &coins);
            if after_proceed {
                tx.proceed().unwrap();
            }
            let refund = tx.cancel().unwrap();

            prop_assert_eq!(refund, batch(&coins));
            prop_assert_eq!(vm.inventory(), &before);
            prop_assert_eq!(vm.catalog().get_by_code("A1").unwrap().quantity, 1);
        }

        /// Property: a completed sale changes the till by exactly the
        /// banked coins minus the till change.
        #[test]
        fn completed_sale_balances_the_till(
            coins in prop::collection::vec(coin_strategy(), 1..10),
            price in 1u64..400,
        ) {
            let mut vm = machine(&[(10, 14), (20, 12), (50, 11), (100, 10)], vec![product("A1", price, 1)]);
            let before = vm.till_value();

            let mut tx = vm.begin_transaction();
            insert_all(&mut tx, &coins);
            tx.proceed().unwrap();
            let evaluation = tx.select_product("A1").unwrap();

            if let Evaluation::Completed(receipt) = evaluation {
                let change = &receipt.change;
                prop_assert_eq!(
                    vm.till_value() + change.returned_from_till.total(),
                    before + change.banked.total()
                );
                prop_assert_eq!(
                    change.banked.total() + change.returned_from_inserted.total(),
                    receipt.inserted.total()
                );
                prop_assert_eq!(
                    receipt.price + change.returned_total() + change.unpayable,
                    receipt.inserted.total()
                );
            }
        }
    }
}
