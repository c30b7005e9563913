//! # Vending Machine
//!
//! The single owned state object: configuration, coin till and catalog.
//!
//! ## Single Writer
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  VendingMachine                                                         │
//! │  ├── config     (immutable after construction)                          │
//! │  ├── inventory  CoinInventory                                           │
//! │  └── catalog    C: ProductCatalog                                       │
//! │                                                                         │
//! │  begin_transaction(&mut self) ──► TransactionCoordinator<'_, C>         │
//! │      holds the only &mut until the customer is done                     │
//! │                                                                         │
//! │  deposit_coins / collect_coins / add_product / ... (&mut self)          │
//! │      cannot be called while a coordinator is alive                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tracing::info;

use crate::catalog::{Catalog, Product, ProductCatalog};
use crate::config::MachineConfig;
use crate::denomination::Denomination;
use crate::error::CoreResult;
use crate::inventory::{CoinInventory, CoinStock};
use crate::money::Money;
use crate::transaction::TransactionCoordinator;
use crate::validation::{validate_coin_count, validate_quantity};

/// Machine state shared by customer and vendor sessions.
#[derive(Debug, Clone)]
pub struct VendingMachine<C = Catalog> {
    config: MachineConfig,
    inventory: CoinInventory,
    catalog: C,
}

impl<C: ProductCatalog> VendingMachine<C> {
    /// Assembles a machine from loaded parts.
    ///
    /// ## Errors
    /// `InvalidConfig` if the configuration does not validate.
    pub fn new(config: MachineConfig, inventory: CoinInventory, catalog: C) -> CoreResult<Self> {
        config.validate()?;
        Ok(VendingMachine {
            config,
            inventory,
            catalog,
        })
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn inventory(&self) -> &CoinInventory {
        &self.inventory
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Starts serving one customer.
    pub fn begin_transaction(&mut self) -> TransactionCoordinator<'_, C> {
        TransactionCoordinator::new(self)
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut CoinInventory, &mut C) {
        (&mut self.inventory, &mut self.catalog)
    }

    // =========================================================================
    // Vendor: coins
    // =========================================================================

    /// Loads coins into the till.
    pub fn deposit_coins(&mut self, denomination: Denomination, quantity: u32) -> CoreResult<()> {
        validate_coin_count(quantity)?;
        self.inventory.deposit(denomination, quantity)?;

        info!(%denomination, quantity, "Coins deposited");
        Ok(())
    }

    /// Takes coins out of the till. The reserve stays behind.
    pub fn collect_coins(&mut self, denomination: Denomination, quantity: u32) -> CoreResult<()> {
        validate_coin_count(quantity)?;
        self.inventory.withdraw(denomination, quantity)?;

        info!(%denomination, quantity, "Coins collected");
        Ok(())
    }

    /// Till contents, largest denomination first.
    pub fn coin_report(&self) -> Vec<CoinStock> {
        self.inventory.snapshot()
    }

    /// Value of every coin in the till.
    pub fn till_value(&self) -> Money {
        self.inventory.total_value()
    }
}

// =============================================================================
// Vendor: products
// =============================================================================

impl VendingMachine<Catalog> {
    /// Products ordered by code.
    pub fn products(&self) -> Vec<Product> {
        self.catalog.list()
    }

    pub fn add_product(&mut self, product: Product) -> CoreResult<Product> {
        self.catalog.add(product).cloned()
    }

    pub fn remove_product(&mut self, code: &str) -> CoreResult<Product> {
        self.catalog.remove(code)
    }

    pub fn update_price(&mut self, code: &str, price: Money) -> CoreResult<Product> {
        self.catalog.update_price(code, price).cloned()
    }

    /// Restocks a slot. Vendors never set a slot to zero.
    pub fn update_quantity(&mut self, code: &str, quantity: u32) -> CoreResult<Product> {
        validate_quantity(quantity, self.config.max_product_quantity)?;
        self.catalog.update_quantity(code, quantity).cloned()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
