//! # vendo-core: Pure Vending Logic
//!
//! This crate is the **heart** of the vending machine. It holds the coin
//! till, the change engine and the purchase state machine as plain data and
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Vending Machine Architecture                       │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Console (apps/console)                       │   │
//! │  │    Role prompt ──► Customer session / Vendor session            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ vendo-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │ inventory │  │  change   │  │transaction│  │  catalog  │  │   │
//! │  │   │ CoinStock │  │  greedy   │  │  state    │  │  Product  │  │   │
//! │  │   │  reserve  │  │  2-phase  │  │  machine  │  │  slots    │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO TERMINAL • DETERMINISTIC           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    vendo-db (Database Layer)                    │   │
//! │  │          SQLite coins/products/sales, migrations, seed          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money in stotinki (no floating point)
//! - [`denomination`] - Coin values and the allowed set
//! - [`coins`] - Coin batches (inserted, returned, banked)
//! - [`inventory`] - The coin till with per-denomination reserves
//! - [`change`] - Two-phase greedy change calculation
//! - [`catalog`] - Products and the `ProductCatalog` contract
//! - [`machine`] - The owned machine state and vendor operations
//! - [`transaction`] - One customer's purchase
//! - [`config`] - Machine configuration
//! - [`validation`] - Input rules
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use vendo_core::{
//!     Catalog, CoinInventory, Denomination, Evaluation, MachineConfig, Money, Product,
//!     VendingMachine,
//! };
//!
//! let config = MachineConfig::default();
//! let inventory = CoinInventory::with_stock(&config, [(50, 11)]).unwrap();
//! let catalog = Catalog::with_products(
//!     &config,
//!     vec![Product::new("A1", "Water", Money::from_stotinki(150), 3)],
//! )
//! .unwrap();
//! let mut machine = VendingMachine::new(config, inventory, catalog).unwrap();
//!
//! let mut tx = machine.begin_transaction();
//! tx.insert_coin(Denomination::new(100)).unwrap();
//! tx.insert_coin(Denomination::new(100)).unwrap();
//! tx.proceed().unwrap();
//!
//! match tx.select_product("A1").unwrap() {
//!     Evaluation::Completed(receipt) => {
//!         assert_eq!(receipt.change.returned_total(), Money::from_stotinki(50));
//!     }
//!     other => panic!("unexpected {other:?}"),
//! }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod catalog;
pub mod change;
pub mod coins;
pub mod config;
pub mod denomination;
pub mod error;
pub mod inventory;
pub mod machine;
pub mod money;
pub mod transaction;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use catalog::{Catalog, Product, ProductCatalog};
pub use change::{compute_change, plan_change, ChangeOutcome, ChangeStatus};
pub use coins::CoinBatch;
pub use config::{MachineConfig, ReserveOverride};
pub use denomination::{Denomination, Denominations};
pub use error::{CoreError, CoreResult, ValidationError};
pub use inventory::{CoinInventory, CoinStock};
pub use machine::VendingMachine;
pub use money::Money;
pub use transaction::{Evaluation, TransactionCoordinator, TransactionState, VendReceipt};
