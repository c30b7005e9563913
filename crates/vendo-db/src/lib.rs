//! # vendo-db: Database Layer for the Vending Machine
//!
//! Durable storage for the coin till, the product slots and the sales
//! journal. SQLite through sqlx, migrations embedded at compile time.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Vendo Data Flow                                  │
//! │                                                                         │
//! │  Console session (customer vend / vendor action)                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     vendo-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ CoinRepo      │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ ProductRepo   │    │ 001_init.sql │  │   │
//! │  │   │ load_machine  │    │ SaleRepo      │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (vendo.db)                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and machine loading
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Coin, product and sale repositories
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vendo_core::MachineConfig;
//! use vendo_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("vendo.db")).await?;
//! let mut machine = db.load_machine(MachineConfig::default()).await?;
//!
//! // ... run a transaction ...
//! db.sales().commit_vend(&receipt, &machine.coin_report()).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::coin::CoinRepository;
pub use repository::product::ProductRepository;
pub use repository::sale::{SaleRecord, SaleRepository, SalesTotals};
