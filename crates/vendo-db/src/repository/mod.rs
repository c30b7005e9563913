//! # Repository Module
//!
//! Database repository implementations for the vending machine.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Console session                                                       │
//! │       │                                                                 │
//! │       │  db.coins().save_stock(&machine.coin_report())                  │
//! │       ▼                                                                 │
//! │  CoinRepository / ProductRepository / SaleRepository                   │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  The machine in memory is the source of truth during a session;        │
//! │  repositories write its state back after every committed change.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`coin::CoinRepository`] - The coin till
//! - [`product::ProductRepository`] - Product slots
//! - [`sale::SaleRepository`] - Sales journal and the commit-vend transaction

pub mod coin;
pub mod product;
pub mod sale;
