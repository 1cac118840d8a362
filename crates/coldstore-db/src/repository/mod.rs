//! # Repository Modules
//!
//! Each repository owns one slice of the ledger:
//!
//! - [`stock`] - The append-only stock movement ledger and quantity-on-hand
//! - [`sale`] - The sales ledger and the atomic sale transaction builder
//! - [`credit`] - Outstanding debt and credit collections
//! - [`catalog`] - Products, customers and suppliers (thin persistence)
//!
//! Repositories are cheap to create (they clone an `SqlitePool` handle) and
//! are handed out by [`Database`](crate::pool::Database).

pub mod catalog;
pub mod credit;
pub mod sale;
pub mod stock;
