//! # coldstore-core: Pure Business Logic for the Cold-Store Engine
//!
//! This crate is the **heart** of the cold-store stock-and-sales
//! reconciliation engine. It contains all business logic as pure functions
//! with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Coldstore Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │           CRUD / UI collaborators (out of scope)                │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ coldstore-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   fifo    │  │  payment  │  │   │
//! │  │   │ Movement  │  │   Money   │  │ allocate  │  │ invariant │  │   │
//! │  │   │ Sale/Item │  │  (cents)  │  │  batches  │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 coldstore-db (Database Layer)                   │   │
//! │  │       SQLite ledgers, sale builder, valuation, reports          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (StockMovement, Sale, SaleItem, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`fifo`] - FIFO cost allocation over received batches
//! - [`payment`] - The cash/credit/partial amount-paid invariant
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float drift
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use coldstore_core::fifo::{allocate, Batch};
//! use coldstore_core::money::Money;
//!
//! let batches = vec![
//!     Batch { movement_id: "m1".into(), remaining_quantity: 10, unit_cost: Money::from_cents(200) },
//!     Batch { movement_id: "m2".into(), remaining_quantity: 10, unit_cost: Money::from_cents(300) },
//! ];
//!
//! let alloc = allocate("Tilapia", &batches, 15).unwrap();
//! assert_eq!(alloc.total_cost.cents(), 3500);
//! assert_eq!(alloc.unit_cost.cents(), 233);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod fifo;
pub mod money;
pub mod payment;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use coldstore_core::Money` instead of
// `use coldstore_core::money::Money`

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items allowed in a single sale.
///
/// ## Business Reason
/// Prevents runaway transactions and keeps the FIFO critical section short.
pub const MAX_SALE_ITEMS: usize = 100;

/// Maximum quantity on a single sale line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 999;

/// Maximum length of free-text notes on movements and collections.
pub const MAX_NOTES_LEN: usize = 1000;

/// Default low-stock alert threshold, in units.
///
/// The observed deployments used 5 or 10; this is configuration, not law,
/// and callers can override it per report.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 10;
