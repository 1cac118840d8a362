//! # Error Types
//!
//! Domain-specific error types for coldstore-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  coldstore-core errors (this file)                                     │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  coldstore-db errors (separate crate)                                  │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── StoreError       - CoreError | DbError at the engine boundary     │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → StoreError → caller               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product, amounts, etc.)
//! 3. Errors are enum variants, never String
//! 4. A failed allocation is NEVER papered over with a zero cost

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or ledger inconsistencies.
/// They should be caught and translated to user-friendly messages.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Customer cannot be found.
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    /// Sale cannot be found (by transaction id).
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Insufficient stock to complete a sale.
    ///
    /// ## When This Occurs
    /// - A sale line requests more than the product's available quantity
    /// - The whole transaction is rejected; no line is committed
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// FIFO allocation could not satisfy the requested quantity even though
    /// the sufficiency check passed.
    ///
    /// ## When This Occurs
    /// - Concurrent consumption between check and allocation
    /// - Corrupted `remaining_quantity` bookkeeping
    ///
    /// This aborts the whole transaction. It is never defaulted to a zero
    /// unit cost, which would silently erase margin data.
    #[error("FIFO allocation shortfall for {product}: requested {requested}, batches cover {covered}")]
    AllocationShortfall {
        product: String,
        requested: i64,
        covered: i64,
    },

    /// Sale is not in a state that allows the requested operation.
    #[error("Sale {transaction_id} is {current_status}, cannot perform operation")]
    InvalidSaleStatus {
        transaction_id: String,
        current_status: String,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input violates a business invariant.
/// Each variant names the offending field so the caller can surface a
/// field-level message.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be zero (signed adjustments allow either direction).
    #[error("{field} must not be zero")]
    MustBeNonZero { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// The amount paid does not satisfy the payment-type invariant.
    ///
    /// cash ⇒ paid == total, credit ⇒ paid == 0, partial ⇒ 0 < paid < total.
    #[error("amount_paid: {reason}")]
    PaymentAmount { reason: String },

    /// Collection amount exceeds the customer's remaining debt.
    #[error("amount_collected cannot be more than the remaining debt (requested {requested}, remaining {remaining})")]
    OverCollection { requested: i64, remaining: i64 },
}

impl ValidationError {
    /// The input field this error refers to, for field-level error reporting.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::MustBePositive { field }
            | ValidationError::MustBeNonZero { field }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::TooLong { field, .. } => field,
            ValidationError::PaymentAmount { .. } => "amount_paid",
            ValidationError::OverCollection { .. } => "amount_collected",
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
