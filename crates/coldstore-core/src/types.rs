//! # Domain Types
//!
//! Core domain types for the cold-store ledger engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  StockMovement  │   │      Sale       │   │    SaleItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  movement_type  │   │  transaction_id │   │  product_name   │       │
//! │  │  quantity       │   │  payment_type   │   │  unit_cost_cents│       │
//! │  │  remaining_qty  │   │  amount_paid    │   │  (FIFO, frozen) │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  MovementType   │   │  PaymentType    │   │   SaleStatus    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  Received       │   │  Cash           │   │  Completed      │       │
//! │  │  Sold           │   │  Credit         │   │  Pending        │       │
//! │  │  Adjusted       │   │  Partial        │   │  Cancelled      │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Sales have two identifiers:
//! - `id`: UUID v4 - immutable, used for database relations
//! - `transaction_id`: human-readable business id shown on receipts
//!
//! The payment-type branching that the data demands lives on the closed
//! [`PaymentType`] enum (see the `payment` module), never on strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Movement Type
// =============================================================================

/// The kind of stock movement recorded in the ledger.
///
/// Direction is encoded by the type, not the sign of the quantity:
/// `received` and `sold` store positive magnitudes, `adjusted` stores a
/// signed delta directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    /// Stock received from a supplier (or restored by a sale reversal).
    Received,
    /// Stock consumed by a sale.
    Sold,
    /// Manual correction; quantity carries its own sign.
    Adjusted,
}

impl MovementType {
    /// The signed contribution of a movement of this type to quantity-on-hand.
    ///
    /// `+quantity` for received, `+quantity` for adjusted (already signed),
    /// `-quantity` for sold. This is the canonical stock-on-hand fold.
    #[inline]
    pub const fn signed(&self, quantity: i64) -> i64 {
        match self {
            MovementType::Received | MovementType::Adjusted => quantity,
            MovementType::Sold => -quantity,
        }
    }
}

// =============================================================================
// Payment Type
// =============================================================================

/// How a sale was paid for.
///
/// The amount-paid invariant for each variant is enforced centrally in
/// [`PaymentType::validate_amount`](crate::payment) and reused everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    /// Paid in full at sale time.
    Cash,
    /// Nothing paid at sale time; full amount owed.
    Credit,
    /// Paid some, owes the rest.
    Partial,
}

// =============================================================================
// Sale Status
// =============================================================================

/// The status of a sale transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Sale committed; counts in every valuation and report.
    Completed,
    /// Recorded but not finalized; excluded from valuation.
    Pending,
    /// Cancelled after the fact; ledger rows are kept for audit and stock
    /// is restored via compensating movements.
    Cancelled,
}

impl Default for SaleStatus {
    fn default() -> Self {
        SaleStatus::Completed
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product in the cold-store catalog.
///
/// Catalog metadata is maintained externally; the engine needs identity,
/// default prices for margin estimation, and the supplier reference.
/// Stock quantity is NOT stored here: quantity-on-hand is always derived
/// from the movement ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown on sale lines (snapshotted at sale time).
    pub name: String,

    /// Optional category label (e.g., "frozen fish").
    pub category: Option<String>,

    /// Default cost price in cents; used by catalog-level profit analysis.
    pub default_cost_cents: i64,

    /// Default selling price in cents.
    pub default_price_cents: i64,

    /// Supplier reference.
    pub supplier_id: Option<String>,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the default cost price as a Money type.
    #[inline]
    pub fn default_cost(&self) -> Money {
        Money::from_cents(self.default_cost_cents)
    }

    /// Returns the default selling price as a Money type.
    #[inline]
    pub fn default_price(&self) -> Money {
        Money::from_cents(self.default_price_cents)
    }
}

// =============================================================================
// Stock Movement
// =============================================================================

/// An immutable entry in the stock ledger.
///
/// ## Invariants
/// - `quantity` > 0 for `received`/`sold` (direction is in the type)
/// - `quantity` != 0 for `adjusted` (sign is the correction direction)
/// - Rows are never rewritten; a sale is undone only by appending a
///   compensating `received` movement
///
/// `remaining_quantity` is the FIFO bookkeeping field: for `received`
/// batches it starts equal to `quantity` and is decremented as sales
/// consume the batch. The immutable `quantity` field is never touched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockMovement {
    pub id: String,
    pub product_id: String,
    pub movement_type: MovementType,

    /// Magnitude for received/sold, signed delta for adjusted.
    pub quantity: i64,

    /// Unconsumed portion of a received batch (FIFO state). Zero for
    /// sold/adjusted rows.
    pub remaining_quantity: i64,

    /// Cost per unit in cents.
    pub unit_cost_cents: i64,

    /// Total cost in cents; defaults to `unit_cost × |quantity|`.
    pub total_cost_cents: i64,

    pub supplier_id: Option<String>,

    /// Set when the movement was produced by a sale (sold rows and the
    /// compensating received rows of a cancellation).
    pub sale_id: Option<String>,

    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl StockMovement {
    /// Signed contribution of this movement to quantity-on-hand.
    #[inline]
    pub fn signed_quantity(&self) -> i64 {
        self.movement_type.signed(self.quantity)
    }

    /// Returns the unit cost as Money.
    #[inline]
    pub fn unit_cost(&self) -> Money {
        Money::from_cents(self.unit_cost_cents)
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A sale transaction, committed atomically with its line items and the
/// corresponding `sold` stock movements.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,

    /// Human-readable business identifier (unique).
    pub transaction_id: String,

    /// Registered customer, if any.
    pub customer_id: Option<String>,

    /// Free-text fallback when no registered customer is attached.
    pub customer_name: Option<String>,

    pub subtotal_cents: i64,

    /// Carried for schema compatibility; tax computation is out of scope
    /// and this is always zero.
    pub tax_cents: i64,

    pub total_cents: i64,
    pub payment_type: PaymentType,
    pub status: SaleStatus,
    pub amount_paid_cents: i64,

    /// Who recorded the sale. Threaded in explicitly; there is no ambient
    /// current-user context in this engine.
    pub actor_id: String,

    pub created_at: DateTime<Utc>,
}

impl Sale {
    /// Amount still owed. Always derived, never stored.
    #[inline]
    pub fn amount_owed_cents(&self) -> i64 {
        self.total_cents - self.amount_paid_cents
    }

    /// Returns the total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Returns the amount paid as Money.
    #[inline]
    pub fn amount_paid(&self) -> Money {
        Money::from_cents(self.amount_paid_cents)
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale.
/// Uses the snapshot pattern to freeze product name and FIFO cost at sale time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,

    /// Product name at time of sale (frozen).
    pub product_name: String,

    pub quantity: i64,

    /// Selling price per unit at time of sale.
    pub unit_price_cents: i64,

    /// FIFO-derived cost per unit at sale time, immutable thereafter.
    pub unit_cost_cents: i64,

    /// Line total (= quantity × unit_price_cents).
    pub total_cents: i64,

    pub created_at: DateTime<Utc>,
}

impl SaleItem {
    /// Line profit: quantity × (selling price − FIFO cost).
    #[inline]
    pub fn profit_cents(&self) -> i64 {
        self.quantity * (self.unit_price_cents - self.unit_cost_cents)
    }

    /// Returns the line total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A registered customer who may buy on credit.
///
/// The outstanding balance is always derived from the sales ledger minus
/// collections; there is no cached balance column to drift.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub credit_limit_cents: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Supplier
// =============================================================================

/// A supplier of received stock.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Supplier {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Credit Collection
// =============================================================================

/// A payment received against a customer's outstanding credit/partial debt.
///
/// `debt_left_cents` snapshots the remaining debt immediately after this
/// collection, for the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CreditCollection {
    pub id: String,
    pub customer_id: String,
    pub amount_collected_cents: i64,
    pub debt_left_cents: i64,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_quantity() {
        assert_eq!(MovementType::Received.signed(10), 10);
        assert_eq!(MovementType::Sold.signed(10), -10);
        assert_eq!(MovementType::Adjusted.signed(-3), -3);
        assert_eq!(MovementType::Adjusted.signed(4), 4);
    }

    #[test]
    fn test_amount_owed_is_derived() {
        let sale = Sale {
            id: "s1".to_string(),
            transaction_id: "TXN1".to_string(),
            customer_id: None,
            customer_name: Some("Walk-in".to_string()),
            subtotal_cents: 10000,
            tax_cents: 0,
            total_cents: 10000,
            payment_type: PaymentType::Partial,
            status: SaleStatus::Completed,
            amount_paid_cents: 4000,
            actor_id: "user-1".to_string(),
            created_at: Utc::now(),
        };
        assert_eq!(sale.amount_owed_cents(), 6000);
    }

    #[test]
    fn test_line_profit() {
        let item = SaleItem {
            id: "i1".to_string(),
            sale_id: "s1".to_string(),
            product_id: "p1".to_string(),
            product_name: "Frozen Chicken".to_string(),
            quantity: 5,
            unit_price_cents: 800,
            unit_cost_cents: 500,
            total_cents: 4000,
            created_at: Utc::now(),
        };
        assert_eq!(item.profit_cents(), 1500);
    }
}
