//! # coldstore-db: Database Layer for the Cold-Store Engine
//!
//! SQLite persistence for the stock ledger, sales ledger and credit
//! collections, plus the read-only reporting aggregator. Business math
//! (FIFO allocation, payment invariants, money arithmetic) lives in
//! `coldstore-core`; this crate feeds it data and applies its decisions
//! transactionally.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         coldstore-db                                    │
//! │                                                                         │
//! │  ┌─────────────┐      ┌──────────────────────────────────────────────┐ │
//! │  │  Database   │─────►│ Repositories                                 │ │
//! │  │  (pool +    │      │  movements()  stock ledger, on-hand fold     │ │
//! │  │   writer    │      │  sales()      sale builder, cancellation     │ │
//! │  │   lock)     │      │  credit()     debt fold, collections         │ │
//! │  └─────────────┘      │  catalog()    products/customers/suppliers   │ │
//! │        │              │  reports()    valuation & sales reports      │ │
//! │        ▼              └──────────────────────────────────────────────┘ │
//! │  SQLite (WAL) with embedded migrations                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```rust,ignore
//! use coldstore_db::{Database, DbConfig, NewMovement, CreateSale};
//!
//! let db = Database::new(DbConfig::new("./coldstore.db")).await?;
//!
//! let product = db.catalog().create_product(new_product).await?;
//! db.movements().record(NewMovement::received(&product.id, 20, 500)).await?;
//! let sale = db.sales().create_sale(sale_input).await?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod reports;
pub mod repository;

// Re-export main types for convenience
pub use error::{DbError, DbResult, StoreError, StoreResult};
pub use pool::{Database, DbConfig};
pub use reports::{
    ActivitySummary, DailySalesReport, DashboardSummary, LowStockProduct, ProductBreakdown,
    ProductProfit, ProfitReport, ReportTotals, Reports, SaleEntry,
};
pub use repository::catalog::{CatalogRepository, NewCustomer, NewProduct, NewSupplier};
pub use repository::credit::{CreditRepository, CustomerDebt, NewCollection};
pub use repository::sale::{CreateSale, SaleLine, SaleRepository, SaleWithItems};
pub use repository::stock::{NewMovement, StockMovementRepository};

// =============================================================================
// Shared Test Fixtures
// =============================================================================

#[cfg(test)]
pub(crate) mod testutil {
    use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

    use crate::pool::{Database, DbConfig};
    use crate::repository::catalog::{NewCustomer, NewProduct};
    use coldstore_core::{Customer, Product};

    /// A fresh, fully migrated in-memory database.
    pub async fn test_db() -> Database {
        Database::new(DbConfig::in_memory())
            .await
            .expect("in-memory database")
    }

    /// Creates an active product with the given default prices.
    pub async fn seed_product(
        db: &Database,
        name: &str,
        default_cost_cents: i64,
        default_price_cents: i64,
    ) -> Product {
        db.catalog()
            .create_product(NewProduct {
                name: name.to_string(),
                category: Some("frozen".to_string()),
                default_cost_cents,
                default_price_cents,
                supplier_id: None,
            })
            .await
            .expect("seed product")
    }

    /// Creates an active customer.
    pub async fn seed_customer(db: &Database, name: &str) -> Customer {
        db.catalog()
            .create_customer(NewCustomer {
                name: name.to_string(),
                phone: None,
                email: None,
                address: None,
                credit_limit_cents: 0,
            })
            .await
            .expect("seed customer")
    }

    /// A deterministic UTC timestamp at noon on the given day, for
    /// backdating ledger entries in date-range tests.
    pub fn at_noon(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(year, month, day)
            .expect("valid date")
            .and_time(NaiveTime::from_hms_opt(12, 0, 0).expect("valid time"))
            .and_utc()
    }
}
