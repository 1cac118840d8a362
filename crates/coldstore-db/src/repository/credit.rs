//! # Credit Collection Repository
//!
//! Outstanding debt and payments against it.
//!
//! ## Debt Is Always Derived
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  outstanding_debt(customer) =                                           │
//! │                                                                         │
//! │      Σ total            over completed credit sales                    │
//! │    + Σ (total − paid)   over completed partial sales                   │
//! │    − Σ amount_collected over the customer's collections                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! No balance column exists to drift out of step with the ledgers. A
//! collection larger than the remaining debt is rejected; the check and the
//! insert share the writer lock so two tellers cannot both collect the same
//! debt.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::error::{DbError, DbResult, StoreResult};
use coldstore_core::validation::{validate_collection_amount, validate_notes};
use coldstore_core::{CoreError, CreditCollection};

// =============================================================================
// Input & Row Types
// =============================================================================

/// Input for recording a collection against a customer's debt.
#[derive(Debug, Clone)]
pub struct NewCollection {
    pub customer_id: String,
    pub amount_cents: i64,
    pub notes: Option<String>,

    /// Collection timestamp. Defaults to now.
    pub created_at: Option<DateTime<Utc>>,
}

/// One customer's position in the debtors overview.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CustomerDebt {
    pub customer_id: String,
    pub customer_name: String,
    /// Gross debt ever incurred: credit totals plus the owed part of
    /// partial sales, completed sales only.
    pub total_debt_cents: i64,
    /// Everything collected so far.
    pub collected_cents: i64,
    /// `total_debt_cents - collected_cents`; what is still owed.
    pub balance_cents: i64,
    pub last_payment_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for credit collections and derived debt.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.credit();
///
/// let owed = repo.outstanding_debt("customer-id").await?;
/// let receipt = repo.record_collection(NewCollection { .. }).await?;
/// ```
#[derive(Debug, Clone)]
pub struct CreditRepository {
    pool: SqlitePool,
    write_lock: Arc<Mutex<()>>,
}

impl CreditRepository {
    /// Creates a new CreditRepository.
    pub fn new(pool: SqlitePool, write_lock: Arc<Mutex<()>>) -> Self {
        CreditRepository { pool, write_lock }
    }

    /// Derives a customer's outstanding debt from the ledgers.
    pub async fn outstanding_debt(&self, customer_id: &str) -> DbResult<i64> {
        debt_query(&self.pool, customer_id).await
    }

    /// Records a payment against a customer's debt.
    ///
    /// ## Validation
    /// - Amount must be positive
    /// - Amount must not exceed the remaining debt (over-collection rejected)
    /// - The customer must exist
    ///
    /// The row snapshots `debt_left_cents` immediately after this collection
    /// for the audit trail.
    pub async fn record_collection(&self, input: NewCollection) -> StoreResult<CreditCollection> {
        validate_notes(input.notes.as_deref())?;

        // Debt read and collection insert share the writer critical section.
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM customers WHERE id = ?")
            .bind(&input.customer_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(DbError::from)?;
        if exists.is_none() {
            return Err(CoreError::CustomerNotFound(input.customer_id).into());
        }

        let remaining = debt_query(&mut *tx, &input.customer_id).await?;
        validate_collection_amount(input.amount_cents, remaining)?;

        let collection = CreditCollection {
            id: Uuid::new_v4().to_string(),
            customer_id: input.customer_id,
            amount_collected_cents: input.amount_cents,
            debt_left_cents: remaining - input.amount_cents,
            notes: input.notes,
            created_at: input.created_at.unwrap_or_else(Utc::now),
        };

        sqlx::query(
            r#"
            INSERT INTO credit_collections
                (id, customer_id, amount_collected_cents, debt_left_cents, notes, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&collection.id)
        .bind(&collection.customer_id)
        .bind(collection.amount_collected_cents)
        .bind(collection.debt_left_cents)
        .bind(&collection.notes)
        .bind(collection.created_at)
        .execute(&mut *tx)
        .await
        .map_err(DbError::from)?;

        tx.commit().await.map_err(DbError::from)?;

        info!(
            customer_id = %collection.customer_id,
            amount_cents = collection.amount_collected_cents,
            debt_left_cents = collection.debt_left_cents,
            "Credit collection recorded"
        );

        Ok(collection)
    }

    /// Lists a customer's collections, newest first.
    pub async fn list_for_customer(&self, customer_id: &str) -> DbResult<Vec<CreditCollection>> {
        let collections = sqlx::query_as::<_, CreditCollection>(
            r#"
            SELECT id, customer_id, amount_collected_cents, debt_left_cents, notes, created_at
            FROM credit_collections
            WHERE customer_id = ?
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(collections)
    }

    /// Every customer with a positive balance, largest first.
    pub async fn outstanding_debts(&self) -> DbResult<Vec<CustomerDebt>> {
        let debts = sqlx::query_as::<_, CustomerDebt>(
            r#"
            SELECT customer_id, customer_name, total_debt_cents, collected_cents,
                   total_debt_cents - collected_cents AS balance_cents,
                   last_payment_at
            FROM (
                SELECT c.id AS customer_id,
                       c.name AS customer_name,
                       COALESCE((
                           SELECT SUM(CASE s.payment_type
                               WHEN 'credit' THEN s.total_cents
                               WHEN 'partial' THEN s.total_cents - s.amount_paid_cents
                               ELSE 0 END)
                           FROM sales s
                           WHERE s.customer_id = c.id AND s.status = 'completed'
                       ), 0) AS total_debt_cents,
                       COALESCE((
                           SELECT SUM(cc.amount_collected_cents)
                           FROM credit_collections cc
                           WHERE cc.customer_id = c.id
                       ), 0) AS collected_cents,
                       (
                           SELECT MAX(cc.created_at)
                           FROM credit_collections cc
                           WHERE cc.customer_id = c.id
                       ) AS last_payment_at
                FROM customers c
            )
            WHERE total_debt_cents - collected_cents > 0
            ORDER BY balance_cents DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(debts)
    }
}

/// The debt fold shared by `outstanding_debt` and `record_collection`.
async fn debt_query<'a, E>(executor: E, customer_id: &str) -> DbResult<i64>
where
    E: sqlx::Executor<'a, Database = sqlx::Sqlite>,
{
    let debt: i64 = sqlx::query_scalar(
        r#"
        SELECT COALESCE((
            SELECT SUM(CASE s.payment_type
                WHEN 'credit' THEN s.total_cents
                WHEN 'partial' THEN s.total_cents - s.amount_paid_cents
                ELSE 0 END)
            FROM sales s
            WHERE s.customer_id = ? AND s.status = 'completed'
        ), 0)
      - COALESCE((
            SELECT SUM(cc.amount_collected_cents)
            FROM credit_collections cc
            WHERE cc.customer_id = ?
        ), 0)
        "#,
    )
    .bind(customer_id)
    .bind(customer_id)
    .fetch_one(executor)
    .await?;

    Ok(debt)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::repository::sale::{CreateSale, SaleLine};
    use crate::repository::stock::NewMovement;
    use crate::testutil;
    use coldstore_core::{PaymentType, ValidationError};

    async fn seed_debt(db: &crate::pool::Database) -> (String, String) {
        let product = testutil::seed_product(db, "Tilapia", 500, 1000).await;
        let customer = testutil::seed_customer(db, "Ama Serwaa").await;
        db.movements()
            .record(NewMovement::received(&product.id, 50, 500))
            .await
            .unwrap();

        // credit 30.00 + partial owing 20.00 = 50.00 total debt
        db.sales()
            .create_sale(CreateSale {
                customer_id: Some(customer.id.clone()),
                customer_name: None,
                items: vec![SaleLine {
                    product_id: product.id.clone(),
                    quantity: 3,
                    unit_price_cents: 1000,
                }],
                payment_type: PaymentType::Credit,
                amount_paid_cents: 0,
                actor_id: "user-1".to_string(),
                created_at: None,
            })
            .await
            .unwrap();
        db.sales()
            .create_sale(CreateSale {
                customer_id: Some(customer.id.clone()),
                customer_name: None,
                items: vec![SaleLine {
                    product_id: product.id.clone(),
                    quantity: 5,
                    unit_price_cents: 1000,
                }],
                payment_type: PaymentType::Partial,
                amount_paid_cents: 3000,
                actor_id: "user-1".to_string(),
                created_at: None,
            })
            .await
            .unwrap();

        (customer.id, product.id)
    }

    #[tokio::test]
    async fn test_debt_folds_credit_and_partial() {
        let db = testutil::test_db().await;
        let (customer_id, _) = seed_debt(&db).await;

        assert_eq!(db.credit().outstanding_debt(&customer_id).await.unwrap(), 5000);
    }

    #[tokio::test]
    async fn test_collection_reduces_debt_and_snapshots() {
        let db = testutil::test_db().await;
        let (customer_id, _) = seed_debt(&db).await;
        let repo = db.credit();

        let receipt = repo
            .record_collection(NewCollection {
                customer_id: customer_id.clone(),
                amount_cents: 2000,
                notes: Some("first installment".to_string()),
                created_at: None,
            })
            .await
            .unwrap();

        assert_eq!(receipt.debt_left_cents, 3000);
        assert_eq!(repo.outstanding_debt(&customer_id).await.unwrap(), 3000);
    }

    #[tokio::test]
    async fn test_over_collection_rejected() {
        let db = testutil::test_db().await;
        let (customer_id, _) = seed_debt(&db).await;

        // owes 50.00; collecting 60.00 must fail
        let err = db
            .credit()
            .record_collection(NewCollection {
                customer_id: customer_id.clone(),
                amount_cents: 6000,
                notes: None,
                created_at: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Core(CoreError::Validation(ValidationError::OverCollection {
                requested: 6000,
                remaining: 5000,
            }))
        ));

        // Nothing was written
        assert!(db
            .credit()
            .list_for_customer(&customer_id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_unknown_customer_rejected() {
        let db = testutil::test_db().await;
        let err = db
            .credit()
            .record_collection(NewCollection {
                customer_id: "no-such-customer".to_string(),
                amount_cents: 100,
                notes: None,
                created_at: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Core(CoreError::CustomerNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_outstanding_debts_overview() {
        let db = testutil::test_db().await;
        let (customer_id, _) = seed_debt(&db).await;
        // A second customer with no debt stays out of the list
        testutil::seed_customer(&db, "Kofi Mensah").await;

        db.credit()
            .record_collection(NewCollection {
                customer_id: customer_id.clone(),
                amount_cents: 1000,
                notes: None,
                created_at: None,
            })
            .await
            .unwrap();

        let debts = db.credit().outstanding_debts().await.unwrap();
        assert_eq!(debts.len(), 1);
        assert_eq!(debts[0].customer_id, customer_id);
        assert_eq!(debts[0].total_debt_cents, 5000);
        assert_eq!(debts[0].collected_cents, 1000);
        assert_eq!(debts[0].balance_cents, 4000);
        assert!(debts[0].last_payment_at.is_some());
    }

    #[tokio::test]
    async fn test_cancelled_sales_do_not_count_as_debt() {
        let db = testutil::test_db().await;
        let (customer_id, _) = seed_debt(&db).await;

        // Cancel the credit sale; only the partial remainder is owed
        let sales = db
            .sales()
            .list_in_range(testutil::at_noon(2000, 1, 1), Utc::now())
            .await
            .unwrap();
        let credit_sale = sales
            .iter()
            .find(|s| s.sale.payment_type == PaymentType::Credit)
            .unwrap();
        db.sales()
            .cancel_sale(&credit_sale.sale.transaction_id)
            .await
            .unwrap();

        assert_eq!(db.credit().outstanding_debt(&customer_id).await.unwrap(), 2000);
    }
}
