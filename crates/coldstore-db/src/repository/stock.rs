//! # Stock Movement Repository
//!
//! The append-only stock ledger: every change of on-hand quantity is one
//! immutable row. Quantity-on-hand is always a fold over this ledger; no
//! table caches a stock count.
//!
//! ## The Ledger Fold
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  movement_type   contribution to quantity-on-hand                      │
//! │                                                                         │
//! │  received        +quantity   (positive magnitude)                      │
//! │  adjusted        +quantity   (quantity already carries its sign)       │
//! │  sold            -quantity   (positive magnitude)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## FIFO Bookkeeping
//! Incoming rows (`received`, and positive `adjusted` corrections) double as
//! FIFO cost batches: `remaining_quantity` starts equal to the incoming
//! quantity and is decremented as sales consume the batch. Outgoing rows
//! (`sold`, negative `adjusted`) drain the oldest batches in the same
//! transaction that inserts them, so the sum of `remaining_quantity` tracks
//! quantity-on-hand. The immutable `quantity` column is never touched.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult, StoreResult};
use coldstore_core::fifo::Batch;
use coldstore_core::validation::{
    validate_cost_cents, validate_movement_quantity, validate_notes,
};
use coldstore_core::{CoreError, Money, MovementType, StockMovement};

// =============================================================================
// Input Types
// =============================================================================

/// Input for recording a stock movement.
#[derive(Debug, Clone)]
pub struct NewMovement {
    pub product_id: String,
    pub movement_type: MovementType,

    /// Positive magnitude for received/sold; signed delta for adjusted.
    pub quantity: i64,

    /// Cost per unit in cents.
    pub unit_cost_cents: i64,

    /// Total cost in cents. Defaults to `unit_cost × |quantity|`.
    pub total_cost_cents: Option<i64>,

    pub supplier_id: Option<String>,
    pub notes: Option<String>,

    /// Ledger timestamp. Defaults to now; callers may backdate entries
    /// (e.g., when importing historical records).
    pub created_at: Option<DateTime<Utc>>,
}

impl NewMovement {
    /// Convenience constructor for a received batch.
    pub fn received(product_id: impl Into<String>, quantity: i64, unit_cost_cents: i64) -> Self {
        NewMovement {
            product_id: product_id.into(),
            movement_type: MovementType::Received,
            quantity,
            unit_cost_cents,
            total_cost_cents: None,
            supplier_id: None,
            notes: None,
            created_at: None,
        }
    }

    /// Convenience constructor for a signed adjustment.
    pub fn adjusted(product_id: impl Into<String>, quantity: i64, unit_cost_cents: i64) -> Self {
        NewMovement {
            product_id: product_id.into(),
            movement_type: MovementType::Adjusted,
            quantity,
            unit_cost_cents,
            total_cost_cents: None,
            supplier_id: None,
            notes: None,
            created_at: None,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for the stock movement ledger.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.movements();
///
/// let movement = repo.record(NewMovement::received("product-id", 20, 500)).await?;
/// let on_hand = repo.quantity_on_hand("product-id", None).await?;
/// ```
#[derive(Debug, Clone)]
pub struct StockMovementRepository {
    pool: SqlitePool,
}

impl StockMovementRepository {
    /// Creates a new StockMovementRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StockMovementRepository { pool }
    }

    /// Appends one movement to the ledger.
    ///
    /// ## Validation
    /// - `received` / `sold`: quantity must be a positive magnitude
    /// - `adjusted`: quantity must be a nonzero signed delta
    /// - `unit_cost` must be non-negative; notes are length-capped
    /// - The product must exist
    ///
    /// ## Side Effects
    /// Incoming rows become FIFO batches (`remaining_quantity = quantity`).
    /// Outgoing rows drain the oldest batches so FIFO state stays in step
    /// with the ledger fold. Rows are never rewritten.
    pub async fn record(&self, input: NewMovement) -> StoreResult<StockMovement> {
        validate_movement_quantity(input.movement_type, input.quantity)?;
        validate_cost_cents(input.unit_cost_cents)?;
        validate_notes(input.notes.as_deref())?;

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        ensure_product_exists(&mut tx, &input.product_id).await?;

        let total_cost = input
            .total_cost_cents
            .unwrap_or(input.unit_cost_cents * input.quantity.abs());

        // Incoming stock becomes a consumable FIFO batch.
        let incoming = input.movement_type.signed(input.quantity) > 0;
        let remaining = if incoming { input.quantity.abs() } else { 0 };

        let movement = StockMovement {
            id: Uuid::new_v4().to_string(),
            product_id: input.product_id.clone(),
            movement_type: input.movement_type,
            quantity: input.quantity,
            remaining_quantity: remaining,
            unit_cost_cents: input.unit_cost_cents,
            total_cost_cents: total_cost,
            supplier_id: input.supplier_id,
            sale_id: None,
            notes: input.notes,
            created_at: input.created_at.unwrap_or_else(Utc::now),
        };

        insert_movement(&mut tx, &movement).await?;

        if !incoming {
            let outgoing = input.movement_type.signed(input.quantity).abs();
            drain_batches(&mut tx, &input.product_id, outgoing).await?;
        }

        tx.commit().await.map_err(DbError::from)?;

        debug!(
            movement_id = %movement.id,
            product_id = %movement.product_id,
            quantity = movement.quantity,
            "Stock movement recorded"
        );

        Ok(movement)
    }

    /// Fetches a movement by id.
    pub async fn get_by_id(&self, id: &str) -> DbResult<StockMovement> {
        sqlx::query_as::<_, StockMovement>(
            r#"
            SELECT id, product_id, movement_type, quantity, remaining_quantity,
                   unit_cost_cents, total_cost_cents, supplier_id, sale_id,
                   notes, created_at
            FROM stock_movements
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("StockMovement", id))
    }

    /// Lists movements for a product, newest first.
    pub async fn list_for_product(
        &self,
        product_id: &str,
        limit: u32,
    ) -> DbResult<Vec<StockMovement>> {
        let movements = sqlx::query_as::<_, StockMovement>(
            r#"
            SELECT id, product_id, movement_type, quantity, remaining_quantity,
                   unit_cost_cents, total_cost_cents, supplier_id, sale_id,
                   notes, created_at
            FROM stock_movements
            WHERE product_id = ?
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(product_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// The canonical stock-on-hand fold: `+received +adjusted -sold` across
    /// all movements up to `as_of` (or all time).
    pub async fn quantity_on_hand(
        &self,
        product_id: &str,
        as_of: Option<DateTime<Utc>>,
    ) -> DbResult<i64> {
        let as_of = as_of.unwrap_or_else(Utc::now);

        let on_hand: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(
                CASE movement_type
                    WHEN 'sold' THEN -quantity
                    ELSE quantity
                END), 0)
            FROM stock_movements
            WHERE product_id = ? AND created_at <= ?
            "#,
        )
        .bind(product_id)
        .bind(as_of)
        .fetch_one(&self.pool)
        .await?;

        Ok(on_hand)
    }
}

// =============================================================================
// Transaction-Scoped Helpers
// =============================================================================
// The sale builder runs its sufficiency check, FIFO allocation and inserts
// inside one transaction; these helpers take the transaction's connection.

/// Errors with `ProductNotFound` if the product id is unknown.
pub(crate) async fn ensure_product_exists(
    conn: &mut SqliteConnection,
    product_id: &str,
) -> StoreResult<()> {
    let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM products WHERE id = ?")
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(DbError::from)?;

    if exists.is_none() {
        return Err(CoreError::ProductNotFound(product_id.to_string()).into());
    }
    Ok(())
}

/// Quantity available to sell.
///
/// Sales quantities are read from the sales ledger (completed SaleItems),
/// not from sale-linked `sold` movements, so availability stays correct
/// even for sales recorded without movement rows. Sale-linked movements
/// are excluded from the fold to avoid counting a sale twice; manual
/// (unlinked) movements count as usual.
pub(crate) async fn available_for_sale(
    conn: &mut SqliteConnection,
    product_id: &str,
) -> DbResult<i64> {
    let movement_net: i64 = sqlx::query_scalar(
        r#"
        SELECT COALESCE(SUM(
            CASE movement_type
                WHEN 'sold' THEN -quantity
                ELSE quantity
            END), 0)
        FROM stock_movements
        WHERE product_id = ? AND sale_id IS NULL
        "#,
    )
    .bind(product_id)
    .fetch_one(&mut *conn)
    .await?;

    let sold_via_sales: i64 = sqlx::query_scalar(
        r#"
        SELECT COALESCE(SUM(si.quantity), 0)
        FROM sale_items si
        JOIN sales s ON s.id = si.sale_id
        WHERE si.product_id = ? AND s.status = 'completed'
        "#,
    )
    .bind(product_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(movement_net - sold_via_sales)
}

/// Reads the unconsumed FIFO batches for a product, oldest first.
pub(crate) async fn fifo_batches(
    conn: &mut SqliteConnection,
    product_id: &str,
) -> DbResult<Vec<Batch>> {
    let rows: Vec<(String, i64, i64)> = sqlx::query_as(
        r#"
        SELECT id, remaining_quantity, unit_cost_cents
        FROM stock_movements
        WHERE product_id = ? AND remaining_quantity > 0
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(product_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(movement_id, remaining_quantity, unit_cost_cents)| Batch {
            movement_id,
            remaining_quantity,
            unit_cost: Money::from_cents(unit_cost_cents),
        })
        .collect())
}

/// Decrements a batch's `remaining_quantity` by the consumed amount.
///
/// The guard clause makes the decrement fail (zero rows affected) if the
/// batch no longer holds the expected quantity, which the caller must treat
/// as a consistency failure and abort its transaction.
pub(crate) async fn consume_batch(
    conn: &mut SqliteConnection,
    movement_id: &str,
    quantity: i64,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE stock_movements
        SET remaining_quantity = remaining_quantity - ?
        WHERE id = ? AND remaining_quantity >= ?
        "#,
    )
    .bind(quantity)
    .bind(movement_id)
    .bind(quantity)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() != 1 {
        return Err(DbError::Internal(format!(
            "FIFO batch {movement_id} no longer holds {quantity} units"
        )));
    }
    Ok(())
}

/// Inserts a ledger row as-is. The caller owns id generation and FIFO state.
pub(crate) async fn insert_movement(
    conn: &mut SqliteConnection,
    movement: &StockMovement,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO stock_movements
            (id, product_id, movement_type, quantity, remaining_quantity,
             unit_cost_cents, total_cost_cents, supplier_id, sale_id, notes, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&movement.id)
    .bind(&movement.product_id)
    .bind(movement.movement_type)
    .bind(movement.quantity)
    .bind(movement.remaining_quantity)
    .bind(movement.unit_cost_cents)
    .bind(movement.total_cost_cents)
    .bind(&movement.supplier_id)
    .bind(&movement.sale_id)
    .bind(&movement.notes)
    .bind(movement.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Drains up to `quantity` units from the oldest batches.
///
/// Used for outgoing movements recorded outside a sale (manual `sold`
/// entries, negative adjustments). Clamped: if the batches hold less than
/// requested, whatever is there is drained and the ledger fold carries the
/// rest as negative stock.
async fn drain_batches(
    conn: &mut SqliteConnection,
    product_id: &str,
    quantity: i64,
) -> DbResult<()> {
    let mut needed = quantity;
    let batches = fifo_batches(&mut *conn, product_id).await?;

    for batch in batches {
        if needed == 0 {
            break;
        }
        let take = batch.remaining_quantity.min(needed);
        consume_batch(&mut *conn, &batch.movement_id, take).await?;
        needed -= take;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;
    use coldstore_core::ValidationError;
    use crate::error::StoreError;

    #[tokio::test]
    async fn test_record_and_fold() {
        let db = testutil::test_db().await;
        let product = testutil::seed_product(&db, "Tilapia", 500, 800).await;
        let repo = db.movements();

        repo.record(NewMovement::received(&product.id, 20, 500))
            .await
            .unwrap();
        repo.record(NewMovement::adjusted(&product.id, -3, 500))
            .await
            .unwrap();

        let on_hand = repo.quantity_on_hand(&product.id, None).await.unwrap();
        assert_eq!(on_hand, 17);
    }

    #[tokio::test]
    async fn test_rejects_zero_adjustment_and_negative_receipt() {
        let db = testutil::test_db().await;
        let product = testutil::seed_product(&db, "Tilapia", 500, 800).await;
        let repo = db.movements();

        let err = repo
            .record(NewMovement::adjusted(&product.id, 0, 500))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Core(CoreError::Validation(ValidationError::MustBeNonZero { .. }))
        ));

        let err = repo
            .record(NewMovement::received(&product.id, -5, 500))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Core(CoreError::Validation(ValidationError::MustBePositive { .. }))
        ));
    }

    #[tokio::test]
    async fn test_unknown_product_rejected() {
        let db = testutil::test_db().await;
        let err = db
            .movements()
            .record(NewMovement::received("no-such-product", 5, 100))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Core(CoreError::ProductNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_total_cost_defaults_to_unit_cost_times_magnitude() {
        let db = testutil::test_db().await;
        let product = testutil::seed_product(&db, "Tilapia", 500, 800).await;

        let movement = db
            .movements()
            .record(NewMovement::adjusted(&product.id, -4, 250))
            .await
            .unwrap();
        assert_eq!(movement.total_cost_cents, 1000);
    }

    #[tokio::test]
    async fn test_negative_adjustment_drains_oldest_batch() {
        let db = testutil::test_db().await;
        let product = testutil::seed_product(&db, "Tilapia", 500, 800).await;
        let repo = db.movements();

        let first = repo
            .record(NewMovement::received(&product.id, 10, 200))
            .await
            .unwrap();
        repo.record(NewMovement::received(&product.id, 10, 300))
            .await
            .unwrap();
        repo.record(NewMovement::adjusted(&product.id, -6, 0))
            .await
            .unwrap();

        let refreshed = repo.get_by_id(&first.id).await.unwrap();
        assert_eq!(refreshed.remaining_quantity, 4);
        // The immutable quantity column is untouched
        assert_eq!(refreshed.quantity, 10);
    }

    #[tokio::test]
    async fn test_as_of_bounds_the_fold() {
        let db = testutil::test_db().await;
        let product = testutil::seed_product(&db, "Tilapia", 500, 800).await;
        let repo = db.movements();

        let day1 = testutil::at_noon(2026, 3, 1);
        let day3 = testutil::at_noon(2026, 3, 3);

        let mut early = NewMovement::received(&product.id, 20, 500);
        early.created_at = Some(day1);
        repo.record(early).await.unwrap();

        let mut late = NewMovement::received(&product.id, 5, 500);
        late.created_at = Some(day3);
        repo.record(late).await.unwrap();

        let mid = testutil::at_noon(2026, 3, 2);
        assert_eq!(
            repo.quantity_on_hand(&product.id, Some(mid)).await.unwrap(),
            20
        );
        assert_eq!(repo.quantity_on_hand(&product.id, None).await.unwrap(), 25);
    }
}
