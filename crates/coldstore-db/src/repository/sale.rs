//! # Sale Repository & Transaction Builder
//!
//! The sales ledger plus the atomic sale builder: validate a proposed sale,
//! allocate FIFO cost per line, and commit the Sale, its SaleItems and the
//! matching `sold` stock movements in one transaction.
//!
//! ## Commit Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     create_sale (one transaction)                       │
//! │                                                                         │
//! │  1. Validate input: customer identity, line count, quantities,         │
//! │     payment-type invariant against the summed line totals              │
//! │  2. Acquire writer lock, BEGIN                                         │
//! │  3. Sufficiency check for EVERY line (aggregated per product)          │
//! │     └── any line short ⇒ reject whole sale, nothing committed          │
//! │  4. Per line: FIFO-allocate cost, decrement batch remaining_quantity   │
//! │  5. INSERT sale, sale_items, sold movements                            │
//! │  6. COMMIT (or roll back everything on any error)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Steps 3-5 must share one critical section: two concurrent sales checking
//! sufficiency against stale reads would both pass and oversell.
//!
//! ## Cancellation
//! `cancel_sale` is a soft cancel: the sale flips to `cancelled` and every
//! ledger row stays for audit. Stock is restored by appending compensating
//! `received` movements at the exact FIFO cost each line consumed, which
//! become ordinary batches for later sales. FIFO history already consumed
//! by other sales is never rewritten.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult, StoreResult};
use crate::repository::stock;
use coldstore_core::fifo;
use coldstore_core::validation::{
    validate_cost_cents, validate_customer_identity, validate_line_quantity, validate_sale_lines,
};
use coldstore_core::{
    CoreError, Money, MovementType, PaymentType, Sale, SaleItem, SaleStatus, StockMovement,
};

// =============================================================================
// Input Types
// =============================================================================

/// One proposed line of a sale.
#[derive(Debug, Clone)]
pub struct SaleLine {
    pub product_id: String,
    pub quantity: i64,
    /// Selling price per unit in cents.
    pub unit_price_cents: i64,
}

/// Input for building a sale.
///
/// Either `customer_id` (registered customer) or a non-empty free-text
/// `customer_name` must be supplied.
#[derive(Debug, Clone)]
pub struct CreateSale {
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    pub items: Vec<SaleLine>,
    pub payment_type: PaymentType,
    pub amount_paid_cents: i64,

    /// Who records the sale. Threaded in explicitly; the engine carries no
    /// ambient current-user context.
    pub actor_id: String,

    /// Sale timestamp. Defaults to now; callers may backdate (imports).
    pub created_at: Option<DateTime<Utc>>,
}

/// A sale together with its line items.
#[derive(Debug, Clone)]
pub struct SaleWithItems {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

impl SaleWithItems {
    /// Total profit over FIFO cost across all lines.
    pub fn profit_cents(&self) -> i64 {
        self.items.iter().map(|i| i.profit_cents()).sum()
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for the sales ledger and the sale transaction builder.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.sales();
///
/// let sale = repo.create_sale(input).await?;
/// let full = repo.get_by_transaction_id(&sale.transaction_id).await?;
/// repo.cancel_sale(&sale.transaction_id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
    write_lock: Arc<Mutex<()>>,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool, write_lock: Arc<Mutex<()>>) -> Self {
        SaleRepository { pool, write_lock }
    }

    /// Builds and commits a sale atomically.
    ///
    /// ## Preconditions (each a hard reject, nothing committed)
    /// 1. A customer identity is supplied
    /// 2. Every referenced product exists and has sufficient stock,
    ///    aggregated across lines that share a product
    /// 3. The amount paid satisfies the payment-type invariant against
    ///    the summed line totals
    ///
    /// ## Effects (all or none)
    /// - One `sales` row (status `completed`)
    /// - One `sale_items` row per line, snapshotting product name and the
    ///   FIFO unit cost
    /// - One `sold` stock movement per line at the allocated cost
    /// - Decremented `remaining_quantity` on every consumed batch
    pub async fn create_sale(&self, input: CreateSale) -> StoreResult<SaleWithItems> {
        validate_customer_identity(
            input.customer_id.as_deref(),
            input.customer_name.as_deref(),
        )?;
        validate_sale_lines(input.items.len())?;
        for line in &input.items {
            validate_line_quantity(line.quantity)?;
            validate_cost_cents(line.unit_price_cents)?;
        }

        let subtotal_cents: i64 = input
            .items
            .iter()
            .map(|l| l.quantity * l.unit_price_cents)
            .sum();
        let total_cents = subtotal_cents; // tax is always zero here
        input.payment_type.validate_amount(
            Money::from_cents(input.amount_paid_cents),
            Money::from_cents(total_cents),
        )?;

        // Sufficiency check, FIFO allocation and the inserts share one
        // critical section; see module docs.
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        if let Some(customer_id) = input.customer_id.as_deref() {
            ensure_customer_exists(&mut tx, customer_id).await?;
        }

        // Sufficiency for every line before any write, aggregated per
        // product so two lines for the same product cannot each pass alone.
        let mut requested_per_product: BTreeMap<&str, i64> = BTreeMap::new();
        for line in &input.items {
            *requested_per_product
                .entry(line.product_id.as_str())
                .or_insert(0) += line.quantity;
        }
        let mut product_names: BTreeMap<String, String> = BTreeMap::new();
        for (product_id, requested) in &requested_per_product {
            let name = product_name(&mut tx, product_id).await?;
            let available = stock::available_for_sale(&mut tx, product_id).await?;
            if available < *requested {
                warn!(
                    product = %name,
                    available,
                    requested = *requested,
                    "Sale rejected: insufficient stock"
                );
                return Err(CoreError::InsufficientStock {
                    product: name,
                    available,
                    requested: *requested,
                }
                .into());
            }
            product_names.insert((*product_id).to_string(), name);
        }

        let now = input.created_at.unwrap_or_else(Utc::now);
        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            transaction_id: generate_transaction_id(now),
            customer_id: input.customer_id,
            customer_name: input.customer_name,
            subtotal_cents,
            tax_cents: 0,
            total_cents,
            payment_type: input.payment_type,
            status: SaleStatus::Completed,
            amount_paid_cents: input.amount_paid_cents,
            actor_id: input.actor_id,
            created_at: now,
        };
        insert_sale(&mut tx, &sale).await?;

        let mut items = Vec::with_capacity(input.items.len());
        for line in &input.items {
            let name = product_names
                .get(&line.product_id)
                .cloned()
                .unwrap_or_default();

            // The sufficiency check passed, so a shortfall here means a
            // race or corrupted bookkeeping; the whole transaction aborts.
            let batches = stock::fifo_batches(&mut tx, &line.product_id).await?;
            let allocation = fifo::allocate(&name, &batches, line.quantity)?;
            for consumption in &allocation.consumed {
                stock::consume_batch(&mut tx, &consumption.movement_id, consumption.quantity)
                    .await?;
            }

            let item = SaleItem {
                id: Uuid::new_v4().to_string(),
                sale_id: sale.id.clone(),
                product_id: line.product_id.clone(),
                product_name: name,
                quantity: line.quantity,
                unit_price_cents: line.unit_price_cents,
                unit_cost_cents: allocation.unit_cost.cents(),
                total_cents: line.quantity * line.unit_price_cents,
                created_at: now,
            };
            insert_sale_item(&mut tx, &item).await?;

            let movement = StockMovement {
                id: Uuid::new_v4().to_string(),
                product_id: line.product_id.clone(),
                movement_type: MovementType::Sold,
                quantity: line.quantity,
                remaining_quantity: 0,
                unit_cost_cents: allocation.unit_cost.cents(),
                total_cost_cents: allocation.total_cost.cents(),
                supplier_id: None,
                sale_id: Some(sale.id.clone()),
                notes: None,
                created_at: now,
            };
            stock::insert_movement(&mut tx, &movement).await?;

            items.push(item);
        }

        tx.commit().await.map_err(DbError::from)?;

        info!(
            transaction_id = %sale.transaction_id,
            total_cents = sale.total_cents,
            lines = items.len(),
            "Sale committed"
        );

        Ok(SaleWithItems { sale, items })
    }

    /// Cancels a completed sale.
    ///
    /// Flips status to `cancelled` (ledger rows stay for audit) and appends
    /// one compensating `received` movement per line, restoring the exact
    /// quantity at the FIFO cost the line consumed. The restored stock is an
    /// ordinary batch for later sales.
    ///
    /// ## Errors
    /// - `NotFound` if no sale has this transaction id
    /// - `InvalidSaleStatus` if the sale is not `completed`
    pub async fn cancel_sale(&self, transaction_id: &str) -> StoreResult<Sale> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let mut sale = fetch_sale_tx(&mut tx, transaction_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(transaction_id.to_string()))?;

        if sale.status != SaleStatus::Completed {
            let current = match sale.status {
                SaleStatus::Pending => "pending",
                SaleStatus::Cancelled => "cancelled",
                SaleStatus::Completed => unreachable!(),
            };
            return Err(CoreError::InvalidSaleStatus {
                transaction_id: transaction_id.to_string(),
                current_status: current.to_string(),
            }
            .into());
        }

        sqlx::query("UPDATE sales SET status = 'cancelled' WHERE id = ?")
            .bind(&sale.id)
            .execute(&mut *tx)
            .await
            .map_err(DbError::from)?;

        let items = fetch_items_tx(&mut tx, &sale.id).await?;
        let now = Utc::now();
        for item in &items {
            let movement = StockMovement {
                id: Uuid::new_v4().to_string(),
                product_id: item.product_id.clone(),
                movement_type: MovementType::Received,
                quantity: item.quantity,
                remaining_quantity: item.quantity,
                unit_cost_cents: item.unit_cost_cents,
                total_cost_cents: item.unit_cost_cents * item.quantity,
                supplier_id: None,
                sale_id: Some(sale.id.clone()),
                notes: Some(format!("reversal of {transaction_id}")),
                created_at: now,
            };
            stock::insert_movement(&mut tx, &movement).await?;
        }

        tx.commit().await.map_err(DbError::from)?;

        sale.status = SaleStatus::Cancelled;
        info!(transaction_id = %transaction_id, "Sale cancelled, stock restored");
        Ok(sale)
    }

    /// Fetches a sale and its line items by transaction id.
    pub async fn get_by_transaction_id(&self, transaction_id: &str) -> StoreResult<SaleWithItems> {
        let mut conn = self.pool.acquire().await.map_err(DbError::from)?;

        let sale = fetch_sale_tx(&mut conn, transaction_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(transaction_id.to_string()))?;
        let items = fetch_items_tx(&mut conn, &sale.id).await?;

        Ok(SaleWithItems { sale, items })
    }

    /// Lists sales in a created-at range, newest first, with their items.
    pub async fn list_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<Vec<SaleWithItems>> {
        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, transaction_id, customer_id, customer_name, subtotal_cents,
                   tax_cents, total_cents, payment_type, status, amount_paid_cents,
                   actor_id, created_at
            FROM sales
            WHERE created_at >= ? AND created_at <= ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        let mut conn = self.pool.acquire().await?;
        let mut out = Vec::with_capacity(sales.len());
        for sale in sales {
            let items = fetch_items_tx(&mut conn, &sale.id).await?;
            out.push(SaleWithItems { sale, items });
        }
        Ok(out)
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Generates a human-readable transaction id: `TXN-YYYYMMDD-XXXXXX`.
///
/// The suffix comes from a fresh UUID, so ids stay unique even when many
/// sales land on the same day. The `sales.transaction_id` UNIQUE constraint
/// backstops this.
fn generate_transaction_id(at: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "TXN-{}-{}",
        at.format("%Y%m%d"),
        &suffix[..6].to_uppercase()
    )
}

async fn ensure_customer_exists(
    conn: &mut SqliteConnection,
    customer_id: &str,
) -> StoreResult<()> {
    let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM customers WHERE id = ?")
        .bind(customer_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(DbError::from)?;

    if exists.is_none() {
        return Err(CoreError::CustomerNotFound(customer_id.to_string()).into());
    }
    Ok(())
}

async fn product_name(conn: &mut SqliteConnection, product_id: &str) -> StoreResult<String> {
    let name: Option<String> = sqlx::query_scalar("SELECT name FROM products WHERE id = ?")
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(DbError::from)?;

    name.ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()).into())
}

async fn insert_sale(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sales
            (id, transaction_id, customer_id, customer_name, subtotal_cents,
             tax_cents, total_cents, payment_type, status, amount_paid_cents,
             actor_id, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.transaction_id)
    .bind(&sale.customer_id)
    .bind(&sale.customer_name)
    .bind(sale.subtotal_cents)
    .bind(sale.tax_cents)
    .bind(sale.total_cents)
    .bind(sale.payment_type)
    .bind(sale.status)
    .bind(sale.amount_paid_cents)
    .bind(&sale.actor_id)
    .bind(sale.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn insert_sale_item(conn: &mut SqliteConnection, item: &SaleItem) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sale_items
            (id, sale_id, product_id, product_name, quantity,
             unit_price_cents, unit_cost_cents, total_cents, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&item.id)
    .bind(&item.sale_id)
    .bind(&item.product_id)
    .bind(&item.product_name)
    .bind(item.quantity)
    .bind(item.unit_price_cents)
    .bind(item.unit_cost_cents)
    .bind(item.total_cents)
    .bind(item.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn fetch_sale_tx(
    conn: &mut SqliteConnection,
    transaction_id: &str,
) -> DbResult<Option<Sale>> {
    let sale = sqlx::query_as::<_, Sale>(
        r#"
        SELECT id, transaction_id, customer_id, customer_name, subtotal_cents,
               tax_cents, total_cents, payment_type, status, amount_paid_cents,
               actor_id, created_at
        FROM sales
        WHERE transaction_id = ?
        "#,
    )
    .bind(transaction_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(sale)
}

async fn fetch_items_tx(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<Vec<SaleItem>> {
    let items = sqlx::query_as::<_, SaleItem>(
        r#"
        SELECT id, sale_id, product_id, product_name, quantity,
               unit_price_cents, unit_cost_cents, total_cents, created_at
        FROM sale_items
        WHERE sale_id = ?
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(sale_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(items)
}

// =============================================================================
// Unit Tests
// =============================================================================
