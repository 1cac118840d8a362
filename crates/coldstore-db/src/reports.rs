//! # Reporting Aggregator
//!
//! Read-only projections over the stock and sales ledgers. Nothing here
//! writes; running any report twice with no intervening writes returns
//! identical results.
//!
//! ## Date Handling
//! Report ranges are calendar days. Each `NaiveDate` pair is widened to
//! `[day-start(start), day-start(end + 1))` in UTC before querying, so a
//! movement at 23:59 on the end date is inside the range. A reversed range
//! is swapped, not rejected; reports are diagnostic, not transactional.
//!
//! ## Cost Sources
//! Two cost sources exist and each report uses exactly one:
//! - `profit_analysis` uses the product's **current catalog default cost**,
//!   a deliberate simplification for catalog-level margin estimation.
//! - Per-sale profit (see `SaleWithItems::profit_cents`) uses the **FIFO
//!   cost frozen on each SaleItem**.
//! Mixing both inside one report is the bug to avoid.

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use coldstore_core::{PaymentType, DEFAULT_LOW_STOCK_THRESHOLD};

// =============================================================================
// Report Types
// =============================================================================

/// Stock activity for one product over a date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivitySummary {
    /// Ledger fold strictly before the range.
    pub previous_stock: i64,
    pub received_in_range: i64,
    pub adjusted_in_range: i64,
    /// `previous_stock + received_in_range + adjusted_in_range`.
    pub total_available: i64,
    pub cash_sales_qty: i64,
    pub credit_sales_qty: i64,
    pub partial_sales_qty: i64,
    pub total_sales_qty: i64,
    /// `total_available - total_sales_qty`.
    pub remaining_stock: i64,
}

/// One sale row in the daily sales report.
#[derive(Debug, Clone, Serialize)]
pub struct SaleEntry {
    pub transaction_id: String,
    pub customer: String,
    /// Meaning depends on the list: paid amount in `cash_sales`, owed
    /// amount in `credit_sales`.
    pub amount_cents: i64,
    pub payment_type: PaymentType,
    pub created_at: DateTime<Utc>,
}

/// Per-product quantity and revenue within one payment-type group.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductBreakdown {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub revenue_cents: i64,
}

/// Money totals for the reporting period.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportTotals {
    /// Cash in the drawer: amounts actually paid (cash + partial).
    pub cash_collected_cents: i64,
    /// New debt created: credit totals + the owed part of partial sales.
    pub credit_outstanding_cents: i64,
    /// Gross sales value across all payment types.
    pub total_sales_cents: i64,
    pub sales_count: i64,
}

/// The daily sales report: who paid what, who owes what, and per-product
/// breakdowns split by payment type. Completed sales only.
#[derive(Debug, Clone, Serialize)]
pub struct DailySalesReport {
    /// One row per sale that put money in the drawer (cash and partial);
    /// the amount shown is what was actually paid.
    pub cash_sales: Vec<SaleEntry>,
    /// One row per credit sale (full total owed) plus one row per partial
    /// sale carrying the still-owed remainder.
    pub credit_sales: Vec<SaleEntry>,
    pub products_bought: Vec<ProductBreakdown>,
    pub credited_products: Vec<ProductBreakdown>,
    pub partial_products: Vec<ProductBreakdown>,
    pub totals: ReportTotals,
}

/// Per-product margin row in the profit analysis.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductProfit {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub revenue_cents: i64,
    /// `quantity × product.default_cost_cents` (catalog cost, not FIFO).
    pub cost_cents: i64,
    pub profit_cents: i64,
}

/// Catalog-cost margin estimation over a date range.
#[derive(Debug, Clone, Serialize)]
pub struct ProfitReport {
    /// All payment types.
    pub total_product_sales: Vec<ProductProfit>,
    /// Cash sales only: margin already realized.
    pub paid_product_sales: Vec<ProductProfit>,
}

/// A product at or below the low-stock threshold.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LowStockProduct {
    pub product_id: String,
    pub product_name: String,
    pub quantity_on_hand: i64,
}

/// The dashboard overview: today's trade plus standing alerts.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub today_sales_count: i64,
    pub today_revenue_cents: i64,
    pub today_cash_collected_cents: i64,
    /// Month-to-date profit over the FIFO cost frozen on each sale line.
    pub month_profit_cents: i64,
    pub outstanding_debt_cents: i64,
    pub low_stock_count: i64,
    pub active_products: i64,
    pub active_customers: i64,
    /// The five most recent completed sales, full totals.
    pub recent_sales: Vec<SaleEntry>,
}

// =============================================================================
// Reports Handle
// =============================================================================

/// Read-only reporting over the ledgers.
///
/// ## Usage
/// ```rust,ignore
/// let reports = db.reports().with_low_stock_threshold(5);
///
/// let summary = reports.activity_summary(&product_id, start, end).await?;
/// let daily = reports.daily_sales_report(start, end).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Reports {
    pool: SqlitePool,
    low_stock_threshold: i64,
}

impl Reports {
    /// Creates a reporting handle with the default low-stock threshold.
    pub fn new(pool: SqlitePool) -> Self {
        Reports {
            pool,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
        }
    }

    /// Overrides the low-stock threshold (units on hand at or below which a
    /// product is flagged). Deployment configuration, not a law.
    pub fn with_low_stock_threshold(mut self, threshold: i64) -> Self {
        self.low_stock_threshold = threshold;
        self
    }

    /// Stock activity for one product over a calendar-day range.
    ///
    /// Sales quantities are read from the sales ledger (completed SaleItems
    /// split by payment type), never from `sold` movements, so the summary
    /// stays correct for sales recorded without movement rows. Sale-linked
    /// movement rows are excluded from the in-range incoming sums for the
    /// same reason.
    pub async fn activity_summary(
        &self,
        product_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> DbResult<ActivitySummary> {
        let (range_start, range_end) = day_range(start, end);
        debug!(product_id, %range_start, %range_end, "Computing activity summary");

        let previous_stock: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(
                CASE movement_type WHEN 'sold' THEN -quantity ELSE quantity END), 0)
            FROM stock_movements
            WHERE product_id = ? AND created_at < ?
            "#,
        )
        .bind(product_id)
        .bind(range_start)
        .fetch_one(&self.pool)
        .await?;

        let (received_in_range, adjusted_in_range): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN movement_type = 'received' THEN quantity ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN movement_type = 'adjusted' THEN quantity ELSE 0 END), 0)
            FROM stock_movements
            WHERE product_id = ? AND sale_id IS NULL
              AND created_at >= ? AND created_at < ?
            "#,
        )
        .bind(product_id)
        .bind(range_start)
        .bind(range_end)
        .fetch_one(&self.pool)
        .await?;

        let (cash_sales_qty, credit_sales_qty, partial_sales_qty): (i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT
                    COALESCE(SUM(CASE WHEN s.payment_type = 'cash' THEN si.quantity ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN s.payment_type = 'credit' THEN si.quantity ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN s.payment_type = 'partial' THEN si.quantity ELSE 0 END), 0)
                FROM sale_items si
                JOIN sales s ON s.id = si.sale_id
                WHERE si.product_id = ? AND s.status = 'completed'
                  AND s.created_at >= ? AND s.created_at < ?
                "#,
            )
            .bind(product_id)
            .bind(range_start)
            .bind(range_end)
            .fetch_one(&self.pool)
            .await?;

        let total_available = previous_stock + received_in_range + adjusted_in_range;
        let total_sales_qty = cash_sales_qty + credit_sales_qty + partial_sales_qty;

        Ok(ActivitySummary {
            previous_stock,
            received_in_range,
            adjusted_in_range,
            total_available,
            cash_sales_qty,
            credit_sales_qty,
            partial_sales_qty,
            total_sales_qty,
            remaining_stock: total_available - total_sales_qty,
        })
    }

    /// The daily sales report for a calendar-day range.
    pub async fn daily_sales_report(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> DbResult<DailySalesReport> {
        let (range_start, range_end) = day_range(start, end);

        let sales: Vec<SaleReportRow> = sqlx::query_as(
            r#"
            SELECT s.transaction_id,
                   COALESCE(c.name, s.customer_name, 'Walk-in') AS customer,
                   s.payment_type,
                   s.total_cents,
                   s.amount_paid_cents,
                   s.created_at
            FROM sales s
            LEFT JOIN customers c ON c.id = s.customer_id
            WHERE s.status = 'completed'
              AND s.created_at >= ? AND s.created_at < ?
            ORDER BY s.created_at ASC
            "#,
        )
        .bind(range_start)
        .bind(range_end)
        .fetch_all(&self.pool)
        .await?;

        let mut cash_sales = Vec::new();
        let mut credit_sales = Vec::new();
        let mut totals = ReportTotals::default();

        for row in &sales {
            totals.sales_count += 1;
            totals.total_sales_cents += row.total_cents;

            match row.payment_type {
                PaymentType::Cash => {
                    totals.cash_collected_cents += row.amount_paid_cents;
                    cash_sales.push(row.entry(row.amount_paid_cents));
                }
                PaymentType::Credit => {
                    totals.credit_outstanding_cents += row.total_cents;
                    credit_sales.push(row.entry(row.total_cents));
                }
                PaymentType::Partial => {
                    // The paid portion counts as cash in the drawer; the
                    // owed remainder is appended to the credit list.
                    let owed = row.total_cents - row.amount_paid_cents;
                    totals.cash_collected_cents += row.amount_paid_cents;
                    totals.credit_outstanding_cents += owed;
                    cash_sales.push(row.entry(row.amount_paid_cents));
                    credit_sales.push(row.entry(owed));
                }
            }
        }

        let products_bought = self
            .product_breakdown(PaymentType::Cash, range_start, range_end)
            .await?;
        let credited_products = self
            .product_breakdown(PaymentType::Credit, range_start, range_end)
            .await?;
        let partial_products = self
            .product_breakdown(PaymentType::Partial, range_start, range_end)
            .await?;

        Ok(DailySalesReport {
            cash_sales,
            credit_sales,
            products_bought,
            credited_products,
            partial_products,
            totals,
        })
    }

    /// Catalog-cost margin estimation, optionally bounded by a date range.
    ///
    /// `None` bounds mean all time. Profit here is
    /// `Σ(line total) − Σ(quantity × product.default_cost_cents)`; the
    /// FIFO-accurate margin lives on each SaleItem and is reported per sale,
    /// not here.
    pub async fn profit_analysis(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> DbResult<ProfitReport> {
        let (range_start, range_end) = open_day_range(start, end);

        let total_product_sales = self
            .profit_rows(None, range_start, range_end)
            .await?;
        let paid_product_sales = self
            .profit_rows(Some(PaymentType::Cash), range_start, range_end)
            .await?;

        Ok(ProfitReport {
            total_product_sales,
            paid_product_sales,
        })
    }

    /// Active products whose on-hand quantity is at or below the threshold.
    pub async fn low_stock_products(&self) -> DbResult<Vec<LowStockProduct>> {
        let products = sqlx::query_as::<_, LowStockProduct>(
            r#"
            SELECT product_id, product_name, quantity_on_hand FROM (
                SELECT p.id AS product_id,
                       p.name AS product_name,
                       COALESCE((
                           SELECT SUM(CASE m.movement_type
                               WHEN 'sold' THEN -m.quantity ELSE m.quantity END)
                           FROM stock_movements m
                           WHERE m.product_id = p.id AND m.sale_id IS NULL
                       ), 0)
                     - COALESCE((
                           SELECT SUM(si.quantity)
                           FROM sale_items si
                           JOIN sales s ON s.id = si.sale_id
                           WHERE si.product_id = p.id AND s.status = 'completed'
                       ), 0) AS quantity_on_hand
                FROM products p
                WHERE p.is_active = 1
            )
            WHERE quantity_on_hand <= ?
            ORDER BY quantity_on_hand ASC
            "#,
        )
        .bind(self.low_stock_threshold)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// The dashboard overview for today.
    pub async fn dashboard_summary(&self) -> DbResult<DashboardSummary> {
        let today = Utc::now().date_naive();
        let (day_start, day_end) = day_range(today, today);

        let (today_sales_count, today_revenue_cents, today_cash_collected_cents): (i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT COUNT(*),
                       COALESCE(SUM(total_cents), 0),
                       COALESCE(SUM(amount_paid_cents), 0)
                FROM sales
                WHERE status = 'completed' AND created_at >= ? AND created_at < ?
                "#,
            )
            .bind(day_start)
            .bind(day_end)
            .fetch_one(&self.pool)
            .await?;

        let outstanding_debt_cents: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE((
                SELECT SUM(CASE payment_type
                    WHEN 'credit' THEN total_cents
                    WHEN 'partial' THEN total_cents - amount_paid_cents
                    ELSE 0 END)
                FROM sales WHERE status = 'completed'
            ), 0)
          - COALESCE((SELECT SUM(amount_collected_cents) FROM credit_collections), 0)
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let month_start = today.with_day(1).unwrap_or(today);
        let month_profit_cents: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(si.quantity * (si.unit_price_cents - si.unit_cost_cents)), 0)
            FROM sale_items si
            JOIN sales s ON s.id = si.sale_id
            WHERE s.status = 'completed' AND s.created_at >= ? AND s.created_at < ?
            "#,
        )
        .bind(month_start.and_time(NaiveTime::MIN).and_utc())
        .bind(day_end)
        .fetch_one(&self.pool)
        .await?;

        let recent_rows: Vec<SaleReportRow> = sqlx::query_as(
            r#"
            SELECT s.transaction_id,
                   COALESCE(c.name, s.customer_name, 'Walk-in') AS customer,
                   s.payment_type,
                   s.total_cents,
                   s.amount_paid_cents,
                   s.created_at
            FROM sales s
            LEFT JOIN customers c ON c.id = s.customer_id
            WHERE s.status = 'completed'
            ORDER BY s.created_at DESC
            LIMIT 5
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        let recent_sales = recent_rows.iter().map(|r| r.entry(r.total_cents)).collect();

        let low_stock_count = self.low_stock_products().await?.len() as i64;

        let active_products: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
                .fetch_one(&self.pool)
                .await?;
        let active_customers: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM customers WHERE is_active = 1")
                .fetch_one(&self.pool)
                .await?;

        Ok(DashboardSummary {
            today_sales_count,
            today_revenue_cents,
            today_cash_collected_cents,
            month_profit_cents,
            outstanding_debt_cents,
            low_stock_count,
            active_products,
            active_customers,
            recent_sales,
        })
    }

    async fn product_breakdown(
        &self,
        payment_type: PaymentType,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> DbResult<Vec<ProductBreakdown>> {
        let rows = sqlx::query_as::<_, ProductBreakdown>(
            r#"
            SELECT si.product_id,
                   si.product_name,
                   SUM(si.quantity) AS quantity,
                   SUM(si.total_cents) AS revenue_cents
            FROM sale_items si
            JOIN sales s ON s.id = si.sale_id
            WHERE s.status = 'completed'
              AND s.payment_type = ?
              AND s.created_at >= ? AND s.created_at < ?
            GROUP BY si.product_id, si.product_name
            ORDER BY revenue_cents DESC
            "#,
        )
        .bind(payment_type)
        .bind(range_start)
        .bind(range_end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn profit_rows(
        &self,
        payment_type: Option<PaymentType>,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> DbResult<Vec<ProductProfit>> {
        // Catalog default cost on purpose; see module docs.
        let sql = format!(
            r#"
            SELECT si.product_id,
                   si.product_name,
                   SUM(si.quantity) AS quantity,
                   SUM(si.total_cents) AS revenue_cents,
                   SUM(si.quantity * p.default_cost_cents) AS cost_cents,
                   SUM(si.total_cents) - SUM(si.quantity * p.default_cost_cents) AS profit_cents
            FROM sale_items si
            JOIN sales s ON s.id = si.sale_id
            JOIN products p ON p.id = si.product_id
            WHERE s.status = 'completed'
              AND s.created_at >= ? AND s.created_at < ?
              {}
            GROUP BY si.product_id, si.product_name
            ORDER BY profit_cents DESC
            "#,
            if payment_type.is_some() {
                "AND s.payment_type = ?"
            } else {
                ""
            }
        );

        let mut query = sqlx::query_as::<_, ProductProfit>(&sql)
            .bind(range_start)
            .bind(range_end);
        if let Some(payment_type) = payment_type {
            query = query.bind(payment_type);
        }

        Ok(query.fetch_all(&self.pool).await?)
    }
}

// =============================================================================
// Date Range Helpers
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct SaleReportRow {
    transaction_id: String,
    customer: String,
    payment_type: PaymentType,
    total_cents: i64,
    amount_paid_cents: i64,
    created_at: DateTime<Utc>,
}

impl SaleReportRow {
    fn entry(&self, amount_cents: i64) -> SaleEntry {
        SaleEntry {
            transaction_id: self.transaction_id.clone(),
            customer: self.customer.clone(),
            amount_cents,
            payment_type: self.payment_type,
            created_at: self.created_at,
        }
    }
}

/// Earliest bound for open-ended ranges.
///
/// Timestamps are compared as TEXT in SQLite, so the sentinels must keep
/// four-digit years; chrono's MIN_UTC/MAX_UTC render six-digit years that
/// collate wrongly against normal dates.
fn range_floor() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(1000, 1, 1)
        .map(|d| d.and_time(NaiveTime::MIN).and_utc())
        .unwrap_or_default()
}

/// Latest bound for open-ended ranges.
fn range_ceiling() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(9999, 12, 31)
        .map(|d| d.and_time(NaiveTime::MIN).and_utc())
        .unwrap_or_default()
}

/// Widens a calendar-day pair to a half-open UTC range, swapping a
/// reversed pair instead of erroring.
fn day_range(start: NaiveDate, end: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let (start, end) = if end < start { (end, start) } else { (start, end) };

    let range_start = start.and_time(NaiveTime::MIN).and_utc();
    let range_end = end
        .checked_add_days(Days::new(1))
        .map(|d| d.and_time(NaiveTime::MIN).and_utc())
        .unwrap_or_else(range_ceiling);

    (range_start, range_end)
}

/// Like [`day_range`] but with open bounds: `None` means unbounded.
fn open_day_range(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> (DateTime<Utc>, DateTime<Utc>) {
    match (start, end) {
        (Some(s), Some(e)) => day_range(s, e),
        (Some(s), None) => (day_range(s, s).0, range_ceiling()),
        (None, Some(e)) => (range_floor(), day_range(e, e).1),
        (None, None) => (range_floor(), range_ceiling()),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::sale::{CreateSale, SaleLine};
    use crate::repository::stock::NewMovement;
    use crate::testutil;
    use coldstore_core::PaymentType;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn sale_on(
        db: &crate::pool::Database,
        product_id: &str,
        quantity: i64,
        unit_price_cents: i64,
        payment_type: PaymentType,
        amount_paid_cents: i64,
        at: DateTime<Utc>,
    ) {
        db.sales()
            .create_sale(CreateSale {
                customer_id: None,
                customer_name: Some("Walk-in".to_string()),
                items: vec![SaleLine {
                    product_id: product_id.to_string(),
                    quantity,
                    unit_price_cents,
                }],
                payment_type,
                amount_paid_cents,
                actor_id: "user-1".to_string(),
                created_at: Some(at),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_receive_then_sell_scenario() {
        // Receive 20 @ 5.00 on day 1, sell 5 cash @ 8.00 on day 2.
        let db = testutil::test_db().await;
        let product = testutil::seed_product(&db, "Frozen Chicken", 500, 800).await;

        let mut receipt = NewMovement::received(&product.id, 20, 500);
        receipt.created_at = Some(testutil::at_noon(2026, 3, 1));
        db.movements().record(receipt).await.unwrap();

        sale_on(
            &db,
            &product.id,
            5,
            800,
            PaymentType::Cash,
            4000,
            testutil::at_noon(2026, 3, 2),
        )
        .await;

        let summary = db
            .reports()
            .activity_summary(&product.id, date(2026, 3, 2), date(2026, 3, 2))
            .await
            .unwrap();

        assert_eq!(summary.previous_stock, 20);
        assert_eq!(summary.received_in_range, 0);
        assert_eq!(summary.total_available, 20);
        assert_eq!(summary.cash_sales_qty, 5);
        assert_eq!(summary.total_sales_qty, 5);
        assert_eq!(summary.remaining_stock, 15);
    }

    #[tokio::test]
    async fn test_reversed_range_is_swapped() {
        let db = testutil::test_db().await;
        let product = testutil::seed_product(&db, "Tilapia", 500, 800).await;

        let mut receipt = NewMovement::received(&product.id, 10, 500);
        receipt.created_at = Some(testutil::at_noon(2026, 3, 2));
        db.movements().record(receipt).await.unwrap();

        let forward = db
            .reports()
            .activity_summary(&product.id, date(2026, 3, 1), date(2026, 3, 3))
            .await
            .unwrap();
        let reversed = db
            .reports()
            .activity_summary(&product.id, date(2026, 3, 3), date(2026, 3, 1))
            .await
            .unwrap();

        assert_eq!(forward, reversed);
        assert_eq!(forward.received_in_range, 10);
    }

    #[tokio::test]
    async fn test_report_reads_are_idempotent() {
        let db = testutil::test_db().await;
        let product = testutil::seed_product(&db, "Tilapia", 500, 800).await;
        db.movements()
            .record(NewMovement::received(&product.id, 10, 500))
            .await
            .unwrap();
        sale_on(
            &db,
            &product.id,
            3,
            800,
            PaymentType::Cash,
            2400,
            Utc::now(),
        )
        .await;

        let today = Utc::now().date_naive();
        let first = db
            .reports()
            .activity_summary(&product.id, today, today)
            .await
            .unwrap();
        let second = db
            .reports()
            .activity_summary(&product.id, today, today)
            .await
            .unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_lifetime_remaining_matches_ledger_fold() {
        let db = testutil::test_db().await;
        let product = testutil::seed_product(&db, "Tilapia", 500, 800).await;
        let movements = db.movements();

        movements
            .record(NewMovement::received(&product.id, 20, 200))
            .await
            .unwrap();
        movements
            .record(NewMovement::adjusted(&product.id, -2, 200))
            .await
            .unwrap();
        sale_on(
            &db,
            &product.id,
            7,
            800,
            PaymentType::Cash,
            5600,
            Utc::now(),
        )
        .await;

        let summary = db
            .reports()
            .activity_summary(&product.id, date(2000, 1, 1), Utc::now().date_naive())
            .await
            .unwrap();
        let on_hand = movements.quantity_on_hand(&product.id, None).await.unwrap();

        assert_eq!(summary.remaining_stock, on_hand);
        assert_eq!(on_hand, 11);
    }

    #[tokio::test]
    async fn test_daily_report_splits_payment_types() {
        let db = testutil::test_db().await;
        let product = testutil::seed_product(&db, "Tilapia", 500, 1000).await;
        db.movements()
            .record(NewMovement::received(&product.id, 50, 500))
            .await
            .unwrap();

        let at = testutil::at_noon(2026, 3, 10);
        sale_on(&db, &product.id, 2, 1000, PaymentType::Cash, 2000, at).await;
        sale_on(&db, &product.id, 3, 1000, PaymentType::Credit, 0, at).await;
        sale_on(&db, &product.id, 4, 1000, PaymentType::Partial, 1500, at).await;

        let report = db
            .reports()
            .daily_sales_report(date(2026, 3, 10), date(2026, 3, 10))
            .await
            .unwrap();

        // cash list: the cash sale plus the paid part of the partial sale
        assert_eq!(report.cash_sales.len(), 2);
        let partial_paid = report
            .cash_sales
            .iter()
            .find(|e| e.payment_type == PaymentType::Partial)
            .unwrap();
        assert_eq!(partial_paid.amount_cents, 1500);

        // credit list: the credit sale plus the owed part of the partial
        assert_eq!(report.credit_sales.len(), 2);
        let partial_owed = report
            .credit_sales
            .iter()
            .find(|e| e.payment_type == PaymentType::Partial)
            .unwrap();
        assert_eq!(partial_owed.amount_cents, 2500);

        assert_eq!(report.totals.sales_count, 3);
        assert_eq!(report.totals.total_sales_cents, 9000);
        assert_eq!(report.totals.cash_collected_cents, 3500);
        assert_eq!(report.totals.credit_outstanding_cents, 5500);

        assert_eq!(report.products_bought.len(), 1);
        assert_eq!(report.products_bought[0].quantity, 2);
        assert_eq!(report.credited_products[0].quantity, 3);
        assert_eq!(report.partial_products[0].quantity, 4);
    }

    #[tokio::test]
    async fn test_profit_analysis_uses_catalog_cost() {
        let db = testutil::test_db().await;
        // catalog default cost 6.00, FIFO batch cost 5.00: the analysis
        // must use the catalog figure
        let product = testutil::seed_product(&db, "Tilapia", 600, 1000).await;
        db.movements()
            .record(NewMovement::received(&product.id, 50, 500))
            .await
            .unwrap();

        sale_on(
            &db,
            &product.id,
            10,
            1000,
            PaymentType::Cash,
            10000,
            Utc::now(),
        )
        .await;
        sale_on(&db, &product.id, 5, 1000, PaymentType::Credit, 0, Utc::now()).await;

        let report = db.reports().profit_analysis(None, None).await.unwrap();

        assert_eq!(report.total_product_sales.len(), 1);
        let total = &report.total_product_sales[0];
        assert_eq!(total.quantity, 15);
        assert_eq!(total.revenue_cents, 15000);
        assert_eq!(total.cost_cents, 15 * 600);
        assert_eq!(total.profit_cents, 15000 - 9000);

        let paid = &report.paid_product_sales[0];
        assert_eq!(paid.quantity, 10);
        assert_eq!(paid.profit_cents, 10000 - 6000);
    }

    #[tokio::test]
    async fn test_low_stock_respects_threshold() {
        let db = testutil::test_db().await;
        let low = testutil::seed_product(&db, "Nearly Out", 500, 800).await;
        let plenty = testutil::seed_product(&db, "Plenty", 500, 800).await;

        db.movements()
            .record(NewMovement::received(&low.id, 3, 500))
            .await
            .unwrap();
        db.movements()
            .record(NewMovement::received(&plenty.id, 50, 500))
            .await
            .unwrap();

        let flagged = db
            .reports()
            .with_low_stock_threshold(5)
            .low_stock_products()
            .await
            .unwrap();

        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].product_name, "Nearly Out");
        assert_eq!(flagged[0].quantity_on_hand, 3);
    }

    #[tokio::test]
    async fn test_dashboard_summary() {
        let db = testutil::test_db().await;
        let product = testutil::seed_product(&db, "Tilapia", 500, 1000).await;
        let customer = testutil::seed_customer(&db, "Ama Serwaa").await;
        db.movements()
            .record(NewMovement::received(&product.id, 50, 500))
            .await
            .unwrap();

        sale_on(
            &db,
            &product.id,
            2,
            1000,
            PaymentType::Cash,
            2000,
            Utc::now(),
        )
        .await;
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

        let dashboard = db.reports().dashboard_summary().await.unwrap();
        assert_eq!(dashboard.today_sales_count, 2);
        assert_eq!(dashboard.today_revenue_cents, 5000);
        assert_eq!(dashboard.today_cash_collected_cents, 2000);
        // 5 units sold at 10.00 against a 5.00 FIFO cost
        assert_eq!(dashboard.month_profit_cents, 2500);
        assert_eq!(dashboard.outstanding_debt_cents, 3000);
        assert_eq!(dashboard.active_products, 1);
        assert_eq!(dashboard.active_customers, 1);
        assert_eq!(dashboard.recent_sales.len(), 2);
    }
}
