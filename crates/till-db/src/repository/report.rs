//! # Reporting Repository
//!
//! Read-only aggregations over the sales journal and product catalog for
//! dashboards. No write invariants live here; everything is a projection
//! of what the TransactionEngine already committed.

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use till_core::PaymentMethod;

// =============================================================================
// Report Shapes
// =============================================================================

/// One calendar day of sales, broken out by payment method.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DailySalesReport {
    pub total_bills: i64,
    pub total_sales_cents: i64,
    pub cash_sales_cents: i64,
    pub card_sales_cents: i64,
    pub qr_sales_cents: i64,
    pub average_bill_cents: i64,
    pub min_bill_cents: i64,
    pub max_bill_cents: i64,
}

/// A best-selling product over a lookback window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopProduct {
    pub product_id: String,
    pub name: String,
    pub barcode: String,
    pub units_sold: i64,
    pub revenue_cents: i64,
    pub avg_price_cents: i64,
}

/// Current value of stock on hand, at cost.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryValue {
    pub total_value_cents: i64,
    pub total_products: i64,
    pub total_units: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct TopProductRow {
    product_id: String,
    product_name: String,
    barcode: String,
    units_sold: i64,
    revenue_cents: i64,
    avg_price: f64,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for reporting aggregations.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Builds the sales report for one calendar day in server-local time.
    ///
    /// Covers sales whose `sale_date` falls within the local day; an empty
    /// day returns the zeroed shape rather than an error.
    pub async fn daily_sales(&self, date: NaiveDate) -> DbResult<DailySalesReport> {
        let (start, end) = local_day_bounds(date)?;

        debug!(date = %date, "Building daily sales report");

        let rows: Vec<(i64, PaymentMethod)> = sqlx::query_as(
            "SELECT total_cents, payment_method FROM sales \
             WHERE sale_date >= ?1 AND sale_date < ?2",
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Ok(DailySalesReport::default());
        }

        let mut report = DailySalesReport {
            min_bill_cents: i64::MAX,
            ..DailySalesReport::default()
        };

        for (total_cents, method) in &rows {
            report.total_bills += 1;
            report.total_sales_cents += total_cents;
            match method {
                PaymentMethod::Cash => report.cash_sales_cents += total_cents,
                PaymentMethod::Card => report.card_sales_cents += total_cents,
                PaymentMethod::Qr => report.qr_sales_cents += total_cents,
                PaymentMethod::Cheque | PaymentMethod::Credit => {}
            }
            report.min_bill_cents = report.min_bill_cents.min(*total_cents);
            report.max_bill_cents = report.max_bill_cents.max(*total_cents);
        }

        // Rounded integer average, same cent precision as everything else
        report.average_bill_cents =
            (report.total_sales_cents + report.total_bills / 2) / report.total_bills;

        Ok(report)
    }

    /// Lists the best-selling products over the last `days` days,
    /// descending by units sold, truncated to `limit`.
    ///
    /// Groups the denormalized sale line snapshots, so retired products
    /// still report under the name they sold as.
    pub async fn top_products(&self, limit: u32, days: i64) -> DbResult<Vec<TopProduct>> {
        let since = Utc::now() - Duration::days(days);

        debug!(limit = limit, days = days, "Building top products report");

        let rows: Vec<TopProductRow> = sqlx::query_as(
            "SELECT si.product_id, si.product_name, si.barcode, \
                    SUM(si.quantity) AS units_sold, \
                    SUM(si.line_total_cents) AS revenue_cents, \
                    AVG(si.unit_price_cents) AS avg_price \
             FROM sale_items si \
             INNER JOIN sales s ON s.id = si.sale_id \
             WHERE s.sale_date >= ?1 \
             GROUP BY si.product_id, si.product_name, si.barcode \
             ORDER BY units_sold DESC \
             LIMIT ?2",
        )
        .bind(since)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| TopProduct {
                product_id: r.product_id,
                name: r.product_name,
                barcode: r.barcode,
                units_sold: r.units_sold,
                revenue_cents: r.revenue_cents,
                avg_price_cents: r.avg_price.round() as i64,
            })
            .collect())
    }

    /// Computes the total value of active stock at cost.
    pub async fn inventory_value(&self) -> DbResult<InventoryValue> {
        let (total_value_cents, total_products, total_units): (i64, i64, i64) = sqlx::query_as(
            "SELECT COALESCE(SUM(quantity * cost_price_cents), 0), \
                    COUNT(*), \
                    COALESCE(SUM(quantity), 0) \
             FROM products WHERE is_active = 1",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(InventoryValue {
            total_value_cents,
            total_products,
            total_units,
        })
    }
}

// =============================================================================
// Date Helpers
// =============================================================================

/// Converts a server-local calendar date to its UTC half-open day window
/// `[00:00:00 local, next day 00:00:00 local)`.
fn local_day_bounds(date: NaiveDate) -> DbResult<(DateTime<Utc>, DateTime<Utc>)> {
    let start_naive = date.and_time(NaiveTime::MIN);
    let end_naive = start_naive + Duration::days(1);

    let start = Local
        .from_local_datetime(&start_naive)
        .earliest()
        .ok_or_else(|| DbError::Internal(format!("invalid local time for {}", date)))?;
    let end = Local
        .from_local_datetime(&end_naive)
        .earliest()
        .ok_or_else(|| DbError::Internal(format!("invalid local time for {}", date)))?;

    Ok((start.with_timezone(&Utc), end.with_timezone(&Utc)))
}

// =============================================================================
// Unit Tests
// =============================================================================
