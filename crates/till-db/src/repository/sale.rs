//! # Sales Journal Repository
//!
//! Read access to completed sales.
//!
//! Sales are written exclusively by the TransactionEngine in the same
//! transaction as their stock effects. Line items are denormalized
//! snapshots, so a sale reads back identically even after the products it
//! references are edited or retired.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::error::DbResult;
use till_core::{CompletedSale, Sale, SaleLineItem};

const SALE_COLUMNS: &str = "id, bill_number, subtotal_cents, discount_cents, tax_bps, \
    tax_cents, total_cents, payment_method, amount_received_cents, change_cents, \
    cashier_id, status, note, sale_date, created_at";

const SALE_ITEM_COLUMNS: &str =
    "id, sale_id, product_id, product_name, barcode, quantity, unit_price_cents, \
     line_total_cents";

/// Repository for sales journal reads.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale with its line items by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<CompletedSale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match sale {
            Some(sale) => {
                let items = self.items_for(&sale.id).await?;
                Ok(Some(CompletedSale { sale, items }))
            }
            None => Ok(None),
        }
    }

    /// Gets a sale with its line items by bill number.
    pub async fn get_by_bill_number(&self, bill_number: &str) -> DbResult<Option<CompletedSale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE bill_number = ?1"
        ))
        .bind(bill_number)
        .fetch_optional(&self.pool)
        .await?;

        match sale {
            Some(sale) => {
                let items = self.items_for(&sale.id).await?;
                Ok(Some(CompletedSale { sale, items }))
            }
            None => Ok(None),
        }
    }

    /// Lists sales in a date window, newest first. Line items are not
    /// loaded; use [`get_by_id`](SaleRepository::get_by_id) for detail.
    pub async fn list_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales \
             WHERE sale_date >= ?1 AND sale_date <= ?2 ORDER BY sale_date DESC"
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Counts all sales (for diagnostics and tests).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Loads line items for a sale in insertion order.
    async fn items_for(&self, sale_id: &str) -> DbResult<Vec<SaleLineItem>> {
        let items = sqlx::query_as::<_, SaleLineItem>(&format!(
            "SELECT {SALE_ITEM_COLUMNS} FROM sale_items WHERE sale_id = ?1 ORDER BY rowid"
        ))
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }
}
