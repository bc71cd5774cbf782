//! # Purchase Journal Repository
//!
//! Read access to recorded purchase receipts, symmetric to the sales
//! journal. Written exclusively by the TransactionEngine.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::error::DbResult;
use till_core::{CompletedPurchase, Purchase, PurchaseLineItem};

const PURCHASE_COLUMNS: &str = "id, invoice_number, supplier, subtotal_cents, tax_cents, \
    total_cents, payment_status, delivery_status, received_by, note, purchase_date, \
    created_at";

const PURCHASE_ITEM_COLUMNS: &str =
    "id, purchase_id, product_id, product_name, barcode, quantity, unit_cost_cents, \
     line_total_cents";

/// Repository for purchase journal reads.
#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    pool: SqlitePool,
}

impl PurchaseRepository {
    /// Creates a new PurchaseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseRepository { pool }
    }

    /// Gets a purchase with its line items by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<CompletedPurchase>> {
        let purchase = sqlx::query_as::<_, Purchase>(&format!(
            "SELECT {PURCHASE_COLUMNS} FROM purchases WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match purchase {
            Some(purchase) => {
                let items = self.items_for(&purchase.id).await?;
                Ok(Some(CompletedPurchase { purchase, items }))
            }
            None => Ok(None),
        }
    }

    /// Gets a purchase with its line items by invoice number.
    pub async fn get_by_invoice_number(
        &self,
        invoice_number: &str,
    ) -> DbResult<Option<CompletedPurchase>> {
        let purchase = sqlx::query_as::<_, Purchase>(&format!(
            "SELECT {PURCHASE_COLUMNS} FROM purchases WHERE invoice_number = ?1"
        ))
        .bind(invoice_number)
        .fetch_optional(&self.pool)
        .await?;

        match purchase {
            Some(purchase) => {
                let items = self.items_for(&purchase.id).await?;
                Ok(Some(CompletedPurchase { purchase, items }))
            }
            None => Ok(None),
        }
    }

    /// Lists purchases in a date window, newest first.
    pub async fn list_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<Vec<Purchase>> {
        let purchases = sqlx::query_as::<_, Purchase>(&format!(
            "SELECT {PURCHASE_COLUMNS} FROM purchases \
             WHERE purchase_date >= ?1 AND purchase_date <= ?2 ORDER BY purchase_date DESC"
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(purchases)
    }

    /// Counts all purchases (for diagnostics and tests).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM purchases")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Loads line items for a purchase in insertion order.
    async fn items_for(&self, purchase_id: &str) -> DbResult<Vec<PurchaseLineItem>> {
        let items = sqlx::query_as::<_, PurchaseLineItem>(&format!(
            "SELECT {PURCHASE_ITEM_COLUMNS} FROM purchase_items \
             WHERE purchase_id = ?1 ORDER BY rowid"
        ))
        .bind(purchase_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }
}
