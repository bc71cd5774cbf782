//! # Stock Ledger Repository
//!
//! Read access to the append-only stock ledger.
//!
//! Entries are written exclusively by the TransactionEngine; this
//! repository only reads them. There is no update or delete - the ledger
//! is the audit trail.

use sqlx::SqlitePool;

use crate::error::DbResult;
use till_core::StockLedgerEntry;

const LEDGER_COLUMNS: &str = "id, product_id, product_name, barcode, delta, \
    quantity_before, quantity_after, reason, actor_id, note, cost_impact_cents, \
    reference, created_at";

/// Repository for stock ledger reads.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
}

impl LedgerRepository {
    /// Creates a new LedgerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LedgerRepository { pool }
    }

    /// Lists a product's ledger entries, newest first.
    pub async fn history_for_product(
        &self,
        product_id: &str,
        limit: u32,
    ) -> DbResult<Vec<StockLedgerEntry>> {
        let entries = sqlx::query_as::<_, StockLedgerEntry>(&format!(
            "SELECT {LEDGER_COLUMNS} FROM stock_ledger \
             WHERE product_id = ?1 ORDER BY created_at DESC, rowid DESC LIMIT ?2"
        ))
        .bind(product_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Lists the most recent ledger entries across all products.
    pub async fn recent(&self, limit: u32) -> DbResult<Vec<StockLedgerEntry>> {
        let entries = sqlx::query_as::<_, StockLedgerEntry>(&format!(
            "SELECT {LEDGER_COLUMNS} FROM stock_ledger \
             ORDER BY created_at DESC, rowid DESC LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Sums all deltas ever recorded for a product.
    ///
    /// Audit identity: for a product created with quantity Q0, the live
    /// quantity must equal Q0 + net_change_for_product at all times.
    pub async fn net_change_for_product(&self, product_id: &str) -> DbResult<i64> {
        let net: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(delta), 0) FROM stock_ledger WHERE product_id = ?1",
        )
        .bind(product_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(net)
    }

    /// Counts all ledger entries (for diagnostics and tests).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stock_ledger")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
