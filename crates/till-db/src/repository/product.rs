//! # Product Repository
//!
//! Catalog operations for products.
//!
//! ## Key Operations
//! - Lookup by id / barcode, substring search
//! - Insert / update of catalog fields
//! - Soft delete, and hard delete guarded by stock history
//! - Stock-level views: low stock, expiring, out of stock
//!
//! ## What Is Deliberately Missing
//! There is no quantity setter here. `update()` never touches `quantity`;
//! the TransactionEngine is the only writer of stock levels, so the
//! ledger's before/after chain can never drift from the live value.

use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use till_core::Product;

/// Columns fetched for every product SELECT.
const PRODUCT_COLUMNS: &str = "id, name, barcode, description, cost_price_cents, \
    selling_price_cents, wholesale_price_cents, quantity, reorder_level, expiry_date, \
    supplier, is_active, created_at, updated_at";

/// Repository for product catalog operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// let hits = repo.search("cola", 20).await?;
/// let product = repo.get_by_barcode("5449000000996").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Searches active products by name or barcode substring.
    ///
    /// ## Arguments
    /// * `query` - Search term (can be partial); empty returns active products
    /// * `limit` - Maximum results to return
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Product>> {
        let query = query.trim();

        debug!(query = %query, limit = limit, "Searching products");

        if query.is_empty() {
            return self.list_active(limit).await;
        }

        let pattern = format!("%{}%", query);

        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE is_active = 1 AND (name LIKE ?1 OR barcode LIKE ?1) \
             ORDER BY name LIMIT ?2"
        ))
        .bind(&pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Lists active products sorted by name.
    pub async fn list_active(&self, limit: u32) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE is_active = 1 ORDER BY name LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by its barcode.
    pub async fn get_by_barcode(&self, barcode: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE barcode = ?1"
        ))
        .bind(barcode)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Inserted product
    /// * `Err(DbError::UniqueViolation)` - barcode already exists
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        debug!(barcode = %product.barcode, name = %product.name, "Inserting product");

        sqlx::query(
            "INSERT INTO products (\
                 id, name, barcode, description, cost_price_cents, selling_price_cents, \
                 wholesale_price_cents, quantity, reorder_level, expiry_date, supplier, \
                 is_active, created_at, updated_at\
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.barcode)
        .bind(&product.description)
        .bind(product.cost_price_cents)
        .bind(product.selling_price_cents)
        .bind(product.wholesale_price_cents)
        .bind(product.quantity)
        .bind(product.reorder_level)
        .bind(product.expiry_date)
        .bind(&product.supplier)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product.clone())
    }

    /// Updates a product's catalog fields.
    ///
    /// `quantity` is intentionally absent from the statement; administrative
    /// stock corrections are modeled as adjustments through the engine.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - product doesn't exist
    /// * `Err(DbError::UniqueViolation)` - new barcode already taken
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE products SET \
                 name = ?2, barcode = ?3, description = ?4, cost_price_cents = ?5, \
                 selling_price_cents = ?6, wholesale_price_cents = ?7, reorder_level = ?8, \
                 expiry_date = ?9, supplier = ?10, is_active = ?11, updated_at = ?12 \
             WHERE id = ?1",
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.barcode)
        .bind(&product.description)
        .bind(product.cost_price_cents)
        .bind(product.selling_price_cents)
        .bind(product.wholesale_price_cents)
        .bind(product.reorder_level)
        .bind(product.expiry_date)
        .bind(&product.supplier)
        .bind(product.is_active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Soft-deletes a product by setting is_active = false.
    ///
    /// The safe deletion path: historical sales and ledger entries keep
    /// resolving, and the product can be restored.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1",
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Hard-deletes a product.
    ///
    /// Refused while any stock-ledger entry references the product, so the
    /// audit trail can never dangle. Sale/purchase line references are
    /// additionally protected by foreign keys.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let history: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM stock_ledger WHERE product_id = ?1")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        if history > 0 {
            return Err(DbError::ForeignKeyViolation {
                message: format!(
                    "product {} has {} stock ledger entries; soft-delete instead",
                    id, history
                ),
            });
        }

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Lists products at or below the given stock threshold, lowest first.
    pub async fn low_stock(&self, threshold: i64) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE is_active = 1 AND quantity <= ?1 ORDER BY quantity"
        ))
        .bind(threshold)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Lists products whose expiry date falls within the next `days_ahead`
    /// days (or has already passed), soonest first.
    pub async fn expiring(&self, days_ahead: i64) -> DbResult<Vec<Product>> {
        let cutoff = Utc::now() + Duration::days(days_ahead);

        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE is_active = 1 AND expiry_date IS NOT NULL AND expiry_date <= ?1 \
             ORDER BY expiry_date"
        ))
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Lists active products with zero quantity on hand.
    pub async fn out_of_stock(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE is_active = 1 AND quantity = 0 ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Counts active products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}
