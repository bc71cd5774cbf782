//! # Transaction Engine
//!
//! The single write path for every stock-affecting operation: sales, manual
//! stock adjustments, and purchase receipts.
//!
//! ## Write Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    One create_sale() Call                               │
//! │                                                                         │
//! │  validate request (pure, till-core) ── reject before any write         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN TRANSACTION                                                     │
//! │       │                                                                 │
//! │       ├── per line, in request order:                                  │
//! │       │     load product ──► check stock ──► snapshot price            │
//! │       │     guarded UPDATE quantity ──► INSERT ledger entry            │
//! │       │                                                                 │
//! │       ├── compute subtotal / discount / tax / total / change           │
//! │       │                                                                 │
//! │       ├── INSERT sale + sale_items                                     │
//! │       ▼                                                                 │
//! │  COMMIT ─── success: fully populated CompletedSale                     │
//! │                                                                         │
//! │  Any error anywhere above drops the transaction: no stock change, no   │
//! │  ledger entry, no sale row survives. Callers never observe a           │
//! │  partially applied sale.                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency
//! The quantity check is repeated by the database itself: every decrement
//! runs as `UPDATE ... WHERE quantity + delta >= 0` and the call fails if
//! no row matched. Two concurrent sales of the same SKU therefore cannot
//! both succeed past available stock, regardless of interleaving.
//!
//! Duplicate product ids across lines of one request are NOT merged: each
//! line re-reads the product inside the transaction and validates against
//! the quantity left by the lines before it.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DbError;
use till_core::validation;
use till_core::{
    AdjustmentRequest, AdjustmentSummary, CompletedPurchase, CompletedSale, CoreError,
    DeliveryStatus, Money, PaymentStatus, Product, Purchase, PurchaseLineItem, PurchaseRequest,
    Sale, SaleLineItem, SaleRequest, SaleStatus, StockLedgerEntry, StockReason, TaxRate,
    ValidationError,
};

/// Prefix for generated bill numbers.
pub const BILL_PREFIX: &str = "INV";

/// Prefix for generated purchase invoice numbers.
pub const INVOICE_PREFIX: &str = "PO";

// =============================================================================
// Engine Error
// =============================================================================

/// Errors returned by engine operations.
///
/// The union of business-rule violations (till-core) and persistence
/// failures (this crate). The boundary layer matches on the variants to
/// pick transport codes; `Db(DbError::UniqueViolation)` is the conflict
/// path for colliding bill/invoice numbers.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<ValidationError> for EngineError {
    fn from(err: ValidationError) -> Self {
        EngineError::Core(CoreError::Validation(err))
    }
}

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        EngineError::Db(DbError::from(err))
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

// =============================================================================
// Transaction Engine
// =============================================================================

/// Orchestrates multi-document stock writes.
///
/// Holds a clone of the shared pool; each operation acquires its own
/// connection and transaction, so concurrent invocations never share
/// transaction state.
#[derive(Debug, Clone)]
pub struct TransactionEngine {
    pool: SqlitePool,
}

impl TransactionEngine {
    /// Creates a new TransactionEngine.
    pub fn new(pool: SqlitePool) -> Self {
        TransactionEngine { pool }
    }

    /// Creates a completed sale from a cart of line requests.
    ///
    /// ## Algorithm
    /// Per line, in request order: load the product (must exist and be
    /// active), check stock (the FIRST violation wins and aborts the whole
    /// call), snapshot the current selling price, decrement the quantity
    /// and append one ledger entry. Then compute the totals, insert the
    /// sale document with a generated bill number, and commit.
    ///
    /// ## Errors
    /// - `CoreError::ProductNotFound` - unknown or inactive product id
    /// - `CoreError::InsufficientStock` - with product name and available
    /// - `CoreError::InvalidPayment` - cash under total, discount over subtotal
    /// - `DbError::UniqueViolation` - bill number collision (retryable)
    ///
    /// On any error, nothing is persisted.
    pub async fn create_sale(
        &self,
        actor_id: &str,
        request: SaleRequest,
    ) -> EngineResult<CompletedSale> {
        validation::validate_sale_request(&request)?;

        debug!(
            actor_id = %actor_id,
            lines = request.lines.len(),
            "Creating sale"
        );

        let mut tx = self.pool.begin().await?;

        let now = Utc::now();
        let sale_id = Uuid::new_v4().to_string();
        let bill_number = generate_document_number(BILL_PREFIX);

        let mut subtotal = Money::zero();
        let mut items: Vec<SaleLineItem> = Vec::with_capacity(request.lines.len());

        for line in &request.lines {
            // Re-read inside the transaction: a duplicated product id sees
            // the quantity left by its earlier line.
            let product = load_active_product(&mut tx, &line.product_id).await?;

            if !product.can_fulfill(line.quantity) {
                return Err(CoreError::InsufficientStock {
                    name: product.name,
                    available: product.quantity,
                    requested: line.quantity,
                }
                .into());
            }

            let line_total = product.selling_price().multiply_quantity(line.quantity);
            subtotal += line_total;

            apply_stock_delta(&mut tx, &product, -line.quantity, now).await?;

            insert_ledger_entry(
                &mut tx,
                &StockLedgerEntry {
                    id: Uuid::new_v4().to_string(),
                    product_id: product.id.clone(),
                    product_name: product.name.clone(),
                    barcode: product.barcode.clone(),
                    delta: -line.quantity,
                    quantity_before: product.quantity,
                    quantity_after: product.quantity - line.quantity,
                    reason: StockReason::Sale,
                    actor_id: actor_id.to_string(),
                    note: None,
                    cost_impact_cents: None,
                    reference: Some(bill_number.clone()),
                    created_at: now,
                },
            )
            .await?;

            items.push(SaleLineItem {
                id: Uuid::new_v4().to_string(),
                sale_id: sale_id.clone(),
                product_id: product.id,
                product_name: product.name,
                barcode: product.barcode,
                quantity: line.quantity,
                unit_price_cents: product.selling_price_cents,
                line_total_cents: line_total.cents(),
            });
        }

        let discount = Money::from_cents(request.discount_cents);
        if discount > subtotal {
            return Err(CoreError::InvalidPayment {
                reason: format!("discount {} exceeds subtotal {}", discount, subtotal),
            }
            .into());
        }

        let tax = (subtotal - discount).calculate_tax(TaxRate::from_bps(request.tax_bps));
        let total = subtotal - discount + tax;

        let change = if request.payment_method.is_cash() {
            let received_cents =
                request
                    .cash_received_cents
                    .ok_or_else(|| CoreError::InvalidPayment {
                        reason: "cash received is required for cash sales".to_string(),
                    })?;
            let received = Money::from_cents(received_cents);
            if received < total {
                return Err(CoreError::InvalidPayment {
                    reason: format!("received {} is less than total {}", received, total),
                }
                .into());
            }
            received - total
        } else {
            Money::zero()
        };

        let sale = Sale {
            id: sale_id,
            bill_number,
            subtotal_cents: subtotal.cents(),
            discount_cents: discount.cents(),
            tax_bps: request.tax_bps as i64,
            tax_cents: tax.cents(),
            total_cents: total.cents(),
            payment_method: request.payment_method,
            amount_received_cents: request.cash_received_cents,
            change_cents: change.cents(),
            cashier_id: actor_id.to_string(),
            status: SaleStatus::Completed,
            note: None,
            sale_date: now,
            created_at: now,
        };

        insert_sale(&mut tx, &sale).await?;
        for item in &items {
            insert_sale_item(&mut tx, item).await?;
        }

        tx.commit().await?;

        info!(
            sale_id = %sale.id,
            bill_number = %sale.bill_number,
            total = %total,
            items = items.len(),
            "Sale completed"
        );

        Ok(CompletedSale { sale, items })
    }

    /// Applies a manual stock adjustment to one product.
    ///
    /// ## Errors
    /// - `CoreError::ProductNotFound` - unknown product id
    /// - `CoreError::InvalidAdjustment` - new quantity would be negative
    ///
    /// The product update and its ledger entry commit together or not at
    /// all.
    pub async fn adjust_stock(
        &self,
        actor_id: &str,
        request: AdjustmentRequest,
    ) -> EngineResult<AdjustmentSummary> {
        validation::validate_adjustment_request(&request)?;

        debug!(
            actor_id = %actor_id,
            product_id = %request.product_id,
            delta = request.delta,
            "Adjusting stock"
        );

        let mut tx = self.pool.begin().await?;

        let now = Utc::now();
        let product = load_product(&mut tx, &request.product_id).await?;

        let new_quantity = product.quantity + request.delta;
        if new_quantity < 0 {
            return Err(CoreError::InvalidAdjustment {
                name: product.name,
                on_hand: product.quantity,
                delta: request.delta,
            }
            .into());
        }

        apply_stock_delta(&mut tx, &product, request.delta, now).await?;

        let entry_id = Uuid::new_v4().to_string();
        insert_ledger_entry(
            &mut tx,
            &StockLedgerEntry {
                id: entry_id.clone(),
                product_id: product.id.clone(),
                product_name: product.name.clone(),
                barcode: product.barcode.clone(),
                delta: request.delta,
                quantity_before: product.quantity,
                quantity_after: new_quantity,
                reason: request.reason,
                actor_id: actor_id.to_string(),
                note: request.note.clone(),
                cost_impact_cents: None,
                reference: None,
                created_at: now,
            },
        )
        .await?;

        tx.commit().await?;

        info!(
            product_id = %product.id,
            delta = request.delta,
            new_quantity = new_quantity,
            reason = ?request.reason,
            "Stock adjusted"
        );

        Ok(AdjustmentSummary {
            entry_id,
            product_id: product.id,
            delta: request.delta,
            new_quantity,
            reason: request.reason,
        })
    }

    /// Records a goods-receipt from a supplier.
    ///
    /// Per line: the product's cost price is overwritten with the paid
    /// cost (last-cost-wins) and its quantity incremented, with one ledger
    /// entry per line. The purchase document is inserted last with a
    /// generated invoice number. Same all-or-nothing contract as
    /// [`create_sale`](TransactionEngine::create_sale).
    pub async fn record_purchase(
        &self,
        actor_id: &str,
        request: PurchaseRequest,
    ) -> EngineResult<CompletedPurchase> {
        validation::validate_purchase_request(&request)?;

        debug!(
            actor_id = %actor_id,
            supplier = %request.supplier,
            lines = request.lines.len(),
            "Recording purchase"
        );

        let mut tx = self.pool.begin().await?;

        let now = Utc::now();
        let purchase_id = Uuid::new_v4().to_string();
        let invoice_number = generate_document_number(INVOICE_PREFIX);

        let mut total = Money::zero();
        let mut items: Vec<PurchaseLineItem> = Vec::with_capacity(request.lines.len());

        for line in &request.lines {
            let product = load_product(&mut tx, &line.product_id).await?;

            let line_total = Money::from_cents(line.unit_cost_cents).multiply_quantity(line.quantity);
            total += line_total;

            // Last-cost-wins: the paid unit cost becomes the product's cost
            // price alongside the stock increment.
            sqlx::query(
                "UPDATE products SET cost_price_cents = ?2, quantity = quantity + ?3, \
                 updated_at = ?4 WHERE id = ?1",
            )
            .bind(&product.id)
            .bind(line.unit_cost_cents)
            .bind(line.quantity)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            insert_ledger_entry(
                &mut tx,
                &StockLedgerEntry {
                    id: Uuid::new_v4().to_string(),
                    product_id: product.id.clone(),
                    product_name: product.name.clone(),
                    barcode: product.barcode.clone(),
                    delta: line.quantity,
                    quantity_before: product.quantity,
                    quantity_after: product.quantity + line.quantity,
                    reason: StockReason::Purchase,
                    actor_id: actor_id.to_string(),
                    note: None,
                    cost_impact_cents: Some(line_total.cents()),
                    reference: Some(invoice_number.clone()),
                    created_at: now,
                },
            )
            .await?;

            items.push(PurchaseLineItem {
                id: Uuid::new_v4().to_string(),
                purchase_id: purchase_id.clone(),
                product_id: product.id,
                product_name: product.name,
                barcode: product.barcode,
                quantity: line.quantity,
                unit_cost_cents: line.unit_cost_cents,
                line_total_cents: line_total.cents(),
            });
        }

        let purchase = Purchase {
            id: purchase_id,
            invoice_number,
            supplier: request.supplier.trim().to_string(),
            subtotal_cents: total.cents(),
            tax_cents: 0,
            total_cents: total.cents(),
            payment_status: PaymentStatus::Pending,
            delivery_status: DeliveryStatus::Pending,
            received_by: actor_id.to_string(),
            note: None,
            purchase_date: now,
            created_at: now,
        };

        insert_purchase(&mut tx, &purchase).await?;
        for item in &items {
            insert_purchase_item(&mut tx, item).await?;
        }

        tx.commit().await?;

        info!(
            purchase_id = %purchase.id,
            invoice_number = %purchase.invoice_number,
            total = %total,
            items = items.len(),
            "Purchase recorded"
        );

        Ok(CompletedPurchase { purchase, items })
    }
}

// =============================================================================
// Transaction-Scoped Helpers
// =============================================================================

async fn load_product(conn: &mut SqliteConnection, id: &str) -> EngineResult<Product> {
    let product = sqlx::query_as::<_, Product>(
        "SELECT id, name, barcode, description, cost_price_cents, selling_price_cents, \
         wholesale_price_cents, quantity, reorder_level, expiry_date, supplier, is_active, \
         created_at, updated_at \
         FROM products WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(DbError::from)?;

    product.ok_or_else(|| CoreError::ProductNotFound(id.to_string()).into())
}

/// Loads a product for sale: soft-deleted products are not sellable and
/// surface as not-found.
async fn load_active_product(conn: &mut SqliteConnection, id: &str) -> EngineResult<Product> {
    let product = load_product(conn, id).await?;
    if !product.is_active {
        return Err(CoreError::ProductNotFound(id.to_string()).into());
    }
    Ok(product)
}

/// Applies a signed quantity delta with the non-negativity guard repeated
/// in the UPDATE itself. The guard is the serialization point for
/// concurrent writes against the same SKU: whichever transaction loses the
/// race matches zero rows and the call aborts.
async fn apply_stock_delta(
    conn: &mut SqliteConnection,
    product: &Product,
    delta: i64,
    now: DateTime<Utc>,
) -> EngineResult<()> {
    let result = sqlx::query(
        "UPDATE products SET quantity = quantity + ?2, updated_at = ?3 \
         WHERE id = ?1 AND quantity + ?2 >= 0",
    )
    .bind(&product.id)
    .bind(delta)
    .bind(now)
    .execute(&mut *conn)
    .await
    .map_err(DbError::from)?;

    if result.rows_affected() == 0 {
        if delta < 0 {
            return Err(CoreError::InsufficientStock {
                name: product.name.clone(),
                available: product.quantity,
                requested: -delta,
            }
            .into());
        }
        return Err(CoreError::InvalidAdjustment {
            name: product.name.clone(),
            on_hand: product.quantity,
            delta,
        }
        .into());
    }

    Ok(())
}

async fn insert_ledger_entry(
    conn: &mut SqliteConnection,
    entry: &StockLedgerEntry,
) -> EngineResult<()> {
    sqlx::query(
        "INSERT INTO stock_ledger (\
             id, product_id, product_name, barcode, delta, \
             quantity_before, quantity_after, reason, actor_id, \
             note, cost_impact_cents, reference, created_at\
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
    )
    .bind(&entry.id)
    .bind(&entry.product_id)
    .bind(&entry.product_name)
    .bind(&entry.barcode)
    .bind(entry.delta)
    .bind(entry.quantity_before)
    .bind(entry.quantity_after)
    .bind(entry.reason)
    .bind(&entry.actor_id)
    .bind(&entry.note)
    .bind(entry.cost_impact_cents)
    .bind(&entry.reference)
    .bind(entry.created_at)
    .execute(&mut *conn)
    .await
    .map_err(DbError::from)?;

    Ok(())
}

async fn insert_sale(conn: &mut SqliteConnection, sale: &Sale) -> EngineResult<()> {
    sqlx::query(
        "INSERT INTO sales (\
             id, bill_number, subtotal_cents, discount_cents, tax_bps, tax_cents, \
             total_cents, payment_method, amount_received_cents, change_cents, \
             cashier_id, status, note, sale_date, created_at\
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
    )
    .bind(&sale.id)
    .bind(&sale.bill_number)
    .bind(sale.subtotal_cents)
    .bind(sale.discount_cents)
    .bind(sale.tax_bps)
    .bind(sale.tax_cents)
    .bind(sale.total_cents)
    .bind(sale.payment_method)
    .bind(sale.amount_received_cents)
    .bind(sale.change_cents)
    .bind(&sale.cashier_id)
    .bind(sale.status)
    .bind(&sale.note)
    .bind(sale.sale_date)
    .bind(sale.created_at)
    .execute(&mut *conn)
    .await
    .map_err(DbError::from)?;

    Ok(())
}

async fn insert_sale_item(conn: &mut SqliteConnection, item: &SaleLineItem) -> EngineResult<()> {
    sqlx::query(
        "INSERT INTO sale_items (\
             id, sale_id, product_id, product_name, barcode, \
             quantity, unit_price_cents, line_total_cents\
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )
    .bind(&item.id)
    .bind(&item.sale_id)
    .bind(&item.product_id)
    .bind(&item.product_name)
    .bind(&item.barcode)
    .bind(item.quantity)
    .bind(item.unit_price_cents)
    .bind(item.line_total_cents)
    .execute(&mut *conn)
    .await
    .map_err(DbError::from)?;

    Ok(())
}

async fn insert_purchase(conn: &mut SqliteConnection, purchase: &Purchase) -> EngineResult<()> {
    sqlx::query(
        "INSERT INTO purchases (\
             id, invoice_number, supplier, subtotal_cents, tax_cents, total_cents, \
             payment_status, delivery_status, received_by, note, purchase_date, created_at\
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
    )
    .bind(&purchase.id)
    .bind(&purchase.invoice_number)
    .bind(&purchase.supplier)
    .bind(purchase.subtotal_cents)
    .bind(purchase.tax_cents)
    .bind(purchase.total_cents)
    .bind(purchase.payment_status)
    .bind(purchase.delivery_status)
    .bind(&purchase.received_by)
    .bind(&purchase.note)
    .bind(purchase.purchase_date)
    .bind(purchase.created_at)
    .execute(&mut *conn)
    .await
    .map_err(DbError::from)?;

    Ok(())
}

async fn insert_purchase_item(
    conn: &mut SqliteConnection,
    item: &PurchaseLineItem,
) -> EngineResult<()> {
    sqlx::query(
        "INSERT INTO purchase_items (\
             id, purchase_id, product_id, product_name, barcode, \
             quantity, unit_cost_cents, line_total_cents\
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )
    .bind(&item.id)
    .bind(&item.purchase_id)
    .bind(&item.product_id)
    .bind(&item.product_name)
    .bind(&item.barcode)
    .bind(item.quantity)
    .bind(item.unit_cost_cents)
    .bind(item.line_total_cents)
    .execute(&mut *conn)
    .await
    .map_err(DbError::from)?;

    Ok(())
}

/// Generates a document number in format: `PREFIX-<unix-millis>-<NNNN>`
///
/// The 4-digit suffix comes from the subsecond nanos, which keeps numbers
/// generated within the same millisecond apart. Uniqueness is ultimately
/// enforced by the UNIQUE index; a collision surfaces as a conflict error
/// and the caller may retry.
fn generate_document_number(prefix: &str) -> String {
    let now = Utc::now();
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    format!("{}-{}-{:04}", prefix, now.timestamp_millis(), nanos % 10000)
}

// =============================================================================
// Unit Tests
// =============================================================================
