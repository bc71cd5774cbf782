//! # Domain Types
//!
//! Core domain types used throughout Till POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Domain Types                                   │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────────┐   │
//! │  │    Product      │   │      Sale       │   │  StockLedgerEntry   │   │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────────  │   │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)          │   │
//! │  │  barcode        │   │  bill_number    │   │  delta (signed)     │   │
//! │  │  quantity       │   │  total_cents    │   │  before / after     │   │
//! │  │  *_price_cents  │   │  payment_method │   │  reason             │   │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────────┘   │
//! │                                                                         │
//! │  Product holds the LIVE quantity; StockLedgerEntry is the append-only  │
//! │  audit trail; Sale and Purchase carry denormalized line snapshots so   │
//! │  history survives later product edits.                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID where one exists: (barcode, bill_number, invoice_number)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01% = 1/10000, so 825 bps = 8.25%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage (for convenience).
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Product
// =============================================================================

/// A stock-keeping unit.
///
/// ## Quantity Invariant
/// `quantity` is never negative, and is mutated ONLY by the
/// TransactionEngine (sale, purchase receipt, stock adjustment). Catalog
/// edits through the product repository never touch it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    /// Barcode (EAN-13, UPC-A, etc.). Unique across the catalog.
    pub barcode: String,

    /// Optional description for product details.
    pub description: Option<String>,

    /// Unit cost in cents. Overwritten by purchase receipts (last-cost-wins).
    pub cost_price_cents: i64,

    /// Unit selling price in cents. Snapshotted onto sale lines.
    pub selling_price_cents: i64,

    /// Optional wholesale price in cents.
    pub wholesale_price_cents: Option<i64>,

    /// Current quantity-on-hand. Never negative.
    pub quantity: i64,

    /// Reorder threshold for low-stock reporting.
    pub reorder_level: i64,

    /// Optional expiry date.
    pub expiry_date: Option<DateTime<Utc>>,

    /// Optional default supplier name.
    pub supplier: Option<String>,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the selling price as a Money type.
    #[inline]
    pub fn selling_price(&self) -> Money {
        Money::from_cents(self.selling_price_cents)
    }

    /// Returns the cost price as a Money type.
    #[inline]
    pub fn cost_price(&self) -> Money {
        Money::from_cents(self.cost_price_cents)
    }

    /// Checks whether the requested quantity can be fulfilled from stock.
    #[inline]
    pub fn can_fulfill(&self, requested: i64) -> bool {
        self.quantity >= requested
    }

    /// Checks whether the product sits at or below its reorder threshold.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.reorder_level
    }
}

// =============================================================================
// Stock Ledger
// =============================================================================

/// Reason code attached to every stock ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum StockReason {
    /// Stock left the building with a completed sale.
    Sale,
    /// Stock arrived via a purchase receipt.
    Purchase,
    /// Manual restock outside of a purchase document.
    Restock,
    /// Written off as damaged.
    Damage,
    /// Written off as expired.
    Expired,
    /// Administrative correction.
    ManualAdjust,
    /// Customer return back into stock.
    Return,
}

/// Immutable record of one quantity change to one product.
///
/// ## Invariant
/// `quantity_after = quantity_before + delta`, and `quantity_after` equals
/// the product's live quantity at the moment the entry committed. Entries
/// are created exactly once per stock-affecting event and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockLedgerEntry {
    pub id: String,

    /// The product whose quantity changed.
    pub product_id: String,

    /// Product name at the time of the change (frozen).
    pub product_name: String,

    /// Barcode at the time of the change (frozen).
    pub barcode: String,

    /// Signed quantity change: negative for sales, positive for receipts.
    pub delta: i64,

    pub quantity_before: i64,
    pub quantity_after: i64,

    pub reason: StockReason,

    /// The authenticated user who caused the change.
    pub actor_id: String,

    /// Optional free-text note.
    pub note: Option<String>,

    /// Optional cost impact in cents (set for purchase receipts).
    pub cost_impact_cents: Option<i64>,

    /// Optional reference document (bill or invoice number).
    pub reference: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl StockLedgerEntry {
    /// Checks the entry's internal arithmetic.
    #[inline]
    pub fn is_balanced(&self) -> bool {
        self.quantity_after == self.quantity_before + self.delta
    }
}

// =============================================================================
// Sale
// =============================================================================

/// How a sale was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Physical cash; requires amount received and produces change.
    Cash,
    /// Card payment on an external terminal.
    Card,
    /// QR / wallet payment.
    Qr,
    /// Cheque.
    Cheque,
    /// Store credit / on account.
    Credit,
}

impl PaymentMethod {
    /// Whether this method requires an `amount received` and change math.
    #[inline]
    pub const fn is_cash(&self) -> bool {
        matches!(self, PaymentMethod::Cash)
    }
}

/// The status of a sale.
///
/// `Refunded` and `Cancelled` are declared for forward compatibility; the
/// engine only ever writes `Completed` and exposes no transition out of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
    Completed,
    Refunded,
    Cancelled,
}

impl Default for SaleStatus {
    fn default() -> Self {
        SaleStatus::Completed
    }
}

/// A completed checkout.
///
/// Immutable after creation; the engine writes it together with its line
/// items and ledger entries in one transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,

    /// Human-readable unique bill number (`INV-...`).
    pub bill_number: String,

    pub subtotal_cents: i64,

    /// Absolute discount applied to the subtotal.
    pub discount_cents: i64,

    /// Tax rate applied, in basis points (0 unless a policy was supplied).
    pub tax_bps: i64,

    pub tax_cents: i64,

    /// subtotal - discount + tax.
    pub total_cents: i64,

    pub payment_method: PaymentMethod,

    /// Amount tendered; present for cash sales.
    pub amount_received_cents: Option<i64>,

    /// Change returned; 0 for non-cash methods.
    pub change_cents: i64,

    /// The cashier who rang the sale up.
    pub cashier_id: String,

    pub status: SaleStatus,

    pub note: Option<String>,

    pub sale_date: DateTime<Utc>,

    pub created_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

/// A line item in a sale.
///
/// Uses the snapshot pattern: product name, barcode and unit price are
/// frozen at the time of sale so history stays accurate even if the
/// product is edited later.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleLineItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,

    /// Product name at time of sale (frozen).
    pub product_name: String,

    /// Barcode at time of sale (frozen).
    pub barcode: String,

    /// Quantity sold. Always >= 1.
    pub quantity: i64,

    /// Unit selling price in cents at time of sale (frozen).
    pub unit_price_cents: i64,

    /// unit_price * quantity.
    pub line_total_cents: i64,
}

impl SaleLineItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

/// A sale together with its line items, as returned by the engine and the
/// sale repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedSale {
    pub sale: Sale,
    pub items: Vec<SaleLineItem>,
}

// =============================================================================
// Purchase
// =============================================================================

/// Payment state of a purchase document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Partial,
    Paid,
}

/// Delivery state of a purchase document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Pending,
    Partial,
    Delivered,
}

/// A completed goods-receipt from a supplier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Purchase {
    pub id: String,

    /// Human-readable unique invoice number (`PO-...`).
    pub invoice_number: String,

    /// Supplier name, recorded as given.
    pub supplier: String,

    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,

    pub payment_status: PaymentStatus,
    pub delivery_status: DeliveryStatus,

    /// The user who received the goods.
    pub received_by: String,

    pub note: Option<String>,

    pub purchase_date: DateTime<Utc>,

    pub created_at: DateTime<Utc>,
}

/// A line item in a purchase.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PurchaseLineItem {
    pub id: String,
    pub purchase_id: String,
    pub product_id: String,

    /// Product name at time of receipt (frozen).
    pub product_name: String,

    /// Barcode at time of receipt (frozen).
    pub barcode: String,

    /// Quantity received. Always >= 1.
    pub quantity: i64,

    /// Unit cost paid in cents; becomes the product's new cost price.
    pub unit_cost_cents: i64,

    /// unit_cost * quantity.
    pub line_total_cents: i64,
}

/// A purchase together with its line items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedPurchase {
    pub purchase: Purchase,
    pub items: Vec<PurchaseLineItem>,
}

// =============================================================================
// Adjustment Summary
// =============================================================================

/// Returned by the engine after a stock adjustment.
///
/// Adjustments are not stored as a document of their own; the ledger entry
/// is the record, and this summary echoes it back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustmentSummary {
    /// Id of the ledger entry that recorded the adjustment.
    pub entry_id: String,
    pub product_id: String,
    pub delta: i64,
    pub new_quantity: i64,
    pub reason: StockReason,
}

// =============================================================================
// Unit Tests
// =============================================================================
