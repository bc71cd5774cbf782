//! # Engine Request Types
//!
//! Typed request structs for every TransactionEngine operation.
//!
//! ## Contract Boundary
//! Outer surfaces deserialize whatever wire shape they speak into these
//! structs and run them through [`crate::validation`] BEFORE the engine
//! touches the database. Malformed shapes never reach the write path.

use serde::{Deserialize, Serialize};

use crate::types::{PaymentMethod, StockReason};

// =============================================================================
// Sale
// =============================================================================

/// One requested sale line: which product, how many units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleLineRequest {
    /// Product UUID.
    pub product_id: String,

    /// Requested quantity. Must be 1..=MAX_LINE_QUANTITY.
    pub quantity: i64,
}

/// A checkout request.
///
/// Lines are processed in order; the first stock violation wins. Duplicate
/// product ids across lines are NOT merged - each line is checked against
/// the in-transaction quantity left by the lines before it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleRequest {
    pub lines: Vec<SaleLineRequest>,

    /// Absolute discount in cents. 0 for none.
    pub discount_cents: i64,

    /// Tax rate in basis points. The engine applies no tax policy of its
    /// own; callers that charge tax pass the rate here, everyone else 0.
    pub tax_bps: u32,

    pub payment_method: PaymentMethod,

    /// Amount tendered in cents. Required for cash, ignored otherwise.
    pub cash_received_cents: Option<i64>,
}

impl SaleRequest {
    /// Convenience constructor for an untaxed, undiscounted sale.
    pub fn simple(lines: Vec<SaleLineRequest>, payment_method: PaymentMethod) -> Self {
        SaleRequest {
            lines,
            discount_cents: 0,
            tax_bps: 0,
            payment_method,
            cash_received_cents: None,
        }
    }
}

// =============================================================================
// Stock Adjustment
// =============================================================================

/// A manual stock adjustment request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustmentRequest {
    /// Product UUID.
    pub product_id: String,

    /// Signed quantity change. May not be 0, and may not drive the
    /// quantity below zero.
    pub delta: i64,

    pub reason: StockReason,

    /// Optional free-text note carried onto the ledger entry.
    pub note: Option<String>,
}

// =============================================================================
// Purchase Receipt
// =============================================================================

/// One received purchase line: product, units, unit cost paid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseLineRequest {
    /// Product UUID.
    pub product_id: String,

    /// Quantity received. Must be positive.
    pub quantity: i64,

    /// Unit cost paid in cents. Must be positive; becomes the product's
    /// new cost price (last-cost-wins).
    pub unit_cost_cents: i64,
}

/// A goods-receipt request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseRequest {
    /// Supplier name, recorded as given.
    pub supplier: String,

    pub lines: Vec<PurchaseLineRequest>,
}
