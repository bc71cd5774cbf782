//! # Validation Module
//!
//! Request and field validation for Till POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Validation Layers                                 │
//! │                                                                         │
//! │  Layer 1: Boundary (HTTP controllers, out of scope here)               │
//! │  ├── Deserialization into the typed request structs                    │
//! │  └── Authentication / authorization                                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - pure shape & business-rule validation          │
//! │  ├── Runs before the engine opens a transaction                        │
//! │  └── Rejects malformed requests before any write is attempted          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK (quantity >= 0)                                  │
//! │  ├── UNIQUE constraints (barcode, bill & invoice numbers)              │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::requests::{AdjustmentRequest, PurchaseRequest, SaleRequest};
use crate::{MAX_LINE_ITEMS, MAX_LINE_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Field Validators
// =============================================================================

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 200 characters
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a barcode.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 50 characters
/// - Digits, letters and hyphens only (covers EAN/UPC plus internal codes)
pub fn validate_barcode(barcode: &str) -> ValidationResult<()> {
    let barcode = barcode.trim();

    if barcode.is_empty() {
        return Err(ValidationError::Required {
            field: "barcode".to_string(),
        });
    }

    if barcode.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "barcode".to_string(),
            max: 50,
        });
    }

    if !barcode.chars().all(|c| c.is_alphanumeric() || c == '-') {
        return Err(ValidationError::InvalidFormat {
            field: "barcode".to_string(),
            reason: "must contain only letters, numbers and hyphens".to_string(),
        });
    }

    Ok(())
}

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price or cost in cents.
///
/// Zero is allowed for selling prices (free items); use
/// [`validate_positive_cents`] where zero is not acceptable.
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a strictly positive cent amount (purchase costs, payments).
pub fn validate_positive_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a UUID-shaped entity reference.
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Request Validators
// =============================================================================

/// Validates a sale request before the engine opens a transaction.
///
/// ## Checks
/// - lines non-empty, at most MAX_LINE_ITEMS
/// - every line: UUID product id, quantity 1..=MAX_LINE_QUANTITY
/// - discount >= 0, tax rate <= 100%
/// - cash sales carry an amount received
///
/// Stock availability and the received-vs-total comparison depend on
/// database state and the computed total; those are checked by the engine
/// inside the transaction.
pub fn validate_sale_request(request: &SaleRequest) -> ValidationResult<()> {
    if request.lines.is_empty() {
        return Err(ValidationError::Empty {
            field: "lines".to_string(),
        });
    }

    if request.lines.len() > MAX_LINE_ITEMS {
        return Err(ValidationError::TooMany {
            field: "lines".to_string(),
            max: MAX_LINE_ITEMS,
        });
    }

    for line in &request.lines {
        validate_uuid("product_id", &line.product_id)?;
        validate_quantity(line.quantity)?;
    }

    if request.discount_cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    if request.tax_bps > 10000 {
        return Err(ValidationError::OutOfRange {
            field: "tax_bps".to_string(),
            min: 0,
            max: 10000,
        });
    }

    if request.payment_method.is_cash() {
        match request.cash_received_cents {
            None => {
                return Err(ValidationError::Required {
                    field: "cash_received".to_string(),
                })
            }
            Some(cents) => validate_positive_cents("cash_received", cents)?,
        }
    }

    Ok(())
}

/// Validates a stock adjustment request.
pub fn validate_adjustment_request(request: &AdjustmentRequest) -> ValidationResult<()> {
    validate_uuid("product_id", &request.product_id)?;

    if request.delta == 0 {
        return Err(ValidationError::MustBeNonZero {
            field: "delta".to_string(),
        });
    }

    Ok(())
}

/// Validates a purchase receipt request.
pub fn validate_purchase_request(request: &PurchaseRequest) -> ValidationResult<()> {
    if request.supplier.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "supplier".to_string(),
        });
    }

    if request.lines.is_empty() {
        return Err(ValidationError::Empty {
            field: "lines".to_string(),
        });
    }

    if request.lines.len() > MAX_LINE_ITEMS {
        return Err(ValidationError::TooMany {
            field: "lines".to_string(),
            max: MAX_LINE_ITEMS,
        });
    }

    for line in &request.lines {
        validate_uuid("product_id", &line.product_id)?;
        validate_quantity(line.quantity)?;
        validate_positive_cents("unit_cost", line.unit_cost_cents)?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requests::{PurchaseLineRequest, SaleLineRequest};
    use crate::types::{PaymentMethod, StockReason};

    const PID: &str = "550e8400-e29b-41d4-a716-446655440000";

    fn sale_request(quantity: i64) -> SaleRequest {
        SaleRequest::simple(
            vec![SaleLineRequest {
                product_id: PID.to_string(),
                quantity,
            }],
            PaymentMethod::Card,
        )
    }

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("Coca-Cola 330ml").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name("   ").is_err());
        assert!(validate_product_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_barcode() {
        assert!(validate_barcode("5449000000996").is_ok());
        assert!(validate_barcode("INT-00042").is_ok());
        assert!(validate_barcode("").is_err());
        assert!(validate_barcode("has space").is_err());
        assert!(validate_barcode(&"9".repeat(60)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("product_id", PID).is_ok());
        assert!(validate_uuid("product_id", "").is_err());
        assert!(validate_uuid("product_id", "not-a-uuid").is_err());
    }

    #[test]
    fn test_sale_request_rejects_empty_lines() {
        let request = SaleRequest::simple(vec![], PaymentMethod::Card);
        assert!(matches!(
            validate_sale_request(&request),
            Err(ValidationError::Empty { .. })
        ));
    }

    #[test]
    fn test_sale_request_rejects_bad_quantity() {
        assert!(validate_sale_request(&sale_request(0)).is_err());
        assert!(validate_sale_request(&sale_request(-2)).is_err());
        assert!(validate_sale_request(&sale_request(1)).is_ok());
    }

    #[test]
    fn test_cash_sale_requires_amount_received() {
        let mut request = sale_request(1);
        request.payment_method = PaymentMethod::Cash;
        assert!(matches!(
            validate_sale_request(&request),
            Err(ValidationError::Required { .. })
        ));

        request.cash_received_cents = Some(5000);
        assert!(validate_sale_request(&request).is_ok());
    }

    #[test]
    fn test_adjustment_request_rejects_zero_delta() {
        let request = AdjustmentRequest {
            product_id: PID.to_string(),
            delta: 0,
            reason: StockReason::Damage,
            note: None,
        };
        assert!(matches!(
            validate_adjustment_request(&request),
            Err(ValidationError::MustBeNonZero { .. })
        ));
    }

    #[test]
    fn test_purchase_request_rejects_non_positive_cost() {
        let request = PurchaseRequest {
            supplier: "Acme Traders".to_string(),
            lines: vec![PurchaseLineRequest {
                product_id: PID.to_string(),
                quantity: 10,
                unit_cost_cents: 0,
            }],
        };
        assert!(validate_purchase_request(&request).is_err());
    }

    #[test]
    fn test_purchase_request_requires_supplier() {
        let request = PurchaseRequest {
            supplier: "  ".to_string(),
            lines: vec![PurchaseLineRequest {
                product_id: PID.to_string(),
                quantity: 10,
                unit_cost_cents: 2200,
            }],
        };
        assert!(matches!(
            validate_purchase_request(&request),
            Err(ValidationError::Required { .. })
        ));
    }
}
