//! Integration tests for the TransactionEngine write path.
//!
//! Each test runs against a fresh in-memory database with migrations
//! applied, exercising the real SQL the engine ships with.

use chrono::Utc;
use uuid::Uuid;

use till_core::{
    AdjustmentRequest, CoreError, PaymentMethod, Product, PurchaseLineRequest, PurchaseRequest,
    SaleLineRequest, SaleRequest, SaleStatus, StockReason, DEFAULT_REORDER_LEVEL,
};
use till_db::{Database, DbConfig, DbError, EngineError};

const CASHIER: &str = "cashier-1";
const MANAGER: &str = "manager-1";

async fn test_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

fn product(name: &str, barcode: &str, cost_cents: i64, price_cents: i64, quantity: i64) -> Product {
    let now = Utc::now();
    Product {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        barcode: barcode.to_string(),
        description: None,
        cost_price_cents: cost_cents,
        selling_price_cents: price_cents,
        wholesale_price_cents: None,
        quantity,
        reorder_level: DEFAULT_REORDER_LEVEL,
        expiry_date: None,
        supplier: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

async fn seed_product(
    db: &Database,
    name: &str,
    barcode: &str,
    cost_cents: i64,
    price_cents: i64,
    quantity: i64,
) -> Product {
    db.products()
        .insert(&product(name, barcode, cost_cents, price_cents, quantity))
        .await
        .unwrap()
}

fn line(product: &Product, quantity: i64) -> SaleLineRequest {
    SaleLineRequest {
        product_id: product.id.clone(),
        quantity,
    }
}

fn cash_sale(lines: Vec<SaleLineRequest>, received_cents: i64) -> SaleRequest {
    SaleRequest {
        lines,
        discount_cents: 0,
        tax_bps: 0,
        payment_method: PaymentMethod::Cash,
        cash_received_cents: Some(received_cents),
    }
}

async fn live_quantity(db: &Database, product_id: &str) -> i64 {
    db.products()
        .get_by_id(product_id)
        .await
        .unwrap()
        .unwrap()
        .quantity
}

// =============================================================================
// Sales
// =============================================================================

#[tokio::test]
async fn simple_cash_sale() {
    let db = test_db().await;
    // quantity 100 at 50.00
    let p = seed_product(&db, "Basmati Rice 1kg", "5900000000011", 3000, 5000, 100).await;

    let completed = db
        .engine()
        .create_sale(CASHIER, cash_sale(vec![line(&p, 5)], 30000))
        .await
        .unwrap();

    assert_eq!(completed.sale.subtotal_cents, 25000);
    assert_eq!(completed.sale.discount_cents, 0);
    assert_eq!(completed.sale.tax_cents, 0);
    assert_eq!(completed.sale.total_cents, 25000);
    assert_eq!(completed.sale.change_cents, 5000);
    assert_eq!(completed.sale.amount_received_cents, Some(30000));
    assert_eq!(completed.sale.payment_method, PaymentMethod::Cash);
    assert_eq!(completed.sale.status, SaleStatus::Completed);
    assert_eq!(completed.sale.cashier_id, CASHIER);
    assert!(completed.sale.bill_number.starts_with("INV-"));

    assert_eq!(completed.items.len(), 1);
    assert_eq!(completed.items[0].quantity, 5);
    assert_eq!(completed.items[0].unit_price_cents, 5000);
    assert_eq!(completed.items[0].line_total_cents, 25000);
    assert_eq!(completed.items[0].product_name, "Basmati Rice 1kg");

    // Stock decremented
    assert_eq!(live_quantity(&db, &p.id).await, 95);

    // Exactly one ledger entry, fully balanced
    let entries = db.ledger().history_for_product(&p.id, 10).await.unwrap();
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.delta, -5);
    assert_eq!(entry.quantity_before, 100);
    assert_eq!(entry.quantity_after, 95);
    assert_eq!(entry.reason, StockReason::Sale);
    assert_eq!(entry.actor_id, CASHIER);
    assert_eq!(entry.reference.as_deref(), Some(completed.sale.bill_number.as_str()));
    assert!(entry.is_balanced());
}

#[tokio::test]
async fn insufficient_stock_rejected() {
    let db = test_db().await;
    let p = seed_product(&db, "Red Bull 250ml", "5900000000028", 150, 300, 3).await;

    let err = db
        .engine()
        .create_sale(CASHIER, cash_sale(vec![line(&p, 10)], 10000))
        .await
        .unwrap_err();

    match err {
        EngineError::Core(CoreError::InsufficientStock {
            name,
            available,
            requested,
        }) => {
            assert_eq!(name, "Red Bull 250ml");
            assert_eq!(available, 3);
            assert_eq!(requested, 10);
        }
        other => panic!("expected InsufficientStock, got {:?}", other),
    }

    // Nothing persisted
    assert_eq!(live_quantity(&db, &p.id).await, 3);
    assert_eq!(db.sales().count().await.unwrap(), 0);
    assert_eq!(db.ledger().count().await.unwrap(), 0);
}

#[tokio::test]
async fn mid_sale_failure_rolls_back_everything() {
    let db = test_db().await;
    let a = seed_product(&db, "Whole Milk 1L", "5900000000035", 80, 150, 20).await;
    let b = seed_product(&db, "Butter 250g", "5900000000042", 200, 350, 2).await;
    let c = seed_product(&db, "Eggs Dozen", "5900000000059", 250, 400, 30).await;

    // Line 2 of 3 violates stock; lines 1 and 3 must be untouched
    let err = db
        .engine()
        .create_sale(
            CASHIER,
            cash_sale(vec![line(&a, 5), line(&b, 10), line(&c, 5)], 100000),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        EngineError::Core(CoreError::InsufficientStock { .. })
    ));

    assert_eq!(live_quantity(&db, &a.id).await, 20);
    assert_eq!(live_quantity(&db, &b.id).await, 2);
    assert_eq!(live_quantity(&db, &c.id).await, 30);
    assert_eq!(db.sales().count().await.unwrap(), 0);
    assert_eq!(db.ledger().count().await.unwrap(), 0);
}

#[tokio::test]
async fn arithmetic_identity_with_discount() {
    let db = test_db().await;
    let a = seed_product(&db, "Doritos Nacho 100g", "5900000000066", 120, 249, 50).await;
    let b = seed_product(&db, "Sprite 500ml", "5900000000073", 90, 199, 50).await;

    let request = SaleRequest {
        lines: vec![line(&a, 3), line(&b, 2)],
        discount_cents: 145,
        tax_bps: 0,
        payment_method: PaymentMethod::Card,
        cash_received_cents: None,
    };

    let completed = db.engine().create_sale(CASHIER, request).await.unwrap();

    // subtotal = sum of line totals, each = unit price * quantity
    let expected_subtotal: i64 = completed.items.iter().map(|i| i.line_total_cents).sum();
    for item in &completed.items {
        assert_eq!(item.line_total_cents, item.unit_price_cents * item.quantity);
    }
    assert_eq!(completed.sale.subtotal_cents, expected_subtotal);
    assert_eq!(completed.sale.subtotal_cents, 3 * 249 + 2 * 199);

    // total = subtotal - discount + tax
    assert_eq!(
        completed.sale.total_cents,
        completed.sale.subtotal_cents - completed.sale.discount_cents + completed.sale.tax_cents
    );

    // non-cash: no change
    assert_eq!(completed.sale.change_cents, 0);
}

#[tokio::test]
async fn sale_snapshot_survives_product_edits() {
    let db = test_db().await;
    let p = seed_product(&db, "Greek Yogurt 400g", "5900000000080", 150, 320, 40).await;

    let completed = db
        .engine()
        .create_sale(CASHIER, cash_sale(vec![line(&p, 4)], 2000))
        .await
        .unwrap();

    // Reprice and rename the product after the sale
    let mut edited = db.products().get_by_id(&p.id).await.unwrap().unwrap();
    edited.name = "Greek Yogurt 400g NEW".to_string();
    edited.selling_price_cents = 999;
    db.products().update(&edited).await.unwrap();

    // The persisted sale still carries the snapshots from sale time
    let reread = db
        .sales()
        .get_by_id(&completed.sale.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reread.items.len(), 1);
    assert_eq!(reread.items[0].product_name, "Greek Yogurt 400g");
    assert_eq!(reread.items[0].unit_price_cents, 320);
    assert_eq!(reread.items[0].quantity, 4);
    assert_eq!(reread.sale.total_cents, completed.sale.total_cents);

    // Lookup by bill number returns the same sale
    let by_bill = db
        .sales()
        .get_by_bill_number(&completed.sale.bill_number)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_bill.sale.id, completed.sale.id);
}

#[tokio::test]
async fn duplicate_sku_lines_checked_against_remaining_stock() {
    let db = test_db().await;
    let p = seed_product(&db, "Honey 250g", "5900000000097", 300, 550, 10).await;

    // 6 + 6 exceeds the 10 on hand: the second line sees only 4 left
    let err = db
        .engine()
        .create_sale(CASHIER, cash_sale(vec![line(&p, 6), line(&p, 6)], 10000))
        .await
        .unwrap_err();

    match err {
        EngineError::Core(CoreError::InsufficientStock {
            available,
            requested,
            ..
        }) => {
            assert_eq!(available, 4);
            assert_eq!(requested, 6);
        }
        other => panic!("expected InsufficientStock, got {:?}", other),
    }
    assert_eq!(live_quantity(&db, &p.id).await, 10);

    // 5 + 5 exactly drains the stock, one ledger entry per line
    let completed = db
        .engine()
        .create_sale(CASHIER, cash_sale(vec![line(&p, 5), line(&p, 5)], 10000))
        .await
        .unwrap();

    assert_eq!(completed.items.len(), 2);
    assert_eq!(live_quantity(&db, &p.id).await, 0);

    let entries = db.ledger().history_for_product(&p.id, 10).await.unwrap();
    assert_eq!(entries.len(), 2);
    // Newest first: 5 -> 0, then 10 -> 5
    assert_eq!(entries[0].quantity_before, 5);
    assert_eq!(entries[0].quantity_after, 0);
    assert_eq!(entries[1].quantity_before, 10);
    assert_eq!(entries[1].quantity_after, 5);
}

#[tokio::test]
async fn cash_below_total_rejected_without_writes() {
    let db = test_db().await;
    let p = seed_product(&db, "Sunflower Oil 1L", "5900000000103", 400, 700, 15).await;

    let err = db
        .engine()
        .create_sale(CASHIER, cash_sale(vec![line(&p, 3)], 2000))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        EngineError::Core(CoreError::InvalidPayment { .. })
    ));
    assert_eq!(live_quantity(&db, &p.id).await, 15);
    assert_eq!(db.sales().count().await.unwrap(), 0);
    assert_eq!(db.ledger().count().await.unwrap(), 0);
}

#[tokio::test]
async fn discount_exceeding_subtotal_rejected() {
    let db = test_db().await;
    let p = seed_product(&db, "Sugar 1kg", "5900000000110", 80, 120, 30).await;

    let request = SaleRequest {
        lines: vec![line(&p, 1)],
        discount_cents: 500,
        tax_bps: 0,
        payment_method: PaymentMethod::Card,
        cash_received_cents: None,
    };

    let err = db.engine().create_sale(CASHIER, request).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Core(CoreError::InvalidPayment { .. })
    ));
    assert_eq!(live_quantity(&db, &p.id).await, 30);
}

#[tokio::test]
async fn unknown_and_inactive_products_not_sellable() {
    let db = test_db().await;
    let p = seed_product(&db, "Iced Tea 500ml", "5900000000127", 100, 220, 12).await;

    // Unknown id
    let ghost = SaleLineRequest {
        product_id: Uuid::new_v4().to_string(),
        quantity: 1,
    };
    let err = db
        .engine()
        .create_sale(CASHIER, cash_sale(vec![ghost], 1000))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Core(CoreError::ProductNotFound(_))
    ));

    // Soft-deleted product surfaces the same way
    db.products().soft_delete(&p.id).await.unwrap();
    let err = db
        .engine()
        .create_sale(CASHIER, cash_sale(vec![line(&p, 1)], 1000))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Core(CoreError::ProductNotFound(_))
    ));
    assert_eq!(live_quantity(&db, &p.id).await, 12);
}

#[tokio::test]
async fn malformed_requests_rejected_before_any_write() {
    let db = test_db().await;
    let p = seed_product(&db, "Oreo 154g", "5900000000134", 90, 180, 25).await;

    // Empty cart
    let err = db
        .engine()
        .create_sale(CASHIER, SaleRequest::simple(vec![], PaymentMethod::Card))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Core(CoreError::Validation(_))
    ));

    // Zero quantity
    let err = db
        .engine()
        .create_sale(
            CASHIER,
            SaleRequest::simple(vec![line(&p, 0)], PaymentMethod::Card),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Core(CoreError::Validation(_))));

    // Cash without amount received
    let mut request = SaleRequest::simple(vec![line(&p, 1)], PaymentMethod::Cash);
    request.cash_received_cents = None;
    let err = db.engine().create_sale(CASHIER, request).await.unwrap_err();
    assert!(matches!(err, EngineError::Core(CoreError::Validation(_))));

    assert_eq!(db.sales().count().await.unwrap(), 0);
    assert_eq!(db.ledger().count().await.unwrap(), 0);
    assert_eq!(live_quantity(&db, &p.id).await, 25);
}

// =============================================================================
// Stock Adjustments
// =============================================================================

#[tokio::test]
async fn adjustment_happy_paths() {
    let db = test_db().await;
    let p = seed_product(&db, "Pringles Original 165g", "5900000000141", 150, 320, 8).await;

    // Restock +12
    let summary = db
        .engine()
        .adjust_stock(
            MANAGER,
            AdjustmentRequest {
                product_id: p.id.clone(),
                delta: 12,
                reason: StockReason::Restock,
                note: Some("back-room count".to_string()),
            },
        )
        .await
        .unwrap();

    assert_eq!(summary.delta, 12);
    assert_eq!(summary.new_quantity, 20);
    assert_eq!(summary.reason, StockReason::Restock);
    assert_eq!(live_quantity(&db, &p.id).await, 20);

    // Damage write-off -3
    let summary = db
        .engine()
        .adjust_stock(
            MANAGER,
            AdjustmentRequest {
                product_id: p.id.clone(),
                delta: -3,
                reason: StockReason::Damage,
                note: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(summary.new_quantity, 17);
    assert_eq!(live_quantity(&db, &p.id).await, 17);

    let entries = db.ledger().history_for_product(&p.id, 10).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].reason, StockReason::Damage);
    assert_eq!(entries[0].delta, -3);
    assert_eq!(entries[1].reason, StockReason::Restock);
    assert_eq!(entries[1].note.as_deref(), Some("back-room count"));
    assert!(entries.iter().all(|e| e.is_balanced()));
}

#[tokio::test]
async fn negative_adjustment_floor() {
    let db = test_db().await;
    let p = seed_product(&db, "KitKat 4-Finger", "5900000000158", 60, 120, 4).await;

    let err = db
        .engine()
        .adjust_stock(
            MANAGER,
            AdjustmentRequest {
                product_id: p.id.clone(),
                delta: -10,
                reason: StockReason::Damage,
                note: None,
            },
        )
        .await
        .unwrap_err();

    match err {
        EngineError::Core(CoreError::InvalidAdjustment {
            name,
            on_hand,
            delta,
        }) => {
            assert_eq!(name, "KitKat 4-Finger");
            assert_eq!(on_hand, 4);
            assert_eq!(delta, -10);
        }
        other => panic!("expected InvalidAdjustment, got {:?}", other),
    }

    assert_eq!(live_quantity(&db, &p.id).await, 4);
    assert_eq!(db.ledger().count().await.unwrap(), 0);
}

// =============================================================================
// Purchase Receipts
// =============================================================================

#[tokio::test]
async fn purchase_updates_cost_and_stock() {
    let db = test_db().await;
    // cost 20.00, quantity 10
    let p = seed_product(&db, "Cold Brew Coffee 240ml", "5900000000165", 2000, 3500, 10).await;

    let completed = db
        .engine()
        .record_purchase(
            MANAGER,
            PurchaseRequest {
                supplier: "Acme Traders".to_string(),
                lines: vec![PurchaseLineRequest {
                    product_id: p.id.clone(),
                    quantity: 50,
                    unit_cost_cents: 2200,
                }],
            },
        )
        .await
        .unwrap();

    assert!(completed.purchase.invoice_number.starts_with("PO-"));
    assert_eq!(completed.purchase.supplier, "Acme Traders");
    assert_eq!(completed.purchase.subtotal_cents, 50 * 2200);
    assert_eq!(completed.purchase.total_cents, 50 * 2200);
    assert_eq!(completed.purchase.received_by, MANAGER);
    assert_eq!(completed.items.len(), 1);
    assert_eq!(completed.items[0].line_total_cents, 50 * 2200);

    // Last-cost-wins + stock increment
    let updated = db.products().get_by_id(&p.id).await.unwrap().unwrap();
    assert_eq!(updated.cost_price_cents, 2200);
    assert_eq!(updated.quantity, 60);

    let entries = db.ledger().history_for_product(&p.id, 10).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].delta, 50);
    assert_eq!(entries[0].reason, StockReason::Purchase);
    assert_eq!(entries[0].cost_impact_cents, Some(50 * 2200));
    assert_eq!(
        entries[0].reference.as_deref(),
        Some(completed.purchase.invoice_number.as_str())
    );

    // Read back through the journal
    let reread = db
        .purchases()
        .get_by_id(&completed.purchase.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reread.items.len(), 1);
    assert_eq!(reread.items[0].unit_cost_cents, 2200);
}

#[tokio::test]
async fn purchase_rolls_back_on_unknown_product() {
    let db = test_db().await;
    let p = seed_product(&db, "Mineral Water 1.5L", "5900000000172", 50, 120, 40).await;

    let err = db
        .engine()
        .record_purchase(
            MANAGER,
            PurchaseRequest {
                supplier: "Acme Traders".to_string(),
                lines: vec![
                    PurchaseLineRequest {
                        product_id: p.id.clone(),
                        quantity: 10,
                        unit_cost_cents: 55,
                    },
                    PurchaseLineRequest {
                        product_id: Uuid::new_v4().to_string(),
                        quantity: 5,
                        unit_cost_cents: 100,
                    },
                ],
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        EngineError::Core(CoreError::ProductNotFound(_))
    ));

    // First line's cost update and increment were rolled back too
    let unchanged = db.products().get_by_id(&p.id).await.unwrap().unwrap();
    assert_eq!(unchanged.cost_price_cents, 50);
    assert_eq!(unchanged.quantity, 40);
    assert_eq!(db.purchases().count().await.unwrap(), 0);
    assert_eq!(db.ledger().count().await.unwrap(), 0);
}

// =============================================================================
// Ledger Audit Identity
// =============================================================================

#[tokio::test]
async fn ledger_deltas_reconcile_with_live_quantity() {
    let db = test_db().await;
    let q0 = 30;
    let p = seed_product(&db, "Spaghetti 500g", "5900000000189", 110, 210, q0).await;

    db.engine()
        .create_sale(CASHIER, cash_sale(vec![line(&p, 7)], 5000))
        .await
        .unwrap();
    db.engine()
        .adjust_stock(
            MANAGER,
            AdjustmentRequest {
                product_id: p.id.clone(),
                delta: -2,
                reason: StockReason::Expired,
                note: None,
            },
        )
        .await
        .unwrap();
    db.engine()
        .record_purchase(
            MANAGER,
            PurchaseRequest {
                supplier: "Pasta Co".to_string(),
                lines: vec![PurchaseLineRequest {
                    product_id: p.id.clone(),
                    quantity: 24,
                    unit_cost_cents: 105,
                }],
            },
        )
        .await
        .unwrap();

    let live = live_quantity(&db, &p.id).await;
    assert_eq!(live, 30 - 7 - 2 + 24);

    // Sum of all deltas equals live - Q0
    let net = db.ledger().net_change_for_product(&p.id).await.unwrap();
    assert_eq!(net, live - q0);

    // Every entry balanced; newest entry's after == live quantity
    let entries = db.ledger().history_for_product(&p.id, 10).await.unwrap();
    assert_eq!(entries.len(), 3);
    assert!(entries.iter().all(|e| e.is_balanced()));
    assert_eq!(entries[0].quantity_after, live);
}

// =============================================================================
// Catalog Guard Rails
// =============================================================================

#[tokio::test]
async fn duplicate_barcode_is_a_conflict() {
    let db = test_db().await;
    seed_product(&db, "Snickers Bar", "5900000000196", 50, 110, 60).await;

    let err = db
        .products()
        .insert(&product("Snickers Bar Copy", "5900000000196", 50, 110, 60))
        .await
        .unwrap_err();

    assert!(matches!(err, DbError::UniqueViolation { .. }));
}

#[tokio::test]
async fn product_update_never_touches_quantity() {
    let db = test_db().await;
    let p = seed_product(&db, "Lays Classic 90g", "5900000000202", 70, 150, 33).await;

    let mut edited = p.clone();
    edited.selling_price_cents = 180;
    edited.quantity = 9999; // stale / tampered value must be ignored
    db.products().update(&edited).await.unwrap();

    let reread = db.products().get_by_id(&p.id).await.unwrap().unwrap();
    assert_eq!(reread.selling_price_cents, 180);
    assert_eq!(reread.quantity, 33);
}

#[tokio::test]
async fn hard_delete_refused_while_history_exists() {
    let db = test_db().await;
    let p = seed_product(&db, "Gummy Bears 150g", "5900000000219", 80, 160, 10).await;

    db.engine()
        .create_sale(CASHIER, cash_sale(vec![line(&p, 1)], 200))
        .await
        .unwrap();

    let err = db.products().delete(&p.id).await.unwrap_err();
    assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    assert!(db.products().get_by_id(&p.id).await.unwrap().is_some());

    // A product with no history deletes cleanly
    let fresh = seed_product(&db, "Cream Cheese 180g", "5900000000226", 120, 240, 5).await;
    db.products().delete(&fresh.id).await.unwrap();
    assert!(db.products().get_by_id(&fresh.id).await.unwrap().is_none());
}
