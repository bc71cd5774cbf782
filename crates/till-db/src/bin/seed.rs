//! # Seed Data Generator
//!
//! Populates a database with test products for development.
//!
//! ## Usage
//! ```bash
//! # Generate the default catalog
//! cargo run -p till-db --bin seed
//!
//! # Custom amount / database path
//! cargo run -p till-db --bin seed -- --count 500 --db ./data/till.db
//! ```
//!
//! Each product gets a unique synthetic barcode, a cost around 60-80% of
//! its selling price, and a starting stock level, so the engine can be
//! exercised immediately against the seeded data.

use chrono::Utc;
use std::env;
use till_core::{Product, DEFAULT_REORDER_LEVEL};
use till_db::{Database, DbConfig};
use uuid::Uuid;

/// Product categories for realistic test data
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "Beverages",
        &[
            "Coca-Cola 330ml",
            "Pepsi 330ml",
            "Sprite 500ml",
            "Red Bull 250ml",
            "Orange Juice 1L",
            "Mineral Water 1.5L",
            "Iced Tea 500ml",
            "Cold Brew Coffee 240ml",
        ],
    ),
    (
        "Snacks",
        &[
            "Lays Classic 90g",
            "Doritos Nacho 100g",
            "Pringles Original 165g",
            "Snickers Bar",
            "KitKat 4-Finger",
            "Oreo 154g",
            "Salted Pretzels 200g",
            "Gummy Bears 150g",
        ],
    ),
    (
        "Dairy",
        &[
            "Whole Milk 1L",
            "Skim Milk 1L",
            "Greek Yogurt 400g",
            "Cheddar Cheese 200g",
            "Butter 250g",
            "Eggs Dozen",
            "Cream Cheese 180g",
            "Mozzarella 125g",
        ],
    ),
    (
        "Grocery",
        &[
            "White Bread 600g",
            "Spaghetti 500g",
            "Basmati Rice 1kg",
            "Canned Tomatoes 400g",
            "Peanut Butter 340g",
            "Honey 250g",
            "Sunflower Oil 1L",
            "Sugar 1kg",
        ],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();

    let mut count: usize = usize::MAX;
    let mut db_path = String::from("./till_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(usize::MAX);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Till POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Max products to generate (default: full catalog)");
                println!("  -d, --db <PATH>    Database file path (default: ./till_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Till POS Seed Data Generator");
    println!("============================");
    println!("Database: {}", db_path);
    println!();

    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Generating products...");

    let mut generated = 0;
    for (category_idx, (category, names)) in CATEGORIES.iter().enumerate() {
        for (product_idx, name) in names.iter().enumerate() {
            if generated >= count {
                break;
            }

            let product = generate_product(category, name, category_idx * 100 + product_idx);

            if let Err(e) = db.products().insert(&product).await {
                eprintln!("Failed to insert {}: {}", product.name, e);
                continue;
            }

            generated += 1;
        }
    }

    println!("✓ Generated {} products", generated);

    let hits = db.products().search("milk", 10).await?;
    println!("  Search 'milk': {} results", hits.len());

    let value = db.reports().inventory_value().await?;
    println!(
        "  Inventory: {} units across {} products",
        value.total_units, value.total_products
    );

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Generates a single product with deterministic pseudo-random data.
fn generate_product(category: &str, name: &str, seed: usize) -> Product {
    let now = Utc::now();

    // Synthetic EAN-13-shaped barcode (checksum not valid)
    let barcode = format!("590{:010}", seed);

    // Selling price 1.99 - 9.99
    let selling_price_cents = 199 + ((seed * 17) % 800) as i64;

    // Cost 60-80% of selling price
    let cost_pct = 60 + (seed % 20) as i64;
    let cost_price_cents = selling_price_cents * cost_pct / 100;

    Product {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        barcode,
        description: Some(format!("{} / {}", category, name)),
        cost_price_cents,
        selling_price_cents,
        wholesale_price_cents: None,
        quantity: (seed % 101) as i64,
        reorder_level: DEFAULT_REORDER_LEVEL,
        expiry_date: None,
        supplier: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}
