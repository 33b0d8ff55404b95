//! # Seed Data Generator
//!
//! Populates the database with sample branches, products, and ranging
//! for development.
//!
//! ## Usage
//! ```bash
//! # Generate 200 products (default)
//! cargo run -p stockline-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p stockline-db --bin seed -- --count 1000
//!
//! # Specify database path
//! cargo run -p stockline-db --bin seed -- --db ./data/stockline.db
//! ```
//!
//! ## Generated Data
//! - 4 sample branches (only when the branches table is empty)
//! - Grocery-style products with deterministic prices (no RNG, so two
//!   runs against fresh databases produce identical data)
//! - Each product ranged at a rotating subset of branches

use std::env;

use stockline_core::Product;
use stockline_db::{seed, Database, DbConfig};

/// Base product names for generated data.
const PRODUCT_NAMES: &[&str] = &[
    "Full Cream Milk",
    "Low Fat Milk",
    "White Bread",
    "Brown Bread",
    "Sunflower Oil",
    "Cake Flour",
    "White Sugar",
    "Brown Sugar",
    "Table Salt",
    "Rooibos Tea",
    "Instant Coffee",
    "Long Grain Rice",
    "Spaghetti",
    "Baked Beans",
    "Tomato Sauce",
    "Peanut Butter",
    "Apricot Jam",
    "Cheddar Cheese",
    "Eggs Dozen",
    "Margarine",
    "Bananas",
    "Apples",
    "Potatoes",
    "Onions",
    "Tomatoes",
];

/// Size variants with a price addon in cents.
const SIZES: &[(&str, i64)] = &[
    ("500g", 0),
    ("1kg", 150),
    ("2kg", 400),
    ("500ml", 0),
    ("1L", 100),
    ("2L", 250),
    ("6-Pack", 500),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut db_path = String::from("./stockline_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(200);
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
                println!("Stockline Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: ./stockline_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Stockline Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let seeded = seed::seed_sample_branches(&db).await?;
    if seeded > 0 {
        println!("✓ Seeded {} sample branches", seeded);
    }
    let branch_ids: Vec<i64> = db.branches().list().await?.into_iter().map(|b| b.id).collect();

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
    let start = std::time::Instant::now();

    'outer: for (name_idx, name) in PRODUCT_NAMES.iter().cycle().enumerate() {
        for (size_idx, (size, price_addon)) in SIZES.iter().enumerate() {
            if generated >= count {
                break 'outer;
            }

            let seed = name_idx * SIZES.len() + size_idx;
            let product = generate_product(name, size, *price_addon, seed);

            let product_id = match db.products().insert(&product).await {
                Ok(id) => id,
                Err(e) => {
                    eprintln!("Failed to insert {}: {}", product.name, e);
                    continue;
                }
            };

            // Range each product at a rotating subset of branches
            for (branch_idx, branch_id) in branch_ids.iter().enumerate() {
                if (seed + branch_idx) % 3 != 0 {
                    db.assignments().add(*branch_id, product_id).await?;
                }
            }

            generated += 1;
            if generated % 100 == 0 {
                println!("  Generated {} products...", generated);
            }
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} products in {:?}", generated, elapsed);
    println!(
        "  Assignments: {}",
        db.assignments().count().await?
    );

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Generates a single product with deterministic data.
fn generate_product(name: &str, size: &str, price_addon: i64, seed: usize) -> Product {
    // Base price R9.99 - R89.99, stepped by the seed index
    let base_price = 999 + ((seed * 37) % 8000) as i64;

    // Loose produce is weighed at the till
    let weighted = matches!(name, "Bananas" | "Apples" | "Potatoes" | "Onions" | "Tomatoes");

    Product {
        id: 0,
        name: format!("{} {}", name, size),
        weighted,
        suggested_price_cents: base_price + price_addon,
    }
}
