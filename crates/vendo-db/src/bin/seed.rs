//! # Seed Data Generator
//!
//! Stocks a fresh machine database with a coin float and sample products.
//!
//! ## Usage
//! ```bash
//! cargo run -p vendo-db --bin seed
//!
//! # Specify database path
//! cargo run -p vendo-db --bin seed -- --db ./data/vendo.db
//!
//! # Coins per denomination (default: 20)
//! cargo run -p vendo-db --bin seed -- --float 30
//! ```
//!
//! The float is added on top of whatever the till holds; products are only
//! added to a database that has none.

use std::env;
use vendo_core::{MachineConfig, Money, Product};
use vendo_db::{Database, DbConfig};

/// Sample slots: code, name, price in stotinki, quantity.
const PRODUCTS: &[(&str, &str, u64, u32)] = &[
    ("A1", "Mineral Water 500ml", 90, 10),
    ("A2", "Sparkling Water 500ml", 100, 8),
    ("A3", "Orange Juice 330ml", 150, 6),
    ("A4", "Cola 330ml", 130, 10),
    ("B1", "Salted Peanuts", 120, 7),
    ("B2", "Potato Chips", 170, 5),
    ("B3", "Pretzels", 110, 9),
    ("C1", "Milk Chocolate Bar", 140, 10),
    ("C2", "Wafer", 60, 10),
    ("C3", "Oat Biscuits", 210, 4),
    ("D1", "Espresso Can", 250, 3),
    ("D2", "Iced Tea 500ml", 160, 8),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut float: u32 = 20;
    let mut db_path = String::from("./vendo_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--float" | "-f" => {
                if i + 1 < args.len() {
                    float = args[i + 1].parse().unwrap_or(20);
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
                println!("Vendo Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -f, --float <N>    Coins added per denomination (default: 20)");
                println!("  -d, --db <PATH>    Database file path (default: ./vendo_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Vendo Seed Data Generator");
    println!("===========================");
    println!("Database: {}", db_path);
    println!("Float:    {} coins per denomination", float);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let mut machine = db.load_machine(MachineConfig::default()).await?;

    if float > 0 {
        let denominations: Vec<_> = machine.config().denominations.iter().collect();
        for denomination in denominations {
            machine.deposit_coins(denomination, float)?;
        }
        db.coins().save_stock(&machine.coin_report()).await?;
        println!("✓ Till holds {}", machine.till_value());
    }

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping products to avoid duplicates.");
        return Ok(());
    }

    println!();
    println!("Loading products...");
    let mut loaded = 0;
    for (code, name, price, quantity) in PRODUCTS {
        let product = Product::new(code, name, Money::from_stotinki(*price), *quantity);
        if let Err(e) = db.products().insert(&product).await {
            eprintln!("Failed to insert {}: {}", product.code, e);
            continue;
        }
        println!("  {:<4} {:<24} {:>8}  x{}", product.code, product.name, product.price.to_string(), product.quantity);
        loaded += 1;
    }

    println!();
    println!("✓ Loaded {} products", loaded);
    println!("✓ Seed complete!");

    Ok(())
}
