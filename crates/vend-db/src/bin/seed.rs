//! # Seed Data Generator
//!
//! Stocks a database with a demo catalog and fills the change reserve, so
//! the machine comes up operational during development.
//!
//! ## Usage
//! ```bash
//! # Seed ./vending_machine.db with 20 of each change denomination
//! cargo run -p vend-db --bin vend-seed
//!
//! # Custom reserve level
//! cargo run -p vend-db --bin vend-seed -- --change 50
//!
//! # Specify database path
//! cargo run -p vend-db --bin vend-seed -- --db ./data/vending_machine.db
//! ```

use std::env;
use vend_core::cash::CHANGE_DENOMINATIONS;
use vend_core::{CashCounts, Item};
use vend_db::{Database, DbConfig};

/// Demo catalog: (name, price, stock).
const CATALOG: &[(&str, i64, i64)] = &[
    ("cola", 25, 12),
    ("orange juice", 30, 10),
    ("green tea", 20, 15),
    ("water", 10, 20),
    ("coffee", 37, 8),
    ("potato chips", 15, 10),
    ("chocolate bar", 22, 6),
    ("instant noodles", 18, 9),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut change: i64 = 20;
    let mut db_path = String::from("./vending_machine.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--change" | "-c" => {
                if i + 1 < args.len() {
                    change = args[i + 1].parse().unwrap_or(20);
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
                println!("Vending machine seed data generator");
                println!();
                println!("Usage: vend-seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --change <N>   Pieces of each change denomination to add (default: 20)");
                println!("  -d, --db <PATH>    Database file path (default: ./vending_machine.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Vending machine seed");
    println!("====================");
    println!("Database: {}", db_path);
    println!("Change per denomination: {}", change);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected, migrations applied, cash tables seeded");

    let existing = db.items().count().await?;
    if existing > 0 {
        println!("⚠ Catalog already has {} items, skipping items", existing);
    } else {
        for (name, price, stock) in CATALOG {
            let item = Item::new(name, *price, *stock)?;
            if let Err(e) = db.items().insert(&item).await {
                eprintln!("Failed to insert {}: {}", name, e);
                continue;
            }
            println!("  + {:<16} {:>5} THB  x{}", item.name, item.price, item.stock);
        }
    }

    let refill: CashCounts = CHANGE_DENOMINATIONS.iter().map(|d| (*d, change)).collect();
    let reserve = db.change().refill_all(&refill).await?;

    println!();
    println!("Change reserve:");
    for entry in reserve.entries() {
        println!("  {:>7}: {}", entry.denomination.label(), entry.count);
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
