//! Subcommand handlers.
//!
//! Each handler calls one [`VendingMachine`] operation and renders the
//! result through [`Output`]. Engine errors are returned unchanged so
//! `main` can print their code.

pub mod buy;

use anyhow::Result;
use serde::Serialize;

use vend_core::cash::CHANGE_DENOMINATIONS;
use vend_core::{CashCounts, CashEntry, Denomination, OperatingStatus};
use vend_db::migrations::migration_status;
use vend_engine::VendingMachine;

use crate::output::{self, Output};

#[derive(Serialize)]
struct StatusReport {
    #[serde(flatten)]
    status: OperatingStatus,
    reasons: Vec<&'static str>,
    database_ok: bool,
    migrations_applied: usize,
    migrations_total: usize,
}

pub async fn status(vm: &VendingMachine, out: &Output) -> Result<()> {
    let status = vm.operating_status().await?;
    let database_ok = vm.database().health_check().await;
    let (total, applied) = migration_status(vm.database().pool()).await?;

    let report = StatusReport {
        status,
        reasons: status.reasons(),
        database_ok,
        migrations_applied: applied,
        migrations_total: total,
    };

    out.emit(&report, || {
        output::print_status(&status);
        println!("   Database:            {}", if database_ok { "ok" } else { "unreachable" });
        println!("   Migrations:          {}/{}", applied, total);
    })
}

pub async fn items(vm: &VendingMachine, out: &Output, available: bool) -> Result<()> {
    let items = if available {
        vm.available_items().await?
    } else {
        vm.items().await?
    };

    out.emit(&items, || output::print_items(&items))
}

#[derive(Serialize)]
struct CashReport {
    change_reserve: Vec<CashEntry>,
    collection_box: Vec<CashEntry>,
}

pub async fn cash(vm: &VendingMachine, out: &Output) -> Result<()> {
    let reserve = vm.change_reserve().await?;
    let collection = vm.collection_box().await?;

    let report = CashReport {
        change_reserve: reserve.entries(),
        collection_box: collection.entries(),
    };

    out.emit(&report, || {
        output::print_cash("Change reserve", &reserve);
        output::print_cash("Collection box", &collection);
    })
}

pub async fn add(
    vm: &VendingMachine,
    out: &Output,
    name: &str,
    price: i64,
    stock: i64,
) -> Result<()> {
    let item = vm.add_item(name, price, stock).await?;

    out.emit(&item, || {
        println!("✅ Added '{}' at {} THB, stock {}", item.name, item.price, item.stock);
    })
}

pub async fn delete(vm: &VendingMachine, out: &Output, name: &str) -> Result<()> {
    vm.delete_item(name).await?;

    out.emit(&serde_json::json!({ "deleted": name.trim().to_lowercase() }), || {
        println!("🗑  Deleted '{}'", name.trim());
    })
}

pub async fn restock(vm: &VendingMachine, out: &Output, name: &str, amount: i64) -> Result<()> {
    let item = vm.restock_item(name, amount).await?;

    out.emit(&item, || {
        println!("📦 '{}' now has {} in stock", item.name, item.stock);
    })
}

pub async fn refill(
    vm: &VendingMachine,
    out: &Output,
    denomination: Denomination,
    amount: i64,
) -> Result<()> {
    let count = vm.refill_change(denomination, amount).await?;
    let entry = CashEntry {
        denomination,
        count,
    };

    out.emit(&entry, || {
        println!("🪙 {} reserve is now {}", denomination, count);
    })
}

pub async fn refill_all(vm: &VendingMachine, out: &Output, amount: i64) -> Result<()> {
    let amounts: CashCounts = CHANGE_DENOMINATIONS.iter().map(|&d| (d, amount)).collect();
    let reserve = vm.refill_all(&amounts).await?;

    out.emit(&reserve.entries(), || {
        output::print_cash("Change reserve", &reserve);
    })
}

pub async fn collect(vm: &VendingMachine, out: &Output) -> Result<()> {
    let collected = vm.collect_money().await?;

    out.emit(&collected.entries(), || {
        output::print_cash("Collected", &collected);
    })
}
