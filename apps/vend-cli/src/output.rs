//! Human and `--json` rendering.

use anyhow::Result;
use serde::Serialize;

use vend_core::{CashCounts, Item, OperatingStatus, Receipt};
use vend_engine::{ErrorReport, VendError};

pub struct Output {
    json: bool,
}

impl Output {
    pub fn new(json: bool) -> Self {
        Output { json }
    }

    pub fn is_json(&self) -> bool {
        self.json
    }

    /// Prints `value` as JSON, or runs `human` otherwise.
    pub fn emit<T: Serialize>(&self, value: &T, human: impl FnOnce()) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            human();
        }
        Ok(())
    }

    /// Reports a failed command. Engine errors keep their code.
    pub fn error(&self, err: &anyhow::Error) {
        let report = match err.downcast_ref::<VendError>() {
            Some(vend) => vend.report(),
            None => {
                if self.json {
                    let body = serde_json::json!({ "code": "ERROR", "message": format!("{:#}", err) });
                    println!("{}", body);
                } else {
                    eprintln!("❌ {:#}", err);
                }
                return;
            }
        };

        if self.json {
            print_report_json(&report);
        } else {
            eprintln!("❌ [{}] {}", report.code, report.message);
        }
    }
}

fn print_report_json(report: &ErrorReport) {
    match serde_json::to_string(report) {
        Ok(body) => println!("{}", body),
        Err(_) => println!("{{\"code\":\"{}\"}}", report.code),
    }
}

pub fn print_items(items: &[Item]) {
    if items.is_empty() {
        println!("(no items)");
        return;
    }

    println!("{:<24} {:>7} {:>7}", "ITEM", "PRICE", "STOCK");
    println!("{}", "─".repeat(40));
    for item in items {
        let stock = if item.is_in_stock() {
            item.stock.to_string()
        } else {
            "sold out".to_string()
        };
        println!("{:<24} {:>7} {:>7}", item.name, item.price, stock);
    }
}

pub fn print_cash(title: &str, counts: &CashCounts) {
    println!("{}", title);
    for entry in counts.entries() {
        println!("  {:>7}  x{}", entry.denomination.label(), entry.count);
    }
    println!("  {:>7}  {} THB", "total", counts.total_value());
}

pub fn print_status(status: &OperatingStatus) {
    let flag = |on: bool| if on { "⚠ yes" } else { "✓ no" };

    if status.operational {
        println!("✅ Operational");
    } else {
        println!("⛔ Not operational: {}", status.reasons().join(", "));
    }
    println!("   Low stock:           {}", flag(status.low_stock));
    println!("   Insufficient change: {}", flag(status.insufficient_change));
    println!("   Collection box full: {}", flag(status.collection_box_full));
}

pub fn print_receipt(receipt: &Receipt) {
    println!();
    println!("✅ Enjoy your {}!", receipt.item);
    println!("   Price:   {} THB", receipt.price);
    println!("   Paid:    {} THB", receipt.total_tendered);
    println!("   Change:  {} THB", receipt.change_due);
    for entry in &receipt.change {
        println!("            {} x{}", entry.denomination.label(), entry.count);
    }
    println!("   Ref:     {}", receipt.transaction_id);
}
