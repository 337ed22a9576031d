//! Interactive purchase.
//!
//! ```text
//! ┌──────────────┐  TenderInput   ┌────────────────────┐
//! │ stdin thread │ ─────────────► │                    │
//! └──────────────┘                │  PurchaseSession   │
//! ┌──────────────┐ PurchaseEvent  │    ::purchase      │
//! │ event printer│ ◄───────────── │                    │
//! └──────────────┘                └────────────────────┘
//! ```
//!
//! Stdin is read on a plain thread with `blocking_send`, so a pending
//! read never holds up runtime shutdown. EOF counts as cancel.

use anyhow::Result;
use std::io::{BufRead, Write};
use tokio::sync::mpsc;

use vend_engine::{tender_channel, PurchaseEvent, PurchaseOutcome, TenderInput, VendingMachine};

use crate::output::{self, Output};

pub async fn buy(vm: &VendingMachine, out: &Output, name: &str, buffer: usize) -> Result<()> {
    let mut session = vm.enter_purchase_mode().await?;

    if !out.is_json() {
        println!("Insert 1, 5, 10, 20 or 100 THB, one per line. Enter 'c' to cancel.");
    }

    let (mut handle, port) = tender_channel(buffer);
    spawn_stdin_reader(handle.input());

    let quiet = out.is_json();
    let printer = async move {
        while let Some(event) = handle.next_event().await {
            if !quiet {
                print_event(&event);
            }
        }
    };

    let (outcome, ()) = tokio::join!(session.purchase(name, port), printer);
    let outcome = outcome?;

    out.emit(&outcome, || match &outcome {
        PurchaseOutcome::Completed(receipt) => output::print_receipt(receipt),
        PurchaseOutcome::Cancelled => println!("\n↩️  Cancelled, no money taken"),
    })
}

fn spawn_stdin_reader(input: mpsc::Sender<TenderInput>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };

            let Some(message) = parse_tender(&line) else {
                eprintln!("Enter a number such as 20, or 'c' to cancel");
                continue;
            };

            if input.blocking_send(message).is_err() || message == TenderInput::Cancel {
                return;
            }
        }

        let _ = input.blocking_send(TenderInput::Cancel);
    });
}

/// `"c"`/`"cancel"` cancel; a number, optionally suffixed `THB`, is inserted
/// as-is and judged by the engine.
fn parse_tender(line: &str) -> Option<TenderInput> {
    let line = line.trim();

    if line.eq_ignore_ascii_case("c") || line.eq_ignore_ascii_case("cancel") {
        return Some(TenderInput::Cancel);
    }

    let digits = line
        .strip_suffix("THB")
        .or_else(|| line.strip_suffix("thb"))
        .unwrap_or(line)
        .trim();

    digits.parse().ok().map(TenderInput::Insert)
}

fn print_event(event: &PurchaseEvent) {
    match event {
        PurchaseEvent::TenderRequired {
            price,
            total,
            remaining,
        } => {
            print!("Paid {} of {} THB, {} to go > ", total, price, remaining);
            let _ = std::io::stdout().flush();
        }
        PurchaseEvent::TenderAccepted { denomination, .. } => {
            println!("  + {}", denomination);
        }
        PurchaseEvent::TenderRejected { value } => {
            println!("  {} is not accepted, returned", value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tender() {
        assert_eq!(parse_tender("20"), Some(TenderInput::Insert(20)));
        assert_eq!(parse_tender(" 100THB "), Some(TenderInput::Insert(100)));
        assert_eq!(parse_tender("5 thb"), Some(TenderInput::Insert(5)));
        assert_eq!(parse_tender("C"), Some(TenderInput::Cancel));
        assert_eq!(parse_tender("cancel"), Some(TenderInput::Cancel));
    }

    #[test]
    fn test_unaccepted_values_still_reach_the_engine() {
        assert_eq!(parse_tender("3"), Some(TenderInput::Insert(3)));
        assert_eq!(parse_tender("-20"), Some(TenderInput::Insert(-20)));
    }

    #[test]
    fn test_garbage_is_ignored() {
        assert_eq!(parse_tender(""), None);
        assert_eq!(parse_tender("twenty"), None);
    }
}
