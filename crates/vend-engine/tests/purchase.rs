//! End-to-end purchase tests against an in-memory store.

use vend_core::{CashCounts, CoreError, Denomination};
use vend_db::{Database, DbConfig};
use vend_engine::{
    tender_channel, ErrorCode, PurchaseEvent, PurchaseOutcome, TenderHandle, VendError,
    VendingMachine,
};

use Denomination::{Five, Hundred, One, Ten, Twenty};

// =============================================================================
// Helpers
// =============================================================================

/// Machine with a healthy catalog and 5 of every change denomination.
async fn stocked_machine() -> VendingMachine {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let vm = VendingMachine::new(db);

    vm.add_item("Coffee", 37, 3).await.unwrap();
    vm.add_item("Water", 15, 3).await.unwrap();
    vm.add_item("Tea", 23, 3).await.unwrap();

    let refill: CashCounts = [(Twenty, 5), (Ten, 5), (Five, 5), (One, 5)]
        .into_iter()
        .collect();
    vm.refill_all(&refill).await.unwrap();
    vm
}

/// Answers every `TenderRequired` with the next value, cancelling once the
/// values run out. Returns every event seen.
async fn pay(mut handle: TenderHandle, values: Vec<i64>) -> Vec<PurchaseEvent> {
    let mut values = values.into_iter();
    let mut events = Vec::new();
    while let Some(event) = handle.next_event().await {
        if matches!(event, PurchaseEvent::TenderRequired { .. }) {
            match values.next() {
                Some(value) => {
                    handle.insert(value).await;
                }
                None => {
                    handle.cancel().await;
                }
            }
        }
        events.push(event);
    }
    events
}

struct Ledgers {
    reserve: CashCounts,
    collection: CashCounts,
    stock: i64,
}

async fn ledgers(vm: &VendingMachine, item: &str) -> Ledgers {
    Ledgers {
        reserve: vm.change_reserve().await.unwrap(),
        collection: vm.collection_box().await.unwrap(),
        stock: vm.item(item).await.unwrap().stock,
    }
}

fn counts(pairs: &[(Denomination, i64)]) -> CashCounts {
    pairs.iter().copied().collect()
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn exact_change_from_ones() {
    let vm = stocked_machine().await;
    let mut session = vm.enter_purchase_mode().await.unwrap();

    let (handle, port) = tender_channel(8);
    let (outcome, _) = tokio::join!(session.purchase("coffee", port), pay(handle, vec![20, 20]));

    let receipt = match outcome.unwrap() {
        PurchaseOutcome::Completed(receipt) => receipt,
        other => panic!("expected completion, got {:?}", other),
    };
    assert_eq!(receipt.price, 37);
    assert_eq!(receipt.total_tendered, 40);
    assert_eq!(receipt.change_due, 3);
    assert_eq!(receipt.change_counts(), counts(&[(One, 3)]));

    let after = ledgers(&vm, "coffee").await;
    assert_eq!(
        after.reserve,
        counts(&[(Twenty, 5), (Ten, 5), (Five, 5), (One, 2)])
    );
    assert_eq!(after.collection.get(Twenty), 2);
    assert_eq!(after.stock, 2);
}

#[tokio::test]
async fn exact_tender_needs_no_change() {
    let vm = stocked_machine().await;
    let reserve_before = vm.change_reserve().await.unwrap();
    let mut session = vm.enter_purchase_mode().await.unwrap();

    let (handle, port) = tender_channel(8);
    let (outcome, _) = tokio::join!(session.purchase("water", port), pay(handle, vec![10, 5]));

    let receipt = outcome.unwrap().receipt().cloned().unwrap();
    assert_eq!(receipt.change_due, 0);
    assert!(receipt.change.is_empty());

    let after = ledgers(&vm, "water").await;
    assert_eq!(after.reserve, reserve_before);
    assert_eq!(after.collection.get(Ten), 1);
    assert_eq!(after.collection.get(Five), 1);
    assert_eq!(after.collection.total_value(), 15);
    assert_eq!(after.stock, 2);
}

#[tokio::test]
async fn infeasible_change_leaves_every_ledger_untouched() {
    let vm = stocked_machine().await;
    let mut session = vm.enter_purchase_mode().await.unwrap();

    // Drain the reserve to {20:5, 10:0, 5:3, 1:1} after the gate passed.
    let db = vm.database();
    db.change().adjust(Ten, -5).await.unwrap();
    db.change().adjust(Five, -2).await.unwrap();
    db.change().adjust(One, -4).await.unwrap();

    let before = ledgers(&vm, "tea").await;

    let (handle, port) = tender_channel(8);
    let (outcome, _) = tokio::join!(session.purchase("tea", port), pay(handle, vec![20, 20]));

    let err = outcome.unwrap_err();
    assert!(matches!(
        err,
        VendError::Domain(CoreError::InsufficientChange {
            change_due: 17,
            shortfall: 1
        })
    ));
    assert_eq!(err.code(), ErrorCode::InsufficientChange);

    let after = ledgers(&vm, "tea").await;
    assert_eq!(after.reserve, before.reserve);
    assert_eq!(after.collection, before.collection);
    assert_eq!(after.stock, before.stock);
}

#[tokio::test]
async fn half_the_catalog_empty_blocks_purchase_mode() {
    let vm = stocked_machine().await;
    vm.add_item("Chips", 20, 0).await.unwrap();
    vm.database().items().adjust_stock("tea", -3).await.unwrap();

    let status = vm.operating_status().await.unwrap();
    assert!(status.low_stock);
    assert!(!status.operational);

    let err = vm.enter_purchase_mode().await.unwrap_err();
    assert!(matches!(err, VendError::Domain(CoreError::NotOperational { .. })));
    assert!(err.to_string().contains("low stock"));
}

#[tokio::test]
async fn full_collection_box_blocks_purchase_mode() {
    let vm = stocked_machine().await;
    vm.database().collection().increment(Hundred, 100).await.unwrap();

    let status = vm.operating_status().await.unwrap();
    assert!(status.collection_box_full);
    assert!(vm.enter_purchase_mode().await.is_err());

    let collected = vm.collect_money().await.unwrap();
    assert_eq!(collected.total_value(), 10_000);
    assert!(vm.enter_purchase_mode().await.is_ok());
}

// =============================================================================
// Tender Loop
// =============================================================================

#[tokio::test]
async fn rejected_values_are_not_counted() {
    let vm = stocked_machine().await;
    let mut session = vm.enter_purchase_mode().await.unwrap();

    let (handle, port) = tender_channel(8);
    let (outcome, events) = tokio::join!(
        session.purchase("coffee", port),
        pay(handle, vec![3, 50, 20, 0, 20])
    );

    let receipt = outcome.unwrap().receipt().cloned().unwrap();
    assert_eq!(receipt.total_tendered, 40);
    assert_eq!(receipt.tender_counts(), counts(&[(Twenty, 2)]));

    let rejected: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            PurchaseEvent::TenderRejected { value } => Some(*value),
            _ => None,
        })
        .collect();
    assert_eq!(rejected, vec![3, 50, 0]);
}

#[tokio::test]
async fn overpaying_with_a_hundred() {
    let vm = stocked_machine().await;
    let mut session = vm.enter_purchase_mode().await.unwrap();

    let (handle, port) = tender_channel(8);
    let (outcome, _) = tokio::join!(session.purchase("coffee", port), pay(handle, vec![100]));

    let receipt = outcome.unwrap().receipt().cloned().unwrap();
    assert_eq!(receipt.change_due, 63);
    assert_eq!(
        receipt.change_counts(),
        counts(&[(Twenty, 3), (One, 3)])
    );

    let after = ledgers(&vm, "coffee").await;
    assert_eq!(after.collection.get(Hundred), 1);
    assert_eq!(after.reserve.get(Hundred), 0);
}

#[tokio::test]
async fn cancel_leaves_ledgers_unchanged() {
    let vm = stocked_machine().await;
    let before = ledgers(&vm, "coffee").await;
    let mut session = vm.enter_purchase_mode().await.unwrap();

    let (handle, port) = tender_channel(8);
    let (outcome, events) =
        tokio::join!(session.purchase("coffee", port), pay(handle, vec![20, 10]));

    assert_eq!(outcome.unwrap(), PurchaseOutcome::Cancelled);
    assert!(events.contains(&PurchaseEvent::TenderRequired {
        price: 37,
        total: 30,
        remaining: 7
    }));

    let after = ledgers(&vm, "coffee").await;
    assert_eq!(after.reserve, before.reserve);
    assert_eq!(after.collection, before.collection);
    assert_eq!(after.stock, before.stock);
}

#[tokio::test]
async fn out_of_stock_is_refused_without_prompting() {
    let vm = stocked_machine().await;
    vm.add_item("Chips", 20, 0).await.unwrap();
    let mut session = vm.enter_purchase_mode().await.unwrap();

    let (handle, port) = tender_channel(8);
    let (outcome, events) = tokio::join!(session.purchase("chips", port), pay(handle, vec![20]));

    let err = outcome.unwrap_err();
    assert_eq!(err.code(), ErrorCode::OutOfStock);
    assert!(events.is_empty());
    assert_eq!(vm.collection_box().await.unwrap().total_value(), 0);
}

#[tokio::test]
async fn unknown_item_is_not_found() {
    let vm = stocked_machine().await;
    let mut session = vm.enter_purchase_mode().await.unwrap();

    let (handle, port) = tender_channel(8);
    let (outcome, _) = tokio::join!(session.purchase("soda", port), pay(handle, vec![]));

    assert_eq!(outcome.unwrap_err().code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn lookup_is_case_insensitive() {
    let vm = stocked_machine().await;

    let err = vm.add_item("coffee", 40, 1).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValidationError);

    let mut session = vm.enter_purchase_mode().await.unwrap();
    let (handle, port) = tender_channel(8);
    let (outcome, _) = tokio::join!(session.purchase("COFFEE", port), pay(handle, vec![20, 20]));

    assert_eq!(outcome.unwrap().receipt().unwrap().item, "coffee");
}

// =============================================================================
// Persistence Failures
// =============================================================================

#[tokio::test]
async fn commit_failure_rolls_back_the_whole_purchase() {
    let vm = stocked_machine().await;
    let before = ledgers(&vm, "coffee").await;
    let mut session = vm.enter_purchase_mode().await.unwrap();

    // Break the collection box table so step (b) of the commit fails after
    // step (a) already ran inside the transaction.
    sqlx_rename(&vm, "collection_box_67011755", "collection_box_broken").await;

    let (handle, port) = tender_channel(8);
    let (outcome, _) = tokio::join!(session.purchase("coffee", port), pay(handle, vec![20, 20]));

    let err = outcome.unwrap_err();
    assert!(matches!(err, VendError::Persistence(_)));
    assert_eq!(err.code(), ErrorCode::PersistenceError);

    sqlx_rename(&vm, "collection_box_broken", "collection_box_67011755").await;

    let after = ledgers(&vm, "coffee").await;
    assert_eq!(after.reserve, before.reserve);
    assert_eq!(after.collection, before.collection);
    assert_eq!(after.stock, before.stock);
}

#[tokio::test]
async fn closed_store_surfaces_persistence_error() {
    let vm = stocked_machine().await;
    let mut session = vm.enter_purchase_mode().await.unwrap();
    vm.database().close().await;

    let (handle, port) = tender_channel(8);
    let (outcome, _) = tokio::join!(session.purchase("coffee", port), pay(handle, vec![20, 20]));

    assert_eq!(outcome.unwrap_err().code(), ErrorCode::PersistenceError);
}

async fn sqlx_rename(vm: &VendingMachine, from: &str, to: &str) {
    let sql = format!("ALTER TABLE {} RENAME TO {}", from, to);
    sqlx::query(&sql)
        .execute(vm.database().pool())
        .await
        .unwrap();
}

// =============================================================================
// Ledger Properties
// =============================================================================

#[tokio::test]
async fn every_purchase_balances() {
    let vm = stocked_machine().await;
    let mut session = vm.enter_purchase_mode().await.unwrap();

    let tenders: Vec<(&str, Vec<i64>)> = vec![
        ("coffee", vec![20, 10, 10]),
        ("water", vec![20]),
        ("tea", vec![5, 5, 5, 10]),
        ("water", vec![100]),
    ];

    for (item, values) in tenders {
        let before = ledgers(&vm, item).await;

        let (handle, port) = tender_channel(8);
        let (outcome, _) = tokio::join!(session.purchase(item, port), pay(handle, values));
        let receipt = outcome.unwrap().receipt().cloned().unwrap();

        let change = receipt.change_counts();
        let tendered = receipt.tender_counts();
        assert_eq!(change.total_value() + receipt.price, receipt.total_tendered);

        let after = ledgers(&vm, item).await;
        for (denomination, count) in before.reserve.iter() {
            let expected = count - change.get(denomination);
            assert!(expected >= 0);
            assert_eq!(after.reserve.get(denomination), expected);
        }
        for (denomination, count) in before.collection.iter() {
            assert_eq!(
                after.collection.get(denomination),
                count + tendered.get(denomination)
            );
        }
        assert_eq!(after.stock, before.stock - 1);
    }
}
