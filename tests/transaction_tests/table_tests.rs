//! Transaction Table Tests
//!
//! Tests verify:
//! - Id allocation (monotonic, starting at 1, never reused)
//! - Staging order
//! - take_and_clear removes the transaction
//! - Unknown transaction errors
//! - Concurrent begin/stage

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use cooldb::transaction::{TransactionTable, MAX_TXID, NO_TRANSACTION};
use cooldb::wal::Operation;
use cooldb::CoolDbError;

// =============================================================================
// Id Allocation Tests
// =============================================================================

#[test]
fn test_first_id_is_one() {
    let table = TransactionTable::new();
    let id = table.begin().unwrap();
    assert_eq!(id, 1);
    assert_ne!(id, NO_TRANSACTION);
}

#[test]
fn test_ids_are_monotonic() {
    let table = TransactionTable::new();
    let ids: Vec<u64> = (0..10).map(|_| table.begin().unwrap()).collect();
    assert_eq!(ids, (1..=10).collect::<Vec<u64>>());
}

#[test]
fn test_ids_not_reused_after_removal() {
    let table = TransactionTable::new();
    let first = table.begin().unwrap();
    table.take_and_clear(first).unwrap();

    let second = table.begin().unwrap();
    assert!(second > first);
}

#[test]
fn test_starting_after() {
    let table = TransactionTable::starting_after(41);
    assert_eq!(table.begin().unwrap(), 42);
}

#[test]
fn test_last_id_then_exhausted() {
    let table = TransactionTable::starting_after(MAX_TXID - 1);
    assert_eq!(table.begin().unwrap(), MAX_TXID);

    assert!(matches!(table.begin(), Err(CoolDbError::TransactionIdsExhausted)));
    // Failure does not disturb the transaction already handed out
    assert!(table.is_active(MAX_TXID));
    assert_eq!(table.active_count(), 1);
}

#[test]
fn test_starting_after_max_never_wraps() {
    for last in [MAX_TXID, u64::MAX] {
        let table = TransactionTable::starting_after(last);
        assert!(matches!(table.begin(), Err(CoolDbError::TransactionIdsExhausted)));
        assert!(!table.is_active(NO_TRANSACTION));
    }
}

// =============================================================================
// Staging Tests
// =============================================================================

#[test]
fn test_begin_registers_empty_transaction() {
    let table = TransactionTable::new();
    let tx = table.begin().unwrap();

    assert!(table.is_active(tx));
    assert_eq!(table.staged_len(tx), Some(0));
    assert_eq!(table.active_count(), 1);
}

#[test]
fn test_stage_preserves_order() {
    let table = TransactionTable::new();
    let tx = table.begin().unwrap();

    table.stage(tx, Operation::set(tx, "k1", "v1")).unwrap();
    table.stage(tx, Operation::set(tx, "k2", "v2")).unwrap();
    table.stage(tx, Operation::delete(tx, "k1")).unwrap();

    let staged = table.take_and_clear(tx).unwrap();
    assert_eq!(
        staged,
        vec![
            Operation::set(tx, "k1", "v1"),
            Operation::set(tx, "k2", "v2"),
            Operation::delete(tx, "k1"),
        ]
    );
}

#[test]
fn test_transactions_are_isolated() {
    let table = TransactionTable::new();
    let a = table.begin().unwrap();
    let b = table.begin().unwrap();

    table.stage(a, Operation::set(a, "shared", "from_a")).unwrap();
    table.stage(b, Operation::set(b, "shared", "from_b")).unwrap();
    table.stage(b, Operation::delete(b, "other")).unwrap();

    assert_eq!(table.staged_len(a), Some(1));
    assert_eq!(table.staged_len(b), Some(2));
    assert_eq!(table.take_and_clear(a).unwrap(), vec![Operation::set(a, "shared", "from_a")]);
    assert!(table.is_active(b));
}

#[test]
fn test_take_and_clear_removes() {
    let table = TransactionTable::new();
    let tx = table.begin().unwrap();
    table.stage(tx, Operation::set(tx, "k", "v")).unwrap();

    table.take_and_clear(tx).unwrap();

    assert!(!table.is_active(tx));
    assert_eq!(table.staged_len(tx), None);
    assert_eq!(table.active_count(), 0);
}

// =============================================================================
// Unknown Transaction Tests
// =============================================================================

#[test]
fn test_stage_unknown_transaction() {
    let table = TransactionTable::new();
    let result = table.stage(99, Operation::set(99, "k", "v"));
    assert!(matches!(result, Err(CoolDbError::UnknownTransaction(99))));
}

#[test]
fn test_stage_after_take_fails() {
    let table = TransactionTable::new();
    let tx = table.begin().unwrap();
    table.take_and_clear(tx).unwrap();

    let result = table.stage(tx, Operation::set(tx, "k", "v"));
    assert!(matches!(result, Err(CoolDbError::UnknownTransaction(id)) if id == tx));
}

#[test]
fn test_take_twice_fails() {
    let table = TransactionTable::new();
    let tx = table.begin().unwrap();

    table.take_and_clear(tx).unwrap();
    assert!(matches!(
        table.take_and_clear(tx),
        Err(CoolDbError::UnknownTransaction(_))
    ));
}

#[test]
fn test_reserved_id_is_never_active() {
    let table = TransactionTable::new();
    table.begin().unwrap();
    assert!(!table.is_active(NO_TRANSACTION));
    assert!(table.take_and_clear(NO_TRANSACTION).is_err());
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_begin_unique_ids() {
    let table = Arc::new(TransactionTable::new());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let table = Arc::clone(&table);
            thread::spawn(move || (0..250).map(|_| table.begin().unwrap()).collect::<Vec<_>>())
        })
        .collect();

    let mut seen = HashSet::new();
    for handle in handles {
        for id in handle.join().unwrap() {
            assert!(seen.insert(id), "id {} allocated twice", id);
        }
    }
    assert_eq!(seen.len(), 2000);
    assert_eq!(table.active_count(), 2000);
}

#[test]
fn test_concurrent_stage_on_distinct_transactions() {
    let table = Arc::new(TransactionTable::new());
    let ids: Vec<u64> = (0..4).map(|_| table.begin().unwrap()).collect();

    let handles: Vec<_> = ids
        .iter()
        .map(|&tx| {
            let table = Arc::clone(&table);
            thread::spawn(move || {
                for i in 0..100 {
                    table
                        .stage(tx, Operation::set(tx, format!("k{}", i), "v"))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    for tx in ids {
        let staged = table.take_and_clear(tx).unwrap();
        assert_eq!(staged.len(), 100);
        assert!(staged.iter().all(|op| op.txid == tx));
        assert_eq!(staged[99].key, "k99");
    }
}

#[test]
fn test_active_ids_sorted() {
    let table = TransactionTable::new();
    let a = table.begin().unwrap();
    let b = table.begin().unwrap();
    let c = table.begin().unwrap();
    table.take_and_clear(b).unwrap();

    assert_eq!(table.active_ids(), vec![a, c]);
}
