//! Tests for WAL Recovery
//!
//! These tests verify:
//! - Recovery from a clean WAL
//! - Recovery from an empty WAL
//! - Recovery with a torn tail (simulated crash)
//! - Recovery with corrupted lines in the middle
//! - Verify mode (stats only, view untouched)

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use cooldb::config::WalSyncStrategy;
use cooldb::view::KvView;
use cooldb::wal::{Operation, WalRecovery, WalWriter};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_wal() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let wal_path = temp_dir.path().join("test.wal");
    (temp_dir, wal_path)
}

/// Write one committed batch per transaction through the real writer
fn write_batches(path: &PathBuf, batches: &[Vec<Operation>]) {
    let mut writer = WalWriter::open(path, WalSyncStrategy::EveryCommit).unwrap();
    for batch in batches {
        writer.append(batch).unwrap();
    }
}

fn append_raw(path: &PathBuf, bytes: &[u8]) {
    let mut file = OpenOptions::new().append(true).open(path).unwrap();
    file.write_all(bytes).unwrap();
    file.sync_all().unwrap();
}

// =============================================================================
// Recover: Clean WAL Tests
// =============================================================================

#[test]
fn test_recover_empty_file() {
    let (_temp, wal_path) = setup_temp_wal();
    File::create(&wal_path).unwrap();

    let view = KvView::new();
    let result = WalRecovery::recover(&wal_path, &view).unwrap();

    assert!(view.is_empty());
    assert_eq!(result.records_recovered, 0);
    assert_eq!(result.records_skipped, 0);
    assert_eq!(result.last_txid, 0);
    assert!(!result.torn_tail);
}

#[test]
fn test_recover_missing_file_is_error() {
    let (_temp, wal_path) = setup_temp_wal();
    let view = KvView::new();
    assert!(WalRecovery::recover(&wal_path, &view).is_err());
}

#[test]
fn test_recover_multiple_transactions() {
    let (_temp, wal_path) = setup_temp_wal();
    write_batches(
        &wal_path,
        &[
            vec![Operation::set(1, "a", "1"), Operation::set(1, "b", "2")],
            vec![Operation::set(2, "a", "3")],
            vec![Operation::delete(3, "b"), Operation::set(3, "c", "4")],
        ],
    );

    let view = KvView::new();
    let result = WalRecovery::recover(&wal_path, &view).unwrap();

    assert_eq!(result.records_recovered, 5);
    assert_eq!(result.last_txid, 3);
    assert_eq!(view.get("a"), Some("3".to_string()));
    assert_eq!(view.get("b"), None);
    assert_eq!(view.get("c"), Some("4".to_string()));
    assert_eq!(view.len(), 2);
}

#[test]
fn test_recover_set_then_delete_same_key() {
    let (_temp, wal_path) = setup_temp_wal();
    write_batches(
        &wal_path,
        &[vec![Operation::set(1, "k", "v1"), Operation::delete(1, "k")]],
    );

    let view = KvView::new();
    WalRecovery::recover(&wal_path, &view).unwrap();

    assert_eq!(view.get("k"), None);
    assert!(view.is_empty());
}

#[test]
fn test_recover_is_deterministic() {
    let (_temp, wal_path) = setup_temp_wal();
    let batches: Vec<Vec<Operation>> = (1..=20u64)
        .map(|tx| {
            vec![
                Operation::set(tx, format!("key{}", tx % 7), format!("v{}", tx)),
                Operation::delete(tx, format!("key{}", (tx + 3) % 7)),
            ]
        })
        .collect();
    write_batches(&wal_path, &batches);

    let first = KvView::new();
    let second = KvView::new();
    WalRecovery::recover(&wal_path, &first).unwrap();
    WalRecovery::recover(&wal_path, &second).unwrap();

    assert_eq!(first.snapshot(), second.snapshot());
}

#[test]
fn test_recover_ignores_commit_markers() {
    let (_temp, wal_path) = setup_temp_wal();
    write_batches(
        &wal_path,
        &[vec![Operation::set(1, "k", "v"), Operation::commit_marker(1)]],
    );

    let view = KvView::new();
    let result = WalRecovery::recover(&wal_path, &view).unwrap();

    assert_eq!(result.records_recovered, 2);
    assert_eq!(view.len(), 1);
    assert_eq!(view.get("k"), Some("v".to_string()));
}

// =============================================================================
// Recover: Torn Tail and Corruption Tests
// =============================================================================

#[test]
fn test_recover_torn_tail() {
    let (_temp, wal_path) = setup_temp_wal();
    write_batches(
        &wal_path,
        &[
            vec![Operation::set(1, "k1", "v1")],
            vec![Operation::set(2, "k2", "v2")],
        ],
    );
    append_raw(&wal_path, br#"{"type":"set","key":"k3","value":"v"#);

    let view = KvView::new();
    let result = WalRecovery::recover(&wal_path, &view).unwrap();

    assert_eq!(result.records_recovered, 2);
    assert_eq!(result.records_skipped, 1);
    assert_eq!(result.last_txid, 2);
    assert!(result.torn_tail);
    assert_eq!(view.get("k1"), Some("v1".to_string()));
    assert_eq!(view.get("k2"), Some("v2".to_string()));
    assert_eq!(view.get("k3"), None);
}

#[test]
fn test_recover_corrupt_middle_line() {
    let (_temp, wal_path) = setup_temp_wal();
    write_batches(&wal_path, &[vec![Operation::set(1, "a", "1")]]);
    append_raw(&wal_path, b"%%%corrupt%%%\n");
    write_batches(&wal_path, &[vec![Operation::set(2, "b", "2")]]);

    let view = KvView::new();
    let result = WalRecovery::recover(&wal_path, &view).unwrap();

    assert_eq!(result.records_recovered, 2);
    assert_eq!(result.records_skipped, 1);
    assert!(!result.torn_tail);
    assert_eq!(view.len(), 2);
}

#[test]
fn test_recover_after_sealed_torn_tail_is_stable() {
    let (_temp, wal_path) = setup_temp_wal();
    write_batches(&wal_path, &[vec![Operation::set(1, "k1", "v1")]]);
    append_raw(&wal_path, br#"{"type":"delete","ke"#);

    let first = KvView::new();
    let before = WalRecovery::recover(&wal_path, &first).unwrap();

    // Reopening the writer seals the torn line; replay must not change
    drop(WalWriter::open(&wal_path, WalSyncStrategy::EveryCommit).unwrap());

    let second = KvView::new();
    let after = WalRecovery::recover(&wal_path, &second).unwrap();

    assert_eq!(first.snapshot(), second.snapshot());
    assert_eq!(before.records_recovered, after.records_recovered);
    assert_eq!(after.records_skipped, 1);
    assert!(!after.torn_tail);
}

// =============================================================================
// Verify Tests
// =============================================================================

#[test]
fn test_verify_matches_recover() {
    let (_temp, wal_path) = setup_temp_wal();
    write_batches(
        &wal_path,
        &[
            vec![Operation::set(4, "x", "1")],
            vec![Operation::set(9, "y", "2"), Operation::delete(9, "x")],
        ],
    );
    append_raw(&wal_path, b"{\"type\"");

    let verified = WalRecovery::verify(&wal_path).unwrap();
    let recovered = WalRecovery::recover(&wal_path, &KvView::new()).unwrap();

    assert_eq!(verified, recovered);
    assert_eq!(verified.last_txid, 9);
}

#[test]
fn test_verify_does_not_modify_file() {
    let (_temp, wal_path) = setup_temp_wal();
    write_batches(&wal_path, &[vec![Operation::set(1, "k", "v")]]);
    append_raw(&wal_path, b"torn");
    let before = fs::read(&wal_path).unwrap();

    WalRecovery::verify(&wal_path).unwrap();

    assert_eq!(fs::read(&wal_path).unwrap(), before);
}
