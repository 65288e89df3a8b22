//! Store Module
//!
//! The transactional store that coordinates all components.
//!
//! ## Responsibilities
//! - Create the primary file and WAL on open, then replay the WAL
//! - Stage per-transaction writes without making them visible
//! - Make a commit durable in the WAL before applying it to the view
//! - Flush everything on close

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::config::Config;
use crate::error::Result;
use crate::transaction::{TransactionTable, TxId};
use crate::view::KvView;
use crate::wal::{Operation, RecoveryResult, WalRecovery, WalWriter};

/// An open database
///
/// ## Concurrency Model
///
/// - **Staging** (begin/set/delete/rollback): serialized by the transaction
///   table's mutex, held only for the map update
///
/// - **Commit**: removes the staged list under the table mutex, then holds
///   the `wal` mutex across the durable append *and* the view apply. WAL
///   order and apply order therefore agree, so a replay reproduces the view.
///   The view's write lock is taken only after the append has been synced,
///   so readers are never blocked by disk I/O.
///
/// - **Reads** (get/list): view read lock only, concurrent with each other
///
/// Lock order is always `wal` -> view.
pub struct Store {
    /// Store configuration
    config: Config,

    /// `<db_path>.wal`
    wal_path: PathBuf,

    /// Write-ahead log (exclusive access needed)
    wal: Mutex<WalWriter>,

    /// Primary database file. Only kept open; its bytes are not read.
    data_file: File,

    /// In-flight transactions and their staged operations
    txns: TransactionTable,

    /// Committed key-value state
    view: KvView,

    /// What the replay on open found
    recovery: RecoveryResult,
}

impl Store {
    /// Open or create a store with the given config
    ///
    /// On startup:
    /// 1. Create parent directories and the primary file
    /// 2. Replay the WAL, if present, into a fresh view
    /// 3. Open the WAL for appending (creating it if absent)
    /// 4. Seed transaction ids past the highest id found in the WAL
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        // Step 1: Primary file and its directory
        if let Some(parent) = config.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let data_file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(&config.db_path)?;

        // Step 2: Replay
        let wal_path = config.wal_path();
        let view = KvView::new();
        let recovery = if wal_path.exists() {
            WalRecovery::recover(&wal_path, &view)?
        } else {
            RecoveryResult::default()
        };

        // Step 3: WAL writer
        let wal = WalWriter::open(&wal_path, config.wal_sync_strategy)?;

        // Step 4: Transaction ids continue after the log
        let txns = TransactionTable::starting_after(recovery.last_txid);

        tracing::info!(
            db = %config.db_path.display(),
            keys = view.len(),
            "store opened"
        );

        Ok(Self {
            config,
            wal_path,
            wal: Mutex::new(wal),
            data_file,
            txns,
            view,
            recovery,
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified database file
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let config = Config::builder().db_path(path.as_ref()).build();
        Self::open(config)
    }

    /// Start a new transaction
    pub fn begin(&self) -> Result<TxId> {
        let txid = self.txns.begin()?;
        tracing::debug!(txid, "transaction started");
        Ok(txid)
    }

    /// Stage a set; invisible to `get` until commit
    pub fn set(&self, txid: TxId, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        self.txns.stage(txid, Operation::set(txid, key, value))
    }

    /// Stage a delete; invisible to `get` until commit
    pub fn delete(&self, txid: TxId, key: impl Into<String>) -> Result<()> {
        self.txns.stage(txid, Operation::delete(txid, key))
    }

    /// Get the latest committed value for a key
    pub fn get(&self, key: &str) -> Option<String> {
        self.view.get(key)
    }

    /// Commit a transaction
    ///
    /// Steps:
    /// 1. Remove the staged list from the table (the id is dead from here on)
    /// 2. Append the whole batch to the WAL and sync
    /// 3. Apply the batch to the view in one critical section
    ///
    /// If step 2 fails the staged operations are dropped, the view is left
    /// untouched and the error is returned.
    pub fn commit(&self, txid: TxId) -> Result<()> {
        // Step 1: Claim the batch
        let ops = self.txns.take_and_clear(txid)?;

        // Step 2: Durable append
        let mut wal = self.wal.lock();
        if let Err(e) = wal.append(&ops) {
            tracing::warn!(txid, error = %e, "commit failed, transaction discarded");
            return Err(e);
        }

        // Step 3: Make it visible
        self.view.apply_batch(&ops);
        drop(wal);

        tracing::debug!(txid, records = ops.len(), "transaction committed");
        Ok(())
    }

    /// Discard a transaction's staged operations
    pub fn rollback(&self, txid: TxId) -> Result<()> {
        let discarded = self.txns.take_and_clear(txid)?;
        tracing::debug!(txid, discarded = discarded.len(), "transaction rolled back");
        Ok(())
    }

    /// Close the store gracefully
    ///
    /// Syncs the WAL first, then the primary file. Active transactions are
    /// discarded.
    pub fn close(self) -> Result<()> {
        let active = self.txns.active_count();
        if active > 0 {
            tracing::warn!(active, "closing with uncommitted transactions");
        }

        self.wal.into_inner().close()?;
        self.data_file.sync_all()?;

        tracing::info!(db = %self.config.db_path.display(), "store closed");
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// All committed keys, in no particular order
    pub fn list(&self) -> Vec<String> {
        self.view.list()
    }

    /// Number of committed keys
    pub fn len(&self) -> usize {
        self.view.len()
    }

    pub fn is_empty(&self) -> bool {
        self.view.is_empty()
    }

    /// Ids of transactions that are still active, ascending
    pub fn active_transactions(&self) -> Vec<TxId> {
        self.txns.active_ids()
    }

    pub fn is_active(&self, txid: TxId) -> bool {
        self.txns.is_active(txid)
    }

    /// Operations staged against an active transaction
    pub fn staged_len(&self, txid: TxId) -> Option<usize> {
        self.txns.staged_len(txid)
    }

    /// Get the primary database file path
    pub fn db_path(&self) -> &Path {
        &self.config.db_path
    }

    /// Get the WAL file path
    pub fn wal_path(&self) -> &Path {
        &self.wal_path
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Replay statistics from open
    pub fn last_recovery(&self) -> &RecoveryResult {
        &self.recovery
    }

    /// Records this session appended to the WAL
    pub fn wal_records_written(&self) -> u64 {
        self.wal.lock().records_written()
    }
}
