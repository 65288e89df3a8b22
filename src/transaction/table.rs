//! Transaction table implementation
//!
//! HashMap of staged operation lists behind a single mutex.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::error::{CoolDbError, Result};
use crate::wal::Operation;
use super::{TxId, MAX_TXID};

/// Registry of active transactions
pub struct TransactionTable {
    inner: Mutex<TableState>,
}

struct TableState {
    next_id: TxId,
    active: HashMap<TxId, Vec<Operation>>,
}

impl TransactionTable {
    /// Create an empty table whose first id is 1
    pub fn new() -> Self {
        Self::starting_after(0)
    }

    /// Create an empty table whose first id is `last + 1`
    ///
    /// Used after recovery so ids already present in the WAL are not reused.
    /// If `last` is already [`MAX_TXID`], every later `begin` fails.
    pub fn starting_after(last: TxId) -> Self {
        Self {
            inner: Mutex::new(TableState {
                next_id: last.saturating_add(1),
                active: HashMap::new(),
            }),
        }
    }

    /// Register a new transaction with an empty staged list
    ///
    /// Fails once the id space up to [`MAX_TXID`] is used up.
    pub fn begin(&self) -> Result<TxId> {
        let mut state = self.inner.lock();
        let id = state.next_id;
        if id > MAX_TXID {
            return Err(CoolDbError::TransactionIdsExhausted);
        }
        state.next_id = id
            .checked_add(1)
            .ok_or(CoolDbError::TransactionIdsExhausted)?;
        state.active.insert(id, Vec::new());
        Ok(id)
    }

    /// Append an operation to a transaction's staged list
    pub fn stage(&self, txid: TxId, op: Operation) -> Result<()> {
        let mut state = self.inner.lock();
        let staged = state
            .active
            .get_mut(&txid)
            .ok_or(CoolDbError::UnknownTransaction(txid))?;
        staged.push(op);
        Ok(())
    }

    /// Remove a transaction and return its staged operations in order
    pub fn take_and_clear(&self, txid: TxId) -> Result<Vec<Operation>> {
        self.inner
            .lock()
            .active
            .remove(&txid)
            .ok_or(CoolDbError::UnknownTransaction(txid))
    }

    pub fn is_active(&self, txid: TxId) -> bool {
        self.inner.lock().active.contains_key(&txid)
    }

    /// Number of operations staged against `txid`, if it is active
    pub fn staged_len(&self, txid: TxId) -> Option<usize> {
        self.inner.lock().active.get(&txid).map(Vec::len)
    }

    /// Ids of all active transactions, ascending
    pub fn active_ids(&self) -> Vec<TxId> {
        let mut ids: Vec<TxId> = self.inner.lock().active.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn active_count(&self) -> usize {
        self.inner.lock().active.len()
    }
}

impl Default for TransactionTable {
    fn default() -> Self {
        Self::new()
    }
}
