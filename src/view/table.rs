//! KvView implementation

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::wal::{OpKind, Operation};

/// Committed key-value state
pub struct KvView {
    data: RwLock<HashMap<String, String>>,
}

impl KvView {
    /// Create an empty view
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Apply one committed operation (write lock)
    ///
    /// Set inserts or overwrites, Delete removes the key if present. Commit
    /// markers have no effect.
    pub fn apply(&self, op: &Operation) {
        let mut data = self.data.write();
        apply_to(&mut data, op);
    }

    /// Apply a batch in order under a single write lock
    ///
    /// Readers see either none or all of the batch.
    pub fn apply_batch(&self, ops: &[Operation]) {
        if ops.is_empty() {
            return;
        }
        let mut data = self.data.write();
        for op in ops {
            apply_to(&mut data, op);
        }
    }

    /// Get a value by key (read lock)
    pub fn get(&self, key: &str) -> Option<String> {
        self.data.read().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.data.read().contains_key(key)
    }

    /// All present keys, in no particular order
    pub fn list(&self) -> Vec<String> {
        self.data.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Copy of the whole mapping
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.data.read().clone()
    }
}

impl Default for KvView {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_to(data: &mut HashMap<String, String>, op: &Operation) {
    match op.kind {
        OpKind::Set => {
            data.insert(op.key.clone(), op.value.clone());
        }
        OpKind::Delete => {
            data.remove(&op.key);
        }
        OpKind::Commit => {}
    }
}
