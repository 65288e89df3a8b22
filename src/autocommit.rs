//! Auto-commit convenience layer
//!
//! Single-key operations without explicit transactions. Every write runs as
//! its own one-operation transaction, so it goes through the WAL exactly like
//! an explicit commit.

use std::sync::Arc;

use crate::error::Result;
use crate::protocol::Command;
use crate::store::Store;

/// Result of executing a [`Command`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Write committed
    Done,

    /// Value found
    Value(String),

    /// Key absent
    NotFound,

    /// All keys, unordered
    Keys(Vec<String>),

    /// Status line
    Status(String),

    Pong,
}

/// Non-transactional facade over a shared [`Store`]
#[derive(Clone)]
pub struct AutoCommit {
    store: Arc<Store>,
}

impl AutoCommit {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Set a key in its own committed transaction
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let txid = self.store.begin()?;
        if let Err(e) = self.store.set(txid, key, value) {
            let _ = self.store.rollback(txid);
            return Err(e);
        }
        self.store.commit(txid)
    }

    /// Delete a key in its own committed transaction
    pub fn delete(&self, key: impl Into<String>) -> Result<()> {
        let txid = self.store.begin()?;
        if let Err(e) = self.store.delete(txid, key) {
            let _ = self.store.rollback(txid);
            return Err(e);
        }
        self.store.commit(txid)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.store.get(key)
    }

    pub fn list(&self) -> Vec<String> {
        self.store.list()
    }

    /// `"OK: <n> keys"`
    pub fn status(&self) -> String {
        format!("OK: {} keys", self.store.len())
    }

    /// Execute a command
    ///
    /// Routes commands to appropriate handlers
    pub fn execute(&self, command: Command) -> Result<Reply> {
        match command {
            Command::Get { key } => Ok(match self.get(&key) {
                Some(value) => Reply::Value(value),
                None => Reply::NotFound,
            }),
            Command::Set { key, value } => {
                self.set(key, value)?;
                Ok(Reply::Done)
            }
            Command::Delete { key } => {
                self.delete(key)?;
                Ok(Reply::Done)
            }
            Command::List => Ok(Reply::Keys(self.list())),
            Command::Status => Ok(Reply::Status(self.status())),
            Command::Ping => Ok(Reply::Pong),
        }
    }
}
