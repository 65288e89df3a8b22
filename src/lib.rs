//! # CoolDB
//!
//! A minimal embedded key-value store with:
//! - Explicit transactions: begin, stage set/delete, commit or rollback
//! - Write-Ahead Logging (WAL) for durability of committed work
//! - Crash recovery by replaying the WAL, tolerating a torn last line
//! - Read-committed visibility: readers only see committed transactions
//! - An optional TCP front end with auto-committed single-key writes
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────┐   ┌──────────────────────────────────────┐
//! │   Interactive shell  │   │  TCP Server  ──►  AutoCommit layer   │
//! └──────────┬───────────┘   └──────────────────┬───────────────────┘
//!            │                                  │
//! ┌──────────▼──────────────────────────────────▼───────────────────┐
//! │                            Store                                │
//! │        begin / set / delete / get / commit / rollback           │
//! └──────┬──────────────────────┬───────────────────────┬───────────┘
//!        │                      │                       │
//!        ▼                      ▼                       ▼
//! ┌─────────────┐      ┌─────────────────┐      ┌─────────────┐
//! │ Transaction │      │       WAL       │      │   KvView    │
//! │    Table    │      │ (append, fsync) │      │  (RwLock)   │
//! │   (Mutex)   │      └────────┬────────┘      └─────────────┘
//! └─────────────┘               │ replay on open        ▲
//!                               └───────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use cooldb::Store;
//!
//! # fn main() -> cooldb::Result<()> {
//! let store = Store::open_path("keyDB.cdb")?;
//! let tx = store.begin()?;
//! store.set(tx, "key1", "value1")?;
//! store.set(tx, "key2", "value2")?;
//! store.delete(tx, "key1")?;
//! store.commit(tx)?;
//!
//! assert_eq!(store.get("key2").as_deref(), Some("value2"));
//! assert_eq!(store.get("key1"), None);
//! store.close()?;
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod wal;
pub mod transaction;
pub mod view;
pub mod store;
pub mod autocommit;
pub mod protocol;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{CoolDbError, Result};
pub use config::{Config, WalSyncStrategy};
pub use store::Store;
pub use autocommit::{AutoCommit, Reply};
pub use transaction::{TxId, NO_TRANSACTION};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of CoolDB
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
