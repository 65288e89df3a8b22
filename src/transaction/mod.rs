//! Transaction Module
//!
//! Tracks in-flight transactions and the operations staged against them.
//!
//! ## Lifecycle
//! ```text
//! begin() ──► Active ──commit──► Committed   (removed from table)
//!               │
//!               └──rollback──► Rolled-back   (removed from table)
//! ```
//!
//! Staged operations are neither durable nor visible to readers. A removed
//! id is never handed out again.

mod table;

pub use table::TransactionTable;

/// Transaction identifier. Allocated from 1 upwards; 0 means "no transaction".
pub type TxId = u64;

/// Reserved id meaning "no active transaction"
pub const NO_TRANSACTION: TxId = 0;

/// Largest id ever allocated or accepted from the WAL (ids fit in an `i64`)
pub const MAX_TXID: TxId = i64::MAX as TxId;
