//! Write-Ahead Log (WAL) Module
//!
//! Provides durability for committed transactions through append-only logging.
//!
//! ## Responsibilities
//! - Encode committed operations, one self-contained record per line
//! - Append a whole commit batch, then flush/fsync before reporting success
//! - Replay the log from the start on open, skipping undecodable lines
//!
//! ## File Format
//! ```text
//! {"type":"set","key":"k1","value":"v1","txid":1}\n
//! {"type":"delete","key":"k1","value":"","txid":1}\n
//! {"type":"set","key":"k2","value":"v2","txid":2}\n
//! {"type":"se                                      <- torn tail, skipped
//! ```
//!
//! Every line in the file belongs to a transaction that reached `commit`;
//! the log is never truncated or rewritten.

mod record;
mod writer;
mod reader;
mod recovery;

pub use record::{decode, encode, encode_into, OpKind, Operation};
pub use writer::WalWriter;
pub use reader::{WalLine, WalReader, WalRecords};
pub use recovery::{RecoveryResult, WalRecovery};
