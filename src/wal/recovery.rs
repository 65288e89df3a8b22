//! WAL Recovery
//!
//! Rebuilds the key-value view by replaying the WAL from the start.

use std::path::Path;

use crate::error::Result;
use crate::transaction::TxId;
use crate::view::KvView;
use super::reader::{WalLine, WalReader};
use super::record::Operation;

/// Replays a WAL file
pub struct WalRecovery;

/// Result of a recovery pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Records decoded and applied
    pub records_recovered: u64,

    /// Lines skipped because they failed to decode
    pub records_skipped: u64,

    /// Highest transaction id seen (0 for an empty log)
    pub last_txid: TxId,

    /// The final line had no terminating newline and failed to decode
    pub torn_tail: bool,
}

impl WalRecovery {
    /// Replay every decodable record, in file order, into `view`
    ///
    /// Undecodable lines are logged and skipped. Failing to open or read the
    /// file is an error.
    pub fn recover(path: &Path, view: &KvView) -> Result<RecoveryResult> {
        let result = Self::scan(path, |op| view.apply(op))?;

        if result.records_recovered > 0 || result.records_skipped > 0 {
            tracing::info!(
                recovered = result.records_recovered,
                skipped = result.records_skipped,
                last_txid = result.last_txid,
                torn_tail = result.torn_tail,
                "WAL replay finished"
            );
        }

        Ok(result)
    }

    /// Scan a WAL file and report what a replay would do, without applying it
    pub fn verify(path: &Path) -> Result<RecoveryResult> {
        Self::scan(path, |_| {})
    }

    fn scan<F>(path: &Path, mut apply: F) -> Result<RecoveryResult>
    where
        F: FnMut(&Operation),
    {
        let mut reader = WalReader::open(path)?;
        let mut result = RecoveryResult::default();

        while let Some(line) = reader.next_line()? {
            match line {
                WalLine::Record(op) => {
                    result.records_recovered += 1;
                    result.last_txid = result.last_txid.max(op.txid);
                    apply(&op);
                }
                WalLine::Skipped { line, torn, reason } => {
                    tracing::warn!(line, torn, %reason, "skipping undecodable WAL record");
                    result.records_skipped += 1;
                    result.torn_tail = torn;
                }
            }
        }

        Ok(result)
    }
}
