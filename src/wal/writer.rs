//! WAL Writer
//!
//! Handles appending committed batches to the WAL file.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use bytes::BytesMut;

use crate::config::WalSyncStrategy;
use crate::error::Result;
use super::record::{encode_into, Operation};

/// Writes commit batches to the WAL file
pub struct WalWriter {
    file: File,
    path: PathBuf,
    sync_strategy: WalSyncStrategy,
    records_written: u64,
}

impl WalWriter {
    /// Open or create a WAL file in append mode
    ///
    /// If the previous session left an unterminated final line, a newline is
    /// written first so the torn bytes stay on a line of their own and the
    /// next record starts cleanly.
    pub fn open(path: &Path, sync_strategy: WalSyncStrategy) -> Result<Self> {
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;

        if ends_with_torn_line(&mut file)? {
            tracing::warn!(path = %path.display(), "sealing torn WAL tail");
            file.write_all(b"\n")?;
            file.sync_data()?;
        }

        Ok(Self {
            file,
            path: path.to_path_buf(),
            sync_strategy,
            records_written: 0,
        })
    }

    /// Writer over a file opened read-only, so every append fails
    #[cfg(test)]
    pub(crate) fn read_only(path: &Path, sync_strategy: WalSyncStrategy) -> Result<Self> {
        Ok(Self {
            file: File::open(path)?,
            path: path.to_path_buf(),
            sync_strategy,
            records_written: 0,
        })
    }

    /// Append a batch of records, then flush according to the sync strategy
    ///
    /// The batch is encoded into one buffer and written with a single
    /// `write_all`, so two batches never interleave. Success means every
    /// record of the batch has been handed to the OS (and fsynced under
    /// `EveryCommit`). An empty batch writes nothing.
    pub fn append(&mut self, records: &[Operation]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut buf = BytesMut::with_capacity(records.len() * 64);
        for record in records {
            encode_into(record, &mut buf)?;
        }

        self.file.write_all(&buf)?;
        self.sync()?;

        self.records_written += records.len() as u64;
        Ok(())
    }

    /// Force buffered data out according to the sync strategy
    pub fn sync(&mut self) -> Result<()> {
        self.file.flush()?;
        if self.sync_strategy == WalSyncStrategy::EveryCommit {
            self.file.sync_data()?;
        }
        Ok(())
    }

    /// Flush and fsync data and metadata, then release the file
    pub fn close(mut self) -> Result<()> {
        self.file.flush()?;
        self.file.sync_all()?;
        Ok(())
    }

    /// Records appended by this writer since it was opened
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn ends_with_torn_line(file: &mut File) -> Result<bool> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(false);
    }

    let mut last = [0u8; 1];
    file.seek(SeekFrom::Start(len - 1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}
