//! WAL Reader
//!
//! Reads the WAL from the beginning, one line at a time.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::Result;
use super::record::{decode, Operation};

/// Outcome of reading one line
#[derive(Debug)]
pub enum WalLine {
    /// A decoded record
    Record(Operation),

    /// A line that could not be decoded
    Skipped {
        /// 1-based line number
        line: u64,
        /// The line was the last one and had no terminating newline
        torn: bool,
        reason: String,
    },
}

/// Reads lines from the WAL file
pub struct WalReader {
    reader: BufReader<File>,
    line_no: u64,
    buf: Vec<u8>,
}

impl WalReader {
    /// Open a WAL file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            reader: BufReader::new(file),
            line_no: 0,
            buf: Vec::new(),
        })
    }

    /// Read the next non-blank line
    ///
    /// Only I/O failures are returned as errors; undecodable lines come back
    /// as [`WalLine::Skipped`]. Returns `None` at end of file.
    pub fn next_line(&mut self) -> Result<Option<WalLine>> {
        loop {
            self.buf.clear();
            let read = self.reader.read_until(b'\n', &mut self.buf)?;
            if read == 0 {
                return Ok(None);
            }
            self.line_no += 1;

            if self.buf.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            let torn = self.buf.last() != Some(&b'\n');
            return Ok(Some(match decode(&self.buf) {
                Ok(op) => WalLine::Record(op),
                Err(e) => WalLine::Skipped {
                    line: self.line_no,
                    torn,
                    reason: e.to_string(),
                },
            }));
        }
    }

    /// Lines consumed so far
    pub fn line_number(&self) -> u64 {
        self.line_no
    }

    /// Iterate over decodable records, logging and skipping the rest
    pub fn records(self) -> WalRecords {
        WalRecords {
            reader: self,
            skipped: 0,
            done: false,
        }
    }
}

/// Lazy iterator over the decodable records of a WAL
///
/// Yields `Err` only when the file itself cannot be read, after which it
/// stops.
pub struct WalRecords {
    reader: WalReader,
    skipped: u64,
    done: bool,
}

impl WalRecords {
    /// Lines skipped so far because they failed to decode
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

impl Iterator for WalRecords {
    type Item = Result<Operation>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            match self.reader.next_line() {
                Ok(Some(WalLine::Record(op))) => return Some(Ok(op)),
                Ok(Some(WalLine::Skipped { line, torn, reason })) => {
                    self.skipped += 1;
                    tracing::warn!(line, torn, %reason, "skipping undecodable WAL record");
                }
                Ok(None) => {
                    self.done = true;
                    return None;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
