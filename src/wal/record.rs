//! WAL record codec
//!
//! One operation per line, encoded as a JSON object and terminated by `\n`.

use bytes::{BufMut, BytesMut};
use serde::{Deserialize, Serialize};

use crate::error::{CoolDbError, Result};
use crate::transaction::{TxId, MAX_TXID};

/// Kind of mutation carried by a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpKind {
    /// Insert or overwrite a key
    Set,

    /// Remove a key
    Delete,

    /// Commit marker. Never written by the store, tolerated when read.
    Commit,
}

/// A single mutation intent owned by a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(rename = "type")]
    pub kind: OpKind,

    pub key: String,

    /// Empty for deletes and markers
    #[serde(default)]
    pub value: String,

    /// Owning transaction
    pub txid: TxId,
}

impl Operation {
    pub fn set(txid: TxId, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: OpKind::Set,
            key: key.into(),
            value: value.into(),
            txid,
        }
    }

    pub fn delete(txid: TxId, key: impl Into<String>) -> Self {
        Self {
            kind: OpKind::Delete,
            key: key.into(),
            value: String::new(),
            txid,
        }
    }

    pub fn commit_marker(txid: TxId) -> Self {
        Self {
            kind: OpKind::Commit,
            key: String::new(),
            value: String::new(),
            txid,
        }
    }
}

/// Encode a single record, including its trailing newline
pub fn encode(op: &Operation) -> Result<Vec<u8>> {
    let mut buf = BytesMut::new();
    encode_into(op, &mut buf)?;
    Ok(buf.to_vec())
}

/// Append an encoded record (with newline) to `buf`
///
/// Used by the writer to assemble a whole commit batch before a single write.
pub fn encode_into(op: &Operation, buf: &mut BytesMut) -> Result<()> {
    serde_json::to_writer((&mut *buf).writer(), op)
        .map_err(|e| CoolDbError::Serialization(e.to_string()))?;
    buf.put_u8(b'\n');
    Ok(())
}

/// Decode one line. A trailing `\n` or `\r\n` is ignored.
///
/// Records whose txid is above [`MAX_TXID`] are rejected.
pub fn decode(line: &[u8]) -> Result<Operation> {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    let line = line.strip_suffix(b"\r").unwrap_or(line);

    if line.is_empty() {
        return Err(CoolDbError::Decode("empty record".to_string()));
    }

    let op: Operation =
        serde_json::from_slice(line).map_err(|e| CoolDbError::Decode(e.to_string()))?;
    if op.txid > MAX_TXID {
        return Err(CoolDbError::Decode(format!("txid {} out of range", op.txid)));
    }
    Ok(op)
}
