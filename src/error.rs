//! Error types for CoolDB
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

use crate::transaction::TxId;

/// Result type alias using CoolDbError
pub type Result<T> = std::result::Result<T, CoolDbError>;

/// Unified error type for CoolDB operations
#[derive(Debug, Error)]
pub enum CoolDbError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // WAL Errors
    // -------------------------------------------------------------------------
    /// A WAL line could not be decoded. Replay skips these.
    #[error("WAL record decode failed: {0}")]
    Decode(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Transaction Errors
    // -------------------------------------------------------------------------
    #[error("transaction {0} not found")]
    UnknownTransaction(TxId),

    #[error("transaction ids exhausted")]
    TransactionIdsExhausted,

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Network error: {0}")]
    Network(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}
