//! Key-Value View Module
//!
//! The materialized key -> value mapping built from committed operations.
//!
//! ## Responsibilities
//! - Point lookups and key listing for readers
//! - Apply committed operations, a whole commit batch under one write lock
//!
//! ## Data Structure Choice
//! HashMap wrapped in a parking_lot RwLock:
//! - Unique keys, O(1) point lookups
//! - No ordering is promised to callers, so no ordered map is needed
//! - Many concurrent readers, one writer at a time

mod table;

pub use table::KvView;
