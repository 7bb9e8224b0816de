//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::{Record, TradeKey};
use chrono::NaiveDate;
use std::collections::HashSet;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// This trait defines the database operations needed by the importer and
/// the statistics report.
pub trait Storage {
    // ===== Import =====

    /// Returns the subset of `keys` already present in the store
    ///
    /// Callers bound the size of `keys`; implementations may issue a single
    /// query for the whole slice.
    fn existing_keys(&self, keys: &[TradeKey]) -> StorageResult<HashSet<TradeKey>>;

    /// Inserts all records as one atomic write
    ///
    /// # Returns
    ///
    /// The number of records inserted
    fn bulk_insert(&mut self, records: &[Record]) -> StorageResult<usize>;

    // ===== Statistics =====

    /// Gets total record count
    fn count_records(&self) -> StorageResult<u64>;

    /// Gets the number of distinct trading dates stored
    fn count_distinct_dates(&self) -> StorageResult<u64>;

    /// Gets the most recent trading date stored
    fn latest_date(&self) -> StorageResult<Option<NaiveDate>>;
}
