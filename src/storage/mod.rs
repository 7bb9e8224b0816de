//! Storage module for persisting trading records
//!
//! This module handles all database operations for the importer, including:
//! - SQLite database initialization and schema management
//! - Chunked existence checks on the natural key
//! - Transactional bulk inserts
//! - Summary queries for the statistics report

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::table::TradeRow;
use chrono::NaiveDate;
use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path)
}

/// Natural key of a trading record
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TradeKey {
    pub exchange_product_id: String,
    pub date: NaiveDate,
}

impl TradeKey {
    pub fn new(exchange_product_id: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            exchange_product_id: exchange_product_id.into(),
            date,
        }
    }
}

/// One trading result as stored in the database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub exchange_product_id: String,
    pub exchange_product_name: String,

    /// First four characters of the product id
    pub oil_id: String,

    /// Characters five to seven of the product id
    pub delivery_basis_id: String,
    pub delivery_basis_name: String,

    /// Last character of the product id
    pub delivery_type_id: String,
    pub volume: i64,
    pub total: i64,
    pub count: i64,
    pub date: NaiveDate,
}

impl Record {
    /// Builds a record from a parsed row and the date of its report
    pub fn from_row(row: &TradeRow, date: NaiveDate) -> Self {
        let id = row.exchange_product_id.as_str();
        let chars: Vec<char> = id.chars().collect();

        let slice = |from: usize, to: usize| -> String {
            chars
                .get(from.min(chars.len())..to.min(chars.len()))
                .map(|part| part.iter().collect())
                .unwrap_or_default()
        };

        Self {
            exchange_product_id: row.exchange_product_id.clone(),
            exchange_product_name: row.exchange_product_name.clone(),
            oil_id: slice(0, 4),
            delivery_basis_id: slice(4, 7),
            delivery_basis_name: row.delivery_basis_name.clone(),
            delivery_type_id: chars.last().map(|c| c.to_string()).unwrap_or_default(),
            volume: row.volume,
            total: row.total,
            count: row.count,
            date,
        }
    }

    /// The natural key of this record
    pub fn key(&self) -> TradeKey {
        TradeKey::new(self.exchange_product_id.clone(), self.date)
    }
}
