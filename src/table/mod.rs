//! Table module for turning report files into trading rows
//!
//! This module handles:
//! - The [`TableExtractor`] capability (file path in, rows out)
//! - The bundled bulletin spreadsheet extractor
//! - Running extraction over many files on a worker pool

mod bulletin;
mod pool;

pub use bulletin::{extract_trade_rows, BulletinTableExtractor};
pub use pool::{ParseBatch, ParseFailure, ParsePool};

use crate::HarvestError;
use chrono::NaiveDate;
use std::path::Path;

/// One row of a bulletin's trading table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeRow {
    /// Instrument code, e.g. `A100NVY060F`
    pub exchange_product_id: String,

    /// Instrument name
    pub exchange_product_name: String,

    /// Delivery basis name
    pub delivery_basis_name: String,

    /// Traded volume in units of measure
    pub volume: i64,

    /// Traded volume in roubles
    pub total: i64,

    /// Number of contracts
    pub count: i64,
}

/// Rows parsed from one report file, stamped with the report's date
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTable {
    pub rows: Vec<TradeRow>,
    pub published_date: NaiveDate,
}

/// Extracts trading rows from a downloaded report file
///
/// Implementations must be pure: no shared mutable state, safe to call from
/// several worker threads at once.
pub trait TableExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<Vec<TradeRow>, HarvestError>;
}
