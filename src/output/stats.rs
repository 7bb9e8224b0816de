//! Statistics generation from the trading-results database
//!
//! This module provides functionality for extracting and displaying
//! store statistics from the storage layer.

use crate::storage::Storage;
use crate::HarvestError;
use chrono::NaiveDate;

/// Store statistics summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStatistics {
    /// Total number of trading records
    pub total_records: u64,

    /// Number of distinct trading dates
    pub distinct_dates: u64,

    /// Most recent trading date, if any record is stored
    pub latest_date: Option<NaiveDate>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(StoreStatistics)` - Successfully loaded statistics
/// * `Err(HarvestError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> Result<StoreStatistics, HarvestError> {
    Ok(StoreStatistics {
        total_records: storage.count_records()?,
        distinct_dates: storage.count_distinct_dates()?,
        latest_date: storage.latest_date()?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &StoreStatistics) {
    println!("=== Store Statistics ===\n");

    println!("Overview:");
    println!("  Trading records: {}", stats.total_records);
    println!("  Trading dates: {}", stats.distinct_dates);
    match stats.latest_date {
        Some(date) => println!("  Latest date: {}", date),
        None => println!("  Latest date: (none)"),
    }

    if stats.distinct_dates > 0 {
        println!(
            "  Average records per date: {:.1}",
            stats.total_records as f64 / stats.distinct_dates as f64
        );
    }
}
