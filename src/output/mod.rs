//! Output module for run summaries and store reports
//!
//! This module handles:
//! - The summary each harvest run produces
//! - Statistics read back from the trading-results store

pub mod stats;
mod summary;

pub use stats::{load_statistics, print_statistics, StoreStatistics};
pub use summary::{print_summary, RunSummary};
