//! Crawler module for listing walks and report downloads
//!
//! This module contains the network-facing half of the harvest, including:
//! - HTTP fetching with a shared concurrency gate
//! - Report link extraction from listing pages
//! - The paginated, date-bounded listing walk
//! - Rate-limited, idempotent file downloads

mod collector;
mod downloader;
mod extractor;
mod fetcher;
mod rate_limiter;

pub use collector::LinkCollector;
pub use downloader::{file_name_from_url, DownloadBatch, DownloadFailure, FileDownloader};
pub use extractor::{BulletinLinkExtractor, LinkExtractor};
pub use fetcher::{build_http_client, FetchedPage, PageFetcher};
pub use rate_limiter::RateLimiter;

use chrono::NaiveDate;
use std::path::PathBuf;

/// A report link discovered on a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLink {
    /// Absolute URL of the report file
    pub url: String,

    /// Trading date the report belongs to
    pub published_date: NaiveDate,
}

impl ReportLink {
    pub fn new(url: impl Into<String>, published_date: NaiveDate) -> Self {
        Self {
            url: url.into(),
            published_date,
        }
    }
}

/// A report file present in the download directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    pub path: PathBuf,
    pub published_date: NaiveDate,
}

/// Inclusive `[start, end]` range of accepted report dates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Returns true if the date lies within the window
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Returns true if the date is newer than the window
    pub fn is_after(&self, date: NaiveDate) -> bool {
        date > self.end
    }

    /// Returns true if the date is older than the window
    pub fn is_before(&self, date: NaiveDate) -> bool {
        date < self.start
    }
}
