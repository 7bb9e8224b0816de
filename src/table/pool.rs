//! Parallel table extraction
//!
//! Spreadsheet decoding is CPU-bound, so it runs on a dedicated rayon pool
//! entered from a blocking task rather than on the async runtime's workers.

use crate::crawler::DownloadedFile;
use crate::table::{ParsedTable, TableExtractor, TradeRow};
use crate::HarvestError;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;

/// A file the extractor could not read
#[derive(Debug)]
pub struct ParseFailure {
    pub path: PathBuf,
    pub error: HarvestError,
}

/// Outcome of parsing a batch of files
#[derive(Debug, Default)]
pub struct ParseBatch {
    /// Parsed tables, in the order of the input files
    pub tables: Vec<ParsedTable>,

    /// One entry per file that failed to parse
    pub failures: Vec<ParseFailure>,
}

/// Worker pool running a [`TableExtractor`] over many files
pub struct ParsePool {
    pool: Arc<ThreadPool>,
}

impl ParsePool {
    /// Creates a pool with `workers` threads (0 means one per CPU)
    pub fn new(workers: usize) -> Result<Self, HarvestError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|index| format!("parse-worker-{}", index))
            .build()
            .map_err(|e| HarvestError::Task(format!("cannot start parse workers: {}", e)))?;

        tracing::debug!("Parse pool started with {} workers", pool.current_num_threads());

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Number of worker threads
    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Parses every file and waits for all of them
    ///
    /// A file that fails, or whose extraction panics, is recorded as a
    /// failure; the remaining files are still parsed.
    pub async fn parse_all(
        &self,
        files: Vec<DownloadedFile>,
        extractor: Arc<dyn TableExtractor>,
    ) -> Result<ParseBatch, HarvestError> {
        if files.is_empty() {
            return Ok(ParseBatch::default());
        }

        let pool = Arc::clone(&self.pool);
        let batch = tokio::task::spawn_blocking(move || {
            pool.install(|| parse_files(&files, extractor.as_ref()))
        })
        .await?;

        for failure in &batch.failures {
            tracing::warn!("Failed to parse {}: {}", failure.path.display(), failure.error);
        }

        Ok(batch)
    }
}

fn parse_files(files: &[DownloadedFile], extractor: &dyn TableExtractor) -> ParseBatch {
    let results: Vec<_> = files
        .par_iter()
        .map(|file| {
            extract_guarded(extractor, file)
                .map(|rows| ParsedTable {
                    rows,
                    published_date: file.published_date,
                })
                .map_err(|error| ParseFailure {
                    path: file.path.clone(),
                    error,
                })
        })
        .collect();

    let mut batch = ParseBatch::default();
    for result in results {
        match result {
            Ok(table) => batch.tables.push(table),
            Err(failure) => batch.failures.push(failure),
        }
    }
    batch
}

/// Runs the extractor on one file, turning a panic into a parse error
fn extract_guarded(
    extractor: &dyn TableExtractor,
    file: &DownloadedFile,
) -> Result<Vec<TradeRow>, HarvestError> {
    panic::catch_unwind(AssertUnwindSafe(|| extractor.extract(&file.path))).unwrap_or_else(|_| {
        Err(HarvestError::parse(
            file.path.display().to_string(),
            "extractor panicked",
        ))
    })
}
