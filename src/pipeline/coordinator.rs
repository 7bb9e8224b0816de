//! Harvest coordinator - stage sequencing and failure isolation
//!
//! This module runs one harvest from start to finish:
//! - Walking the listing for links inside the date window
//! - Downloading every link concurrently and waiting for all of them
//! - Parsing the downloaded files on a worker pool
//! - Importing the parsed tables into the store
//!
//! A failing stage is logged and reported in the [`RunSummary`]; the work of
//! earlier stages stands.

use crate::config::Config;
use crate::crawler::{
    BulletinLinkExtractor, DownloadedFile, FileDownloader, LinkCollector, LinkExtractor,
    PageFetcher, RateLimiter,
};
use crate::importer::DedupBulkImporter;
use crate::output::RunSummary;
use crate::storage::open_storage;
use crate::table::{BulletinTableExtractor, ParsePool, ParsedTable, TableExtractor};
use crate::HarvestError;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main harvest coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    fetcher: PageFetcher,
    link_extractor: Arc<dyn LinkExtractor>,
    table_extractor: Arc<dyn TableExtractor>,
}

impl Coordinator {
    /// Creates a coordinator with the bundled bulletin extractors
    ///
    /// # Arguments
    ///
    /// * `config` - The harvest configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(HarvestError)` - The HTTP client or link extractor could not be built
    pub fn new(config: Config) -> Result<Self, HarvestError> {
        let link_extractor =
            BulletinLinkExtractor::new(&config.source.site_url, config.source.link_marker.clone())?;
        Self::with_extractors(config, Arc::new(link_extractor), Arc::new(BulletinTableExtractor))
    }

    /// Creates a coordinator with caller-supplied extraction capabilities
    pub fn with_extractors(
        config: Config,
        link_extractor: Arc<dyn LinkExtractor>,
        table_extractor: Arc<dyn TableExtractor>,
    ) -> Result<Self, HarvestError> {
        let fetcher = PageFetcher::from_config(&config.http)?;

        Ok(Self {
            config: Arc::new(config),
            fetcher,
            link_extractor,
            table_extractor,
        })
    }

    /// Runs the harvest to completion
    ///
    /// Never fails as a whole: each stage's failures are recorded in the
    /// returned summary, which is also logged.
    pub async fn run(&self) -> RunSummary {
        let started = Instant::now();
        let mut summary = RunSummary::default();

        let start_date = self.config.window.start_date;
        let end_date = self.config.end_date();
        tracing::info!("Harvesting reports dated {} to {}", start_date, end_date);

        // Stage 1: listing walk
        let collector = LinkCollector::new(
            &self.fetcher,
            self.link_extractor.as_ref(),
            self.config.source.listing_url.clone(),
            self.config.source.page_query.clone(),
            self.config.source.max_pages,
        );
        let links = collector.collect(start_date, end_date).await;
        summary.links_found = links.len();

        if links.is_empty() {
            tracing::info!("No reports inside the window, nothing to do");
            summary.elapsed = started.elapsed();
            summary.log();
            return summary;
        }

        // Stage 2: fan-out downloads, fan-in barrier
        let limiter = Arc::new(RateLimiter::new(
            self.config.download.rate_limit_quota as usize,
            Duration::from_millis(self.config.download.rate_limit_window_ms),
        ));
        let downloader = FileDownloader::new(
            PathBuf::from(&self.config.download.directory),
            self.fetcher.clone(),
            limiter,
        );
        let downloads = downloader.download_all(&links).await;
        summary.files_downloaded = downloads.files.len();
        summary.download_failures = downloads.failures.len();

        // Stage 3: parse
        let tables = self.parse(downloads.files, &mut summary).await;
        summary.tables_parsed = tables.len();

        // Stage 4: import
        if tables.iter().any(|table| !table.rows.is_empty()) {
            match self.import(tables).await {
                Ok(inserted) => summary.records_inserted = inserted,
                Err(e) => {
                    tracing::error!("Import failed: {}", e);
                    summary.import_error = Some(e.to_string());
                }
            }
        } else {
            tracing::info!("No rows parsed, skipping import");
        }

        summary.elapsed = started.elapsed();
        summary.log();
        summary
    }

    async fn parse(
        &self,
        files: Vec<DownloadedFile>,
        summary: &mut RunSummary,
    ) -> Vec<ParsedTable> {
        if files.is_empty() {
            return Vec::new();
        }

        let file_count = files.len();
        let pool = match ParsePool::new(self.config.parse.workers) {
            Ok(pool) => pool,
            Err(e) => {
                tracing::error!("Cannot parse {} files: {}", file_count, e);
                summary.parse_failures = file_count;
                return Vec::new();
            }
        };

        match pool.parse_all(files, Arc::clone(&self.table_extractor)).await {
            Ok(batch) => {
                summary.parse_failures = batch.failures.len();
                batch.tables
            }
            Err(e) => {
                tracing::error!("Parse stage failed: {}", e);
                summary.parse_failures = file_count;
                Vec::new()
            }
        }
    }

    async fn import(&self, tables: Vec<ParsedTable>) -> Result<usize, HarvestError> {
        let database_path = PathBuf::from(&self.config.import.database_path);
        let importer = DedupBulkImporter::new(
            self.config.import.check_chunk_size,
            self.config.import.insert_batch_size,
        );

        tokio::task::spawn_blocking(move || -> Result<usize, HarvestError> {
            let mut storage = open_storage(&database_path)?;
            importer.import_all(&mut storage, &tables)
        })
        .await?
    }
}

/// Runs one harvest with the bundled extractors
///
/// # Arguments
///
/// * `config` - The harvest configuration
///
/// # Returns
///
/// * `Ok(RunSummary)` - The run finished; stage failures are in the summary
/// * `Err(HarvestError)` - The run could not be set up
pub async fn harvest(config: Config) -> Result<RunSummary, HarvestError> {
    let coordinator = Coordinator::new(config)?;
    Ok(coordinator.run().await)
}
