//! Per-run harvest summary

use std::time::Duration;

/// What a single harvest run achieved
///
/// Every stage contributes its counts whether or not a later stage failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Report links inside the date window
    pub links_found: usize,

    /// Files present in the download directory after the download stage
    pub files_downloaded: usize,

    /// Links whose download failed
    pub download_failures: usize,

    /// Files parsed into tables
    pub tables_parsed: usize,

    /// Files that could not be parsed
    pub parse_failures: usize,

    /// Records written to the store
    pub records_inserted: usize,

    /// Import failure, if the import stage did not finish
    pub import_error: Option<String>,

    /// Wall-clock time of the run
    pub elapsed: Duration,
}

impl RunSummary {
    /// Returns true if any stage reported a failure
    pub fn has_failures(&self) -> bool {
        self.download_failures > 0 || self.parse_failures > 0 || self.import_error.is_some()
    }

    /// Logs the summary at info level
    pub fn log(&self) {
        tracing::info!(
            "Run finished in {:.1}s: {} links, {} files ({} failed), {} tables ({} failed), {} records inserted",
            self.elapsed.as_secs_f64(),
            self.links_found,
            self.files_downloaded,
            self.download_failures,
            self.tables_parsed,
            self.parse_failures,
            self.records_inserted
        );
        if let Some(error) = &self.import_error {
            tracing::error!("Import did not complete: {}", error);
        }
    }
}

/// Prints a run summary to stdout
pub fn print_summary(summary: &RunSummary) {
    println!("=== Harvest Summary ===\n");

    println!("Links found:        {}", summary.links_found);
    println!(
        "Files downloaded:   {} ({} failed)",
        summary.files_downloaded, summary.download_failures
    );
    println!(
        "Tables parsed:      {} ({} failed)",
        summary.tables_parsed, summary.parse_failures
    );
    println!("Records inserted:   {}", summary.records_inserted);
    println!("Elapsed:            {:.1}s", summary.elapsed.as_secs_f64());

    if let Some(error) = &summary.import_error {
        println!("\n✗ Import failed: {}", error);
    } else if summary.has_failures() {
        println!("\n✓ Completed with failures (see log)");
    } else {
        println!("\n✓ Completed");
    }
}
