//! Paginated listing walk with date-window termination
//!
//! Listings are sorted newest first. The walk fetches pages one after
//! another, because whether page `n + 1` is needed depends on the dates
//! found on page `n`.

use crate::crawler::{DateWindow, LinkExtractor, PageFetcher, ReportLink};
use crate::HarvestError;
use chrono::NaiveDate;

/// Why a listing walk ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WalkEnd {
    /// A link older than the window start was seen
    Boundary,
    /// The extractor found no links on a page
    EmptyPage,
    /// The page ceiling was reached
    PageLimit,
}

/// Walks listing pages and collects the report links inside a date window
pub struct LinkCollector<'a> {
    fetcher: &'a PageFetcher,
    extractor: &'a dyn LinkExtractor,
    listing_url: String,
    page_query: String,
    max_pages: u32,
}

impl<'a> LinkCollector<'a> {
    /// Creates a collector
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Shared page fetcher
    /// * `extractor` - Link extraction capability applied to each page
    /// * `listing_url` - URL of the first listing page
    /// * `page_query` - Suffix for later pages, `{page}` is the page number
    /// * `max_pages` - Hard ceiling on pages walked
    pub fn new(
        fetcher: &'a PageFetcher,
        extractor: &'a dyn LinkExtractor,
        listing_url: impl Into<String>,
        page_query: impl Into<String>,
        max_pages: u32,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            listing_url: listing_url.into(),
            page_query: page_query.into(),
            max_pages: max_pages.max(1),
        }
    }

    /// Builds the URL of a listing page (pages are numbered from 1)
    pub fn page_url(&self, page_number: u32) -> String {
        if page_number <= 1 {
            return self.listing_url.clone();
        }

        let query = self.page_query.replace("{page}", &page_number.to_string());
        match query.strip_prefix('?') {
            Some(rest) if self.listing_url.contains('?') => {
                format!("{}&{}", self.listing_url, rest)
            }
            _ => format!("{}{}", self.listing_url, query),
        }
    }

    /// Collects report links dated within `[start_date, end_date]`
    ///
    /// Links newer than `end_date` are skipped without ending the walk. The
    /// first link older than `start_date` ends it. A fetch or extraction
    /// error also ends the walk; the links gathered so far are returned.
    pub async fn collect(&self, start_date: NaiveDate, end_date: NaiveDate) -> Vec<ReportLink> {
        let window = DateWindow::new(start_date, end_date);
        let mut results = Vec::new();
        let mut page_number = 1;

        let end = loop {
            let page_url = self.page_url(page_number);

            let links = match self.fetch_links(&page_url).await {
                Ok(links) => links,
                Err(e) => {
                    tracing::warn!(
                        "Stopping listing walk at page {} after error: {}",
                        page_number,
                        e
                    );
                    break None;
                }
            };

            if links.is_empty() {
                break Some(WalkEnd::EmptyPage);
            }

            let mut boundary_reached = false;
            for link in links {
                if window.is_after(link.published_date) {
                    continue;
                }
                if window.is_before(link.published_date) {
                    boundary_reached = true;
                    break;
                }
                results.push(link);
            }

            tracing::debug!(
                "Listing page {} processed, {} links accepted so far",
                page_number,
                results.len()
            );

            if boundary_reached {
                break Some(WalkEnd::Boundary);
            }

            if page_number >= self.max_pages {
                tracing::warn!(
                    "Page ceiling of {} reached before the window start {}",
                    self.max_pages,
                    start_date
                );
                break Some(WalkEnd::PageLimit);
            }

            page_number += 1;
        };

        tracing::info!(
            "Listing walk ended at page {} ({:?}): {} links in [{}, {}]",
            page_number,
            end,
            results.len(),
            start_date,
            end_date
        );

        results
    }

    async fn fetch_links(&self, page_url: &str) -> Result<Vec<ReportLink>, HarvestError> {
        let page = self.fetcher.fetch(page_url).await?;
        let body = page.text().await?;
        self.extractor.extract(&body)
    }
}
