//! Report link extraction from listing pages
//!
//! The collector depends only on the [`LinkExtractor`] trait. The bundled
//! [`BulletinLinkExtractor`] understands the exchange's bulletin listing:
//! report anchors carry a fixed CSS class and embed the trading date in
//! the file name right after a path marker.

use crate::crawler::ReportLink;
use crate::HarvestError;
use chrono::NaiveDate;
use scraper::{Html, Selector};
use url::Url;

/// CSS selector for report anchors on the bulletin listing
const REPORT_ANCHOR_SELECTOR: &str = "a.accordeon-inner__item-title.link.xls[href]";

/// Date format embedded in report file names (`oil_xls_20240310162000.xls`)
const LINK_DATE_FORMAT: &str = "%Y%m%d";

/// Extracts `(url, date)` pairs from a listing page body
pub trait LinkExtractor: Send + Sync {
    /// Returns the report links found on the page, in document order
    fn extract(&self, page: &str) -> Result<Vec<ReportLink>, HarvestError>;
}

/// Link extractor for the exchange bulletin listing
#[derive(Debug, Clone)]
pub struct BulletinLinkExtractor {
    base_url: Url,
    marker: String,
}

impl BulletinLinkExtractor {
    /// Creates an extractor resolving relative links against `site_url`
    ///
    /// # Arguments
    ///
    /// * `site_url` - Site root, e.g. `https://spimex.com`
    /// * `marker` - Path fragment preceding the date, e.g. `/upload/reports/oil_xls/oil_xls_`
    pub fn new(site_url: &str, marker: impl Into<String>) -> Result<Self, HarvestError> {
        Ok(Self {
            base_url: Url::parse(site_url)?,
            marker: marker.into(),
        })
    }

    /// Resolves an href to an absolute report URL and its date
    ///
    /// Returns None if the href is not a dated `.xls` report link.
    fn resolve_link(&self, href: &str) -> Option<ReportLink> {
        let href = href.trim();
        let href = href.split('?').next().unwrap_or(href);

        let date_start = href.find(&self.marker)? + self.marker.len();
        if !href.ends_with(".xls") {
            return None;
        }

        let published_date = match parse_link_date(&href[date_start..]) {
            Some(date) => date,
            None => {
                tracing::debug!("Skipping report link with undecodable date: {}", href);
                return None;
            }
        };

        let url = self.base_url.join(href).ok()?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return None;
        }

        Some(ReportLink::new(url.to_string(), published_date))
    }
}

impl LinkExtractor for BulletinLinkExtractor {
    fn extract(&self, page: &str) -> Result<Vec<ReportLink>, HarvestError> {
        let document = Html::parse_document(page);
        let selector = Selector::parse(REPORT_ANCHOR_SELECTOR)
            .map_err(|e| HarvestError::parse("report link selector", e.to_string()))?;

        let links = document
            .select(&selector)
            .filter_map(|element| element.value().attr("href"))
            .filter_map(|href| self.resolve_link(href))
            .collect();

        Ok(links)
    }
}

/// Reads the leading `YYYYMMDD` of a report file name
fn parse_link_date(tail: &str) -> Option<NaiveDate> {
    let digits = tail.get(..8)?;
    NaiveDate::parse_from_str(digits, LINK_DATE_FORMAT).ok()
}
