//! Shared fixtures for the integration tests

use bulletin_harvest::config::{
    Config, DownloadConfig, HttpConfig, ImportConfig, ParseConfig, SourceConfig, WindowConfig,
};
use chrono::NaiveDate;
use std::path::Path;

/// Listing path served by the mock site
pub const LISTING_PATH: &str = "/markets/oil_products/trades/results/";

/// Report link marker used by the mock site
pub const MARKER: &str = "/upload/reports/oil_xls/oil_xls_";

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Relative href of the report for `date`
pub fn report_href(date: NaiveDate) -> String {
    format!("{}{}162000.xls", MARKER, date.format("%Y%m%d"))
}

/// Renders a listing page holding the given report anchors
pub fn listing_page(hrefs: &[String]) -> String {
    let anchors: String = hrefs
        .iter()
        .map(|href| {
            format!(
                r#"<div class="accordeon-inner__wrap-item">
                <a class="accordeon-inner__item-title link xls" href="{}?r=4242" target="_blank">Бюллетень</a>
                </div>"#,
                href
            )
        })
        .collect();
    format!(
        "<html><head><title>Results</title></head><body>{}</body></html>",
        anchors
    )
}

/// Builds a configuration pointing at the mock site
pub fn test_config(site_url: &str, work_dir: &Path, start: NaiveDate, end: NaiveDate) -> Config {
    Config {
        source: SourceConfig {
            listing_url: format!("{}{}", site_url, LISTING_PATH),
            site_url: site_url.to_string(),
            page_query: "?page=page-{page}".to_string(),
            link_marker: MARKER.to_string(),
            max_pages: 20,
        },
        window: WindowConfig {
            start_date: start,
            end_date: Some(end),
        },
        http: HttpConfig {
            user_agent: "bulletin-harvest-tests/1.0".to_string(),
            timeout_secs: 5,
            connect_timeout_secs: 2,
            ..HttpConfig::default()
        },
        download: DownloadConfig {
            directory: work_dir.join("downloads").display().to_string(),
            rate_limit_quota: 7,
            rate_limit_window_ms: 1000,
        },
        parse: ParseConfig { workers: 2 },
        import: ImportConfig {
            database_path: work_dir.join("harvest.db").display().to_string(),
            check_chunk_size: 1000,
            insert_batch_size: 1000,
        },
    }
}
