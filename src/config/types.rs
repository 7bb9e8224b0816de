use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Main configuration structure for Bulletin-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub source: SourceConfig,
    pub window: WindowConfig,
    #[serde(default)]
    pub http: HttpConfig,
    pub download: DownloadConfig,
    #[serde(default)]
    pub parse: ParseConfig,
    pub import: ImportConfig,
}

/// Bulletin listing location and pagination
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SourceConfig {
    /// URL of the first listing page
    pub listing_url: String,

    /// Site root used to resolve relative report links
    pub site_url: String,

    /// Query appended to the listing URL for pages after the first;
    /// `{page}` is replaced with the page number
    #[serde(default = "default_page_query")]
    pub page_query: String,

    /// Path fragment that identifies report links; the date follows it
    #[serde(default = "default_link_marker")]
    pub link_marker: String,

    /// Hard ceiling on listing pages walked in one run
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

/// Inclusive date window of bulletins to harvest
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WindowConfig {
    pub start_date: NaiveDate,

    /// Defaults to today when omitted
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

/// HTTP client settings shared by listing and file requests
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HttpConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Maximum number of requests in flight at once
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: u32,

    /// Extra default headers (Accept, Referer, ...)
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Cookies sent with every request
    #[serde(default)]
    pub cookies: BTreeMap<String, String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            max_concurrent_requests: default_max_concurrent_requests(),
            headers: BTreeMap::new(),
            cookies: BTreeMap::new(),
        }
    }
}

/// Download stage configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DownloadConfig {
    /// Directory that holds downloaded report files
    pub directory: String,

    /// Downloads allowed per rate-limit window
    #[serde(default = "default_rate_limit_quota")]
    pub rate_limit_quota: u32,

    /// Length of the rate-limit window (milliseconds)
    #[serde(default = "default_rate_limit_window_ms")]
    pub rate_limit_window_ms: u64,
}

/// Parse stage configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ParseConfig {
    /// Worker threads for spreadsheet parsing, 0 means one per CPU
    #[serde(default)]
    pub workers: usize,
}

/// Import stage configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ImportConfig {
    /// Path to the SQLite database file
    pub database_path: String,

    /// Natural keys per existence-check query
    #[serde(default = "default_chunk_size")]
    pub check_chunk_size: usize,

    /// Records per bulk insert
    #[serde(default = "default_chunk_size")]
    pub insert_batch_size: usize,
}

impl Config {
    /// Returns the configured end of the window, or today
    pub fn end_date(&self) -> NaiveDate {
        self.window
            .end_date
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}

fn default_page_query() -> String {
    "?page=page-{page}".to_string()
}

fn default_link_marker() -> String {
    "/upload/reports/oil_xls/oil_xls_".to_string()
}

fn default_max_pages() -> u32 {
    500
}

fn default_user_agent() -> String {
    format!("bulletin-harvest/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_max_concurrent_requests() -> u32 {
    7
}

fn default_rate_limit_quota() -> u32 {
    7
}

fn default_rate_limit_window_ms() -> u64 {
    1000
}

fn default_chunk_size() -> usize {
    1000
}
