use crate::config::types::{
    Config, DownloadConfig, HttpConfig, ImportConfig, SourceConfig,
};
use crate::ConfigError;
use url::Url;

/// Largest chunk accepted for existence checks and inserts
///
/// Each existence-check key binds two SQLite parameters; this keeps a
/// single statement well under SQLite's parameter ceiling.
const MAX_CHUNK_SIZE: usize = 10_000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_source_config(&config.source)?;
    validate_window(config)?;
    validate_http_config(&config.http)?;
    validate_download_config(&config.download)?;
    validate_import_config(&config.import)?;
    Ok(())
}

/// Validates listing location and pagination settings
fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    validate_http_url("listing_url", &config.listing_url)?;
    validate_http_url("site_url", &config.site_url)?;

    if !config.page_query.contains("{page}") {
        return Err(ConfigError::Validation(format!(
            "page_query must contain a {{page}} placeholder, got '{}'",
            config.page_query
        )));
    }

    if config.link_marker.is_empty() {
        return Err(ConfigError::Validation(
            "link_marker cannot be empty".to_string(),
        ));
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    Ok(())
}

/// Validates that the date window is not inverted
fn validate_window(config: &Config) -> Result<(), ConfigError> {
    let end_date = config.end_date();
    if config.window.start_date > end_date {
        return Err(ConfigError::Validation(format!(
            "start_date {} is after end_date {}",
            config.window.start_date, end_date
        )));
    }
    Ok(())
}

/// Validates HTTP client settings
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.max_concurrent_requests < 1 || config.max_concurrent_requests > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_requests must be between 1 and 100, got {}",
            config.max_concurrent_requests
        )));
    }

    if config.timeout_secs < 1 || config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeout_secs and connect_timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates download stage settings
fn validate_download_config(config: &DownloadConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "download directory cannot be empty".to_string(),
        ));
    }

    if config.rate_limit_quota < 1 {
        return Err(ConfigError::Validation(format!(
            "rate_limit_quota must be >= 1, got {}",
            config.rate_limit_quota
        )));
    }

    if config.rate_limit_window_ms < 1 {
        return Err(ConfigError::Validation(format!(
            "rate_limit_window_ms must be >= 1, got {}",
            config.rate_limit_window_ms
        )));
    }

    Ok(())
}

/// Validates import stage settings
fn validate_import_config(config: &ImportConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    validate_chunk_size("check_chunk_size", config.check_chunk_size)?;
    validate_chunk_size("insert_batch_size", config.insert_batch_size)?;

    Ok(())
}

fn validate_chunk_size(name: &str, size: usize) -> Result<(), ConfigError> {
    if size < 1 || size > MAX_CHUNK_SIZE {
        return Err(ConfigError::Validation(format!(
            "{} must be between 1 and {}, got {}",
            name, MAX_CHUNK_SIZE, size
        )));
    }
    Ok(())
}

/// Validates that a URL parses and uses http or https
fn validate_http_url(name: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", name, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "{} '{}' must use http or https",
            name, value
        )));
    }

    Ok(())
}
