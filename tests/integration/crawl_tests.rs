//! Listing walk and download tests against a mock bulletin site

use crate::common::{date, listing_page, report_href, LISTING_PATH, MARKER};
use bulletin_harvest::config::HttpConfig;
use bulletin_harvest::crawler::{
    BulletinLinkExtractor, FileDownloader, LinkCollector, PageFetcher, RateLimiter,
};
use bulletin_harvest::ReportLink;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

fn fetcher() -> PageFetcher {
    PageFetcher::from_config(&HttpConfig::default()).expect("Failed to build fetcher")
}

async fn mount_page(server: &MockServer, page: Option<u32>, body: String, expected: Option<u64>) {
    let mut mock = Mock::given(method("GET")).and(path(LISTING_PATH));
    if let Some(n) = page {
        mock = mock.and(query_param("page", format!("page-{}", n)));
    }
    let mut mock = mock.respond_with(
        ResponseTemplate::new(200)
            .set_body_string(body)
            .insert_header("content-type", "text/html; charset=utf-8"),
    );
    if let Some(times) = expected {
        mock = mock.expect(times);
    }
    mock.mount(server).await;
}

#[tokio::test]
async fn test_walk_stops_at_window_start() {
    let mock_server = MockServer::start().await;
    let site = mock_server.uri();

    // Page-specific mocks first: the first mounted match wins
    mount_page(
        &mock_server,
        Some(3),
        listing_page(&[report_href(date(2022, 12, 1))]),
        Some(0),
    )
    .await;
    mount_page(
        &mock_server,
        Some(2),
        listing_page(&[report_href(date(2022, 12, 31))]),
        Some(1),
    )
    .await;
    mount_page(
        &mock_server,
        None,
        listing_page(&[report_href(date(2024, 3, 10)), report_href(date(2024, 3, 5))]),
        Some(1),
    )
    .await;

    let fetcher = fetcher();
    let extractor = BulletinLinkExtractor::new(&site, MARKER).unwrap();
    let collector = LinkCollector::new(
        &fetcher,
        &extractor,
        format!("{}{}", site, LISTING_PATH),
        "?page=page-{page}",
        20,
    );

    let links = collector
        .collect(date(2023, 1, 1), date(2024, 12, 31))
        .await;

    let dates: Vec<_> = links.iter().map(|l| l.published_date).collect();
    assert_eq!(dates, vec![date(2024, 3, 10), date(2024, 3, 5)]);
    assert!(links[0].url.starts_with(&site));
    assert!(links[0].url.ends_with("oil_xls_20240310162000.xls"));
    assert!(!links[0].url.contains("?r="));
}

#[tokio::test]
async fn test_links_after_window_end_are_skipped_not_terminal() {
    let mock_server = MockServer::start().await;
    let site = mock_server.uri();

    mount_page(
        &mock_server,
        Some(2),
        listing_page(&[report_href(date(2024, 2, 20)), report_href(date(2024, 1, 31))]),
        Some(1),
    )
    .await;
    mount_page(
        &mock_server,
        None,
        listing_page(&[report_href(date(2024, 3, 10)), report_href(date(2024, 3, 1))]),
        Some(1),
    )
    .await;

    let fetcher = fetcher();
    let extractor = BulletinLinkExtractor::new(&site, MARKER).unwrap();
    let collector = LinkCollector::new(
        &fetcher,
        &extractor,
        format!("{}{}", site, LISTING_PATH),
        "?page=page-{page}",
        20,
    );

    let links = collector.collect(date(2024, 2, 1), date(2024, 2, 29)).await;

    let dates: Vec<_> = links.iter().map(|l| l.published_date).collect();
    assert_eq!(dates, vec![date(2024, 2, 20)]);
}

#[tokio::test]
async fn test_fetch_error_returns_partial_result() {
    let mock_server = MockServer::start().await;
    let site = mock_server.uri();

    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .and(query_param("page", "page-2"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_page(
        &mock_server,
        None,
        listing_page(&[report_href(date(2024, 3, 10))]),
        Some(1),
    )
    .await;

    let fetcher = fetcher();
    let extractor = BulletinLinkExtractor::new(&site, MARKER).unwrap();
    let collector = LinkCollector::new(
        &fetcher,
        &extractor,
        format!("{}{}", site, LISTING_PATH),
        "?page=page-{page}",
        20,
    );

    let links = collector.collect(date(2023, 1, 1), date(2024, 12, 31)).await;

    assert_eq!(links.len(), 1);
    assert_eq!(links[0].published_date, date(2024, 3, 10));
}

#[tokio::test]
async fn test_empty_page_ends_walk() {
    let mock_server = MockServer::start().await;
    let site = mock_server.uri();

    mount_page(&mock_server, Some(3), listing_page(&[]), Some(0)).await;
    mount_page(&mock_server, Some(2), listing_page(&[]), Some(1)).await;
    mount_page(
        &mock_server,
        None,
        listing_page(&[report_href(date(2024, 3, 10))]),
        Some(1),
    )
    .await;

    let fetcher = fetcher();
    let extractor = BulletinLinkExtractor::new(&site, MARKER).unwrap();
    let collector = LinkCollector::new(
        &fetcher,
        &extractor,
        format!("{}{}", site, LISTING_PATH),
        "?page=page-{page}",
        20,
    );

    let links = collector.collect(date(2020, 1, 1), date(2024, 12, 31)).await;
    assert_eq!(links.len(), 1);
}

#[tokio::test]
async fn test_download_is_idempotent() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/upload/reports/oil_xls/oil_xls_20240310162000.xls"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"report body".to_vec()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let downloader = FileDownloader::new(
        dir.path().join("downloads"),
        fetcher(),
        Arc::new(RateLimiter::new(7, Duration::from_secs(1))),
    );
    let url = format!(
        "{}/upload/reports/oil_xls/oil_xls_20240310162000.xls",
        mock_server.uri()
    );

    let first = downloader
        .download(&url, "oil_xls_20240310162000.xls")
        .await
        .expect("First download failed");
    let second = downloader
        .download(&url, "oil_xls_20240310162000.xls")
        .await
        .expect("Second download failed");

    assert_eq!(first, second);
    assert_eq!(std::fs::read(&first).unwrap(), b"report body");
}

#[tokio::test]
async fn test_failed_download_leaves_no_file() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let downloads = dir.path().join("downloads");
    let downloader = FileDownloader::new(
        downloads.clone(),
        fetcher(),
        Arc::new(RateLimiter::new(7, Duration::from_secs(1))),
    );

    let result = downloader
        .download(&format!("{}/broken.xls", mock_server.uri()), "broken.xls")
        .await;

    assert!(result.is_err());
    assert!(!downloads.join("broken.xls").exists());
}

#[tokio::test]
async fn test_download_all_isolates_failures() {
    let mock_server = MockServer::start().await;
    let site = mock_server.uri();

    Mock::given(method("GET"))
        .and(path(report_href(date(2024, 3, 6))))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"xls".to_vec()))
        .mount(&mock_server)
        .await;

    let links: Vec<ReportLink> = (4..=8)
        .map(|day| {
            let d = date(2024, 3, day);
            ReportLink::new(format!("{}{}", site, report_href(d)), d)
        })
        .collect();

    let dir = TempDir::new().unwrap();
    let downloader = FileDownloader::new(
        dir.path().join("downloads"),
        fetcher(),
        Arc::new(RateLimiter::new(7, Duration::from_secs(1))),
    );

    let batch = downloader.download_all(&links).await;

    assert_eq!(batch.files.len(), 4);
    assert_eq!(batch.failures.len(), 1);
    assert_eq!(batch.failures[0].link.published_date, date(2024, 3, 6));
    let dates: Vec<_> = batch.files.iter().map(|f| f.published_date).collect();
    assert_eq!(
        dates,
        vec![date(2024, 3, 4), date(2024, 3, 5), date(2024, 3, 7), date(2024, 3, 8)]
    );
    assert!(batch.files.iter().all(|f| f.path.exists()));
}

/// Records when each request reached the server
struct StampingResponder {
    stamps: Arc<Mutex<Vec<Instant>>>,
}

impl Respond for StampingResponder {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        self.stamps.lock().unwrap().push(Instant::now());
        ResponseTemplate::new(200).set_body_bytes(b"xls".to_vec())
    }
}

#[tokio::test]
async fn test_download_all_respects_rate_limit() {
    let mock_server = MockServer::start().await;
    let site = mock_server.uri();
    let stamps = Arc::new(Mutex::new(Vec::new()));

    Mock::given(method("GET"))
        .respond_with(StampingResponder {
            stamps: Arc::clone(&stamps),
        })
        .expect(5)
        .mount(&mock_server)
        .await;

    let links: Vec<ReportLink> = (4..=8)
        .map(|day| {
            let d = date(2024, 3, day);
            ReportLink::new(format!("{}{}", site, report_href(d)), d)
        })
        .collect();

    let quota = 2;
    let window = Duration::from_millis(300);
    let dir = TempDir::new().unwrap();
    let downloader = FileDownloader::new(
        dir.path().join("downloads"),
        fetcher(),
        Arc::new(RateLimiter::new(quota, window)),
    );

    let batch = downloader.download_all(&links).await;
    assert_eq!(batch.files.len(), 5);
    assert!(batch.failures.is_empty());

    // Any quota + 1 consecutive requests must span at least one window;
    // the margin absorbs the gap between the limiter and the server
    let mut stamps = stamps.lock().unwrap().clone();
    stamps.sort();
    assert_eq!(stamps.len(), 5);
    let margin = Duration::from_millis(50);
    for pair in stamps.windows(quota + 1) {
        let span = pair[quota] - pair[0];
        assert!(
            span + margin >= window,
            "{} requests started within {:?}",
            quota + 1,
            span
        );
    }
}
