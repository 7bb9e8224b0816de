//! Response classification and gate release in the page fetcher

use bulletin_harvest::config::HttpConfig;
use bulletin_harvest::crawler::PageFetcher;
use bulletin_harvest::HarvestError;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher(max_concurrent: u32) -> PageFetcher {
    let config = HttpConfig {
        max_concurrent_requests: max_concurrent,
        timeout_secs: 5,
        ..HttpConfig::default()
    };
    PageFetcher::from_config(&config).expect("Failed to build fetcher")
}

#[tokio::test]
async fn test_success_returns_body() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .mount(&mock_server)
        .await;

    let fetcher = fetcher(2);
    let page = fetcher
        .fetch(&format!("{}/page", mock_server.uri()))
        .await
        .expect("Fetch failed");

    assert_eq!(page.status(), 200);
    assert_eq!(page.text().await.unwrap(), "<html>ok</html>");
    assert_eq!(fetcher.available_permits(), 2);
}

#[tokio::test]
async fn test_429_is_rate_limited() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&mock_server)
        .await;

    let fetcher = fetcher(2);
    let result = fetcher.fetch(&format!("{}/busy", mock_server.uri())).await;

    match result {
        Err(e @ HarvestError::RateLimited { .. }) => assert!(e.is_rate_limited()),
        other => panic!("Expected RateLimited, got {:?}", other.map(|p| p.status())),
    }
    assert_eq!(fetcher.available_permits(), 2);
}

#[tokio::test]
async fn test_server_error_is_http_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let fetcher = fetcher(1);
    let result = fetcher.fetch(&format!("{}/broken", mock_server.uri())).await;

    match result {
        Err(e @ HarvestError::Http { status: 500, .. }) => {
            assert!(e.is_transport());
            assert!(!e.is_rate_limited());
        }
        other => panic!("Expected Http 500, got {:?}", other.map(|p| p.status())),
    }
    assert_eq!(fetcher.available_permits(), 1);
}

#[tokio::test]
async fn test_not_found_is_http_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let result = fetcher(1)
        .fetch(&format!("{}/missing.xls", mock_server.uri()))
        .await;

    assert!(matches!(result, Err(HarvestError::Http { status: 404, .. })));
}

#[tokio::test]
async fn test_unread_page_releases_permit() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("body"))
        .mount(&mock_server)
        .await;

    let fetcher = fetcher(1);
    let url = format!("{}/a", mock_server.uri());

    let page = fetcher.fetch(&url).await.unwrap();
    assert_eq!(fetcher.available_permits(), 0);
    drop(page);
    assert_eq!(fetcher.available_permits(), 1);

    // A second fetch would block forever if the permit leaked
    let second = tokio::time::timeout(std::time::Duration::from_secs(5), fetcher.fetch(&url))
        .await
        .expect("Gate permit was not released");
    assert!(second.is_ok());
}
