use std::sync::Arc;
use std::time::Duration;

use rillet::app::RilletError;
use rillet::fetcher::{FeedLoader, Fetcher, HttpFetcher};
use rillet::normalizer::Normalizer;
use rillet::store::{SqliteStore, Store};
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sample_rss() -> String {
    r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Test Feed</title>
    <link>http://example.com/</link>
    <description>Test description</description>
    <item>
      <title>Item 1</title>
      <link>http://example.com/1</link>
      <guid>item-1</guid>
      <pubDate>Mon, 21 Oct 2024 07:28:00 GMT</pubDate>
      <description>First</description>
    </item>
    <item>
      <title>Item 2</title>
      <link>http://example.com/2</link>
      <guid>item-2</guid>
      <pubDate>Mon, 21 Oct 2024 08:00:00 GMT</pubDate>
      <description>Second</description>
    </item>
  </channel>
</rss>"#
        .to_string()
}

async fn serve(server: &MockServer, route: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn fetch_returns_body_on_success() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/feed",
        ResponseTemplate::new(200)
            .insert_header("content-type", "application/rss+xml")
            .set_body_string(sample_rss()),
    )
    .await;

    let fetcher = HttpFetcher::new().unwrap();
    let body = assert_ok!(fetcher.fetch(&format!("{}/feed", server.uri())).await);

    assert_eq!(body, sample_rss().into_bytes());
}

#[tokio::test]
async fn fetch_reports_non_success_status() {
    let server = MockServer::start().await;
    serve(&server, "/missing", ResponseTemplate::new(404)).await;

    let fetcher = HttpFetcher::new().unwrap();
    let err = assert_err!(fetcher.fetch(&format!("{}/missing", server.uri())).await);

    assert!(matches!(err, RilletError::HttpStatus { status: 404, .. }));
}

#[tokio::test]
async fn fetch_rejects_empty_body() {
    let server = MockServer::start().await;
    serve(&server, "/empty", ResponseTemplate::new(200)).await;

    let fetcher = HttpFetcher::new().unwrap();
    let err = assert_err!(fetcher.fetch(&format!("{}/empty", server.uri())).await);

    assert!(matches!(err, RilletError::EmptyBody(_)));
}

#[tokio::test]
async fn fetch_times_out_on_slow_response() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/slow",
        ResponseTemplate::new(200)
            .set_body_string(sample_rss())
            .set_delay(Duration::from_secs(2)),
    )
    .await;

    let fetcher = HttpFetcher::with_timeout(Duration::from_millis(200)).unwrap();
    let err = assert_err!(fetcher.fetch(&format!("{}/slow", server.uri())).await);

    assert!(matches!(err, RilletError::Http(_)));
}

#[tokio::test]
async fn loader_over_http_caches_and_survives_failures() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/good",
        ResponseTemplate::new(200).set_body_string(sample_rss()),
    )
    .await;
    serve(&server, "/bad", ResponseTemplate::new(500)).await;

    let good = format!("{}/good", server.uri());
    let bad = format!("{}/bad", server.uri());
    let urls = vec![bad.clone(), good.clone()];

    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let loader = FeedLoader::new(
        Arc::new(HttpFetcher::with_timeout(Duration::from_secs(5)).unwrap()),
        store.clone(),
        Normalizer::default(),
    )
    .with_workers(2);

    let feeds = loader.load_all(&urls, false).await;

    assert_eq!(feeds.len(), 2);
    assert_eq!(feeds[0].url, bad);
    assert!(feeds[0].is_error());
    assert!(feeds[0].posts.is_empty());

    assert_eq!(feeds[1].url, good);
    assert_eq!(feeds[1].title, "Test Feed");
    let ids: Vec<&str> = feeds[1].posts.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, ["item-1", "item-2"]);
    assert_eq!(feeds[1].posts[0].published, "21/10/2024");

    assert!(store.load_raw_feed(&good).unwrap().is_some());
    assert!(store.load_raw_feed(&bad).unwrap().is_none());
    assert!(loader.should_prefer_cache());
}
