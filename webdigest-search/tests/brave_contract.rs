//! Brave provider and page fetch contract tests.
//!
//! These tests run the real HTTP code paths against a local mock server:
//! request shape (path, query parameters, auth header), response mapping,
//! and error mapping for non-success statuses.

use serde_json::json;
use webdigest_search::{
    fetch_page_content, BraveSearch, PageClient, SearchConfig, SearchError, SearchProvider,
};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> SearchConfig {
    SearchConfig {
        base_url: server.uri(),
        timeout_seconds: 5,
        user_agent: Some("WebDigestTest/1.0".into()),
        ..Default::default()
    }
}

#[tokio::test]
async fn request_carries_query_count_safesearch_and_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/res/v1/web/search"))
        .and(query_param("q", "rust async newer_than:30d"))
        .and(query_param("count", "20"))
        .and(query_param("safesearch", "moderate"))
        .and(header("X-Subscription-Token", "test-key"))
        .and(header("Accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "web": {"results": [{
                "title": "Async Rust",
                "url": "https://blog.test/async",
                "description": "Notes on async",
                "page_age": "2026-10-10T09:30:00",
                "meta_url": {"hostname": "blog.test"}
            }]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let brave = BraveSearch::new(config_for(&server), "test-key").expect("client");
    let results = brave.search("rust async", 1).await.expect("search succeeds");

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].title, "Async Rust");
    assert_eq!(results[0].published_at.as_deref(), Some("2026-10-10T09:30:00Z"));
    assert_eq!(results[0].source.as_deref(), Some("blog.test"));
}

#[tokio::test]
async fn strict_mode_requests_strict_safesearch() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/res/v1/web/search"))
        .and(query_param("safesearch", "strict"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let config = SearchConfig {
        strict: true,
        ..config_for(&server)
    };
    let brave = BraveSearch::new(config, "test-key").expect("client");
    let results = brave.search("topic", 1).await.expect("search succeeds");
    assert!(results.is_empty());
}

#[tokio::test]
async fn non_success_status_is_http_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/res/v1/web/search"))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
        .mount(&server)
        .await;

    let brave = BraveSearch::new(config_for(&server), "bad-key").expect("client");
    let err = brave.search("topic", 1).await.unwrap_err();
    assert!(matches!(err, SearchError::Http(_)), "got {err:?}");
    assert!(!err.to_string().contains("bad-key"));
}

#[tokio::test]
async fn malformed_body_is_parse_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/res/v1/web/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let brave = BraveSearch::new(config_for(&server), "test-key").expect("client");
    let err = brave.search("topic", 1).await.unwrap_err();
    assert!(matches!(err, SearchError::Parse(_)), "got {err:?}");
}

#[tokio::test]
async fn page_fetch_extracts_article_text() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=utf-8")
                .set_body_raw(
                    "<html><head><title>Launch</title></head><body>\
                     <nav>Menu</nav><article>The launch shipped on time.</article>\
                     </body></html>",
                    "text/html; charset=utf-8",
                ),
        )
        .mount(&server)
        .await;

    let url = format!("{}/article", server.uri());
    let page = fetch_page_content(&url, &config_for(&server), 1_000)
        .await
        .expect("fetch succeeds");
    assert_eq!(page.title, "Launch");
    assert_eq!(page.text, "The launch shipped on time.");
}

#[tokio::test]
async fn page_fetch_plain_text_passthrough() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/notes.txt"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/plain")
                .set_body_string("plain   text\nbody"),
        )
        .mount(&server)
        .await;

    let url = format!("{}/notes.txt", server.uri());
    let page = fetch_page_content(&url, &config_for(&server), 1_000)
        .await
        .expect("fetch succeeds");
    assert_eq!(page.text, "plain text body");
    assert_eq!(page.word_count, 3);
}

#[tokio::test]
async fn page_fetch_404_is_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let url = format!("{}/missing", server.uri());
    let result = fetch_page_content(&url, &config_for(&server), 1_000).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn page_body_read_is_capped_and_client_reused() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/long.txt"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/plain")
                .set_body_string("aaaa bbbb cccc dddd eeee"),
        )
        .expect(2)
        .mount(&server)
        .await;

    let pages = PageClient::new(&config_for(&server))
        .expect("client")
        .with_max_bytes(16);
    let url = format!("{}/long.txt", server.uri());

    let first = pages.fetch(&url, 1_000).await.expect("fetch succeeds");
    assert_eq!(first.text, "aaaa bbbb cccc d");
    assert_eq!(first.word_count, 4);

    let second = pages.fetch(&url, 1_000).await.expect("second fetch succeeds");
    assert_eq!(second.text, first.text);
}
