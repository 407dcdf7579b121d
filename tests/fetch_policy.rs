//! Integration tests for the request-routing policy.
//!
//! Navigations are network-first with cache-then-offline fallback; assets
//! are cache-first; only successful same-origin responses are written
//! back. A wiremock server plays the origin, and a closed local port plays
//! a dead network.

use std::path::Path;

use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sitecache::{
    Agent, AgentConfig, CachedResponse, FetchError, PageRequest, ServedFrom,
};

/// Connection-refused origin for simulating a dead network.
const DEAD_ORIGIN: &str = "http://127.0.0.1:9";

fn test_config(origin: &str, cache_root: &Path) -> AgentConfig {
    AgentConfig {
        origin: origin.to_string(),
        cache_version: "v1".to_string(),
        precache: vec!["/".to_string(), "/offline".to_string()],
        offline_path: "/offline".to_string(),
        manifest_path: "/mix-manifest.json".to_string(),
        manifest_username: "user".to_string(),
        manifest_assets: vec![],
        cache_root: Some(cache_root.to_path_buf()),
    }
}

fn agent_for(origin: &str, cache_root: &Path) -> Agent {
    Agent::new(test_config(origin, cache_root)).unwrap()
}

#[tokio::test]
async fn test_navigation_prefers_network_and_writes_back() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(b"<html>fresh</html>".to_vec(), "text/html"),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let agent = agent_for(&server.uri(), dir.path());
    let interceptor = agent.interceptor().unwrap();

    let url = Url::parse(&format!("{}/page", server.uri())).unwrap();
    let response = interceptor
        .intercept(&PageRequest::navigation(url.clone()))
        .await
        .expect("intercept failed");

    assert_eq!(response.served_from, ServedFrom::Network);
    assert_eq!(response.body, b"<html>fresh</html>");
    assert_eq!(response.content_type.as_deref(), Some("text/html"));

    let store = agent.stores().open_current().unwrap();
    let cached = store.get(url.as_str()).unwrap().expect("entry missing");
    assert_eq!(cached.body, b"<html>fresh</html>");
}

#[tokio::test]
async fn test_navigation_falls_back_to_cached_page() {
    let dir = TempDir::new().unwrap();
    let agent = agent_for(DEAD_ORIGIN, dir.path());

    let page_url = format!("{}/about", DEAD_ORIGIN);
    let store = agent.stores().open_current().unwrap();
    store
        .put(&CachedResponse::new(
            &page_url,
            200,
            Some("text/html".to_string()),
            b"<html>stale but served</html>".to_vec(),
        ))
        .unwrap();

    let interceptor = agent.interceptor().unwrap();
    let response = interceptor
        .intercept(&PageRequest::navigation(Url::parse(&page_url).unwrap()))
        .await
        .expect("intercept failed");

    assert_eq!(response.served_from, ServedFrom::Cache);
    assert_eq!(response.body, b"<html>stale but served</html>");
}

#[tokio::test]
async fn test_navigation_falls_back_to_offline_page() {
    let dir = TempDir::new().unwrap();
    let agent = agent_for(DEAD_ORIGIN, dir.path());

    let store = agent.stores().open_current().unwrap();
    store
        .put(&CachedResponse::new(
            &format!("{}/offline", DEAD_ORIGIN),
            200,
            Some("text/html".to_string()),
            b"<html>you are offline</html>".to_vec(),
        ))
        .unwrap();

    let interceptor = agent.interceptor().unwrap();
    let url = Url::parse(&format!("{}/never-visited", DEAD_ORIGIN)).unwrap();
    let response = interceptor
        .intercept(&PageRequest::navigation(url))
        .await
        .expect("intercept failed");

    assert_eq!(response.served_from, ServedFrom::OfflineFallback);
    assert_eq!(response.body, b"<html>you are offline</html>");
}

#[tokio::test]
async fn test_navigation_with_cold_cache_yields_no_response() {
    let dir = TempDir::new().unwrap();
    let agent = agent_for(DEAD_ORIGIN, dir.path());
    let interceptor = agent.interceptor().unwrap();

    let url = Url::parse(&format!("{}/anything", DEAD_ORIGIN)).unwrap();
    let result = interceptor.intercept(&PageRequest::navigation(url)).await;

    assert!(matches!(
        result,
        Err(FetchError::OfflineUnavailable { .. })
    ));
}

#[tokio::test]
async fn test_asset_cache_hit_never_touches_network() {
    let server = MockServer::start().await;
    // Zero expected requests: a cache hit must not reach the origin.
    Mock::given(method("GET"))
        .and(path("/css/app.css"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let agent = agent_for(&server.uri(), dir.path());

    let asset_url = format!("{}/css/app.css", server.uri());
    let store = agent.stores().open_current().unwrap();
    store
        .put(&CachedResponse::new(
            &asset_url,
            200,
            Some("text/css".to_string()),
            b"body{}".to_vec(),
        ))
        .unwrap();

    let interceptor = agent.interceptor().unwrap();
    let response = interceptor
        .intercept(&PageRequest::new(Url::parse(&asset_url).unwrap()))
        .await
        .expect("intercept failed");

    assert_eq!(response.served_from, ServedFrom::Cache);
    assert_eq!(response.body, b"body{}");
}

#[tokio::test]
async fn test_asset_miss_fetches_once_then_serves_from_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/js/app.js"))
        .respond_with(ResponseTemplate::new(200).set_body_string("app()"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let agent = agent_for(&server.uri(), dir.path());
    let interceptor = agent.interceptor().unwrap();
    let url = Url::parse(&format!("{}/js/app.js", server.uri())).unwrap();

    let first = interceptor
        .intercept(&PageRequest::new(url.clone()))
        .await
        .expect("first intercept failed");
    assert_eq!(first.served_from, ServedFrom::Network);

    let second = interceptor
        .intercept(&PageRequest::new(url))
        .await
        .expect("second intercept failed");
    assert_eq!(second.served_from, ServedFrom::Cache);
    assert_eq!(second.body, b"app()");
}

#[tokio::test]
async fn test_cross_origin_is_served_but_never_cached() {
    let third_party = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/embed"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html>embed</html>")
                .insert_header("content-type", "text/html"),
        )
        .mount(&third_party)
        .await;
    Mock::given(method("GET"))
        .and(path("/widget.js"))
        .respond_with(ResponseTemplate::new(200).set_body_string("widget()"))
        .expect(2)
        .mount(&third_party)
        .await;

    let dir = TempDir::new().unwrap();
    // The controlled origin is a different host:port than the third party.
    let agent = agent_for("https://example.com", dir.path());
    let interceptor = agent.interceptor().unwrap();
    let store = agent.stores().open_current().unwrap();

    let embed_url = Url::parse(&format!("{}/embed", third_party.uri())).unwrap();
    let response = interceptor
        .intercept(&PageRequest::navigation(embed_url.clone()))
        .await
        .expect("intercept failed");
    assert_eq!(response.served_from, ServedFrom::Network);
    assert!(!store.contains(embed_url.as_str()));

    // Cross-origin assets bypass the cache entirely: both requests hit the
    // network, nothing is written.
    let widget_url = Url::parse(&format!("{}/widget.js", third_party.uri())).unwrap();
    for _ in 0..2 {
        let response = interceptor
            .intercept(&PageRequest::new(widget_url.clone()))
            .await
            .expect("intercept failed");
        assert_eq!(response.served_from, ServedFrom::Network);
    }
    assert!(!store.contains(widget_url.as_str()));
}

#[tokio::test]
async fn test_asset_network_failure_yields_no_response() {
    let dir = TempDir::new().unwrap();
    let agent = agent_for(DEAD_ORIGIN, dir.path());
    let interceptor = agent.interceptor().unwrap();

    let url = Url::parse(&format!("{}/css/app.css", DEAD_ORIGIN)).unwrap();
    let result = interceptor.intercept(&PageRequest::new(url)).await;

    assert!(matches!(result, Err(FetchError::Network(_))));
}

#[tokio::test]
async fn test_error_statuses_pass_through_uncached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let agent = agent_for(&server.uri(), dir.path());
    let interceptor = agent.interceptor().unwrap();

    let url = Url::parse(&format!("{}/gone", server.uri())).unwrap();
    let response = interceptor
        .intercept(&PageRequest::navigation(url.clone()))
        .await
        .expect("intercept failed");

    assert_eq!(response.status, 404);
    assert_eq!(response.served_from, ServedFrom::Network);

    let store = agent.stores().open_current().unwrap();
    assert!(!store.contains(url.as_str()));
}
