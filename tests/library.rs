//! Integration tests for the library flows: subscribe, refresh, read state
//! and icon persistence.
//!
//! Each test gets a fresh in-memory store and its own wiremock server.

use std::time::Duration;

use blackbird::config::Config;
use blackbird::feed::{FeedClient, FeedError};
use blackbird::storage::library::{
    mark_all_read, refresh, refresh_all, set_read, subscribe, unread_count,
};
use blackbird::storage::{shared, FeedId, FeedStore, MemoryStore, SharedStore};
use pretty_assertions::assert_eq;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

fn test_client() -> FeedClient {
    let config = Config {
        allow_private_hosts: true,
        icon_force_https: false,
        ..Config::default()
    };
    FeedClient::new(&config).unwrap()
}

fn rss(title: &str, items: &[(&str, &str)]) -> String {
    let items: String = items
        .iter()
        .map(|(guid, title)| {
            format!(
                "<item><guid>{guid}</guid><title>{title}</title>\
                 <link>https://site.example/{guid}</link></item>"
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0"?><rss version="2.0"><channel><title>{title}</title>
           <link>https://site.example/</link><description>d</description>{items}</channel></rss>"#
    )
}

async fn serve_once(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .up_to_n_times(1)
        .mount(server)
        .await;
}

async fn serve(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

fn titles(store: &SharedStore<MemoryStore>, feed_id: FeedId) -> Vec<String> {
    let guard = store.lock().unwrap();
    let mut titles: Vec<String> = guard
        .find_articles(&|a| a.feed_id == feed_id)
        .iter()
        .map(|a| a.article.title.clone())
        .collect();
    titles.sort();
    titles
}

// ============================================================================
// Subscribe + refresh
// ============================================================================

#[tokio::test]
async fn test_subscribe_then_refresh_keeps_user_state() {
    let server = MockServer::start().await;
    serve_once(&server, "/feed", rss("Site", &[("1", "One"), ("2", "Two")])).await;
    serve(
        &server,
        "/feed",
        rss("Site renamed", &[("1", "One edited"), ("2", "Two"), ("3", "Three")]),
    )
    .await;

    let store = shared(MemoryStore::new());
    let client = test_client();
    let url = format!("{}/feed", server.uri());
    let feed_id = subscribe(&client, &store, &url, Some("blogs"), None)
        .await
        .unwrap();
    assert_eq!(unread_count(&store, feed_id).unwrap(), 2);

    let first = store.lock().unwrap().find_articles(&|a| a.article.title == "One")[0].id;
    set_read(&store, first, true).unwrap();

    let inserted = refresh(&client, &store, feed_id, None).await.unwrap();
    assert_eq!(inserted, 1);
    assert_eq!(titles(&store, feed_id), vec!["One", "Three", "Two"]);
    assert_eq!(unread_count(&store, feed_id).unwrap(), 2);

    let guard = store.lock().unwrap();
    let stored = guard.feed(feed_id).unwrap();
    assert_eq!(stored.feed.title, "Site renamed");
    assert_eq!(stored.feed.category_id.as_deref(), Some("blogs"));
    assert!(!guard.has_unsaved_changes());
}

#[tokio::test]
async fn test_subscribe_duplicate_url_rejected() {
    let server = MockServer::start().await;
    serve(&server, "/feed", rss("Site", &[("1", "One")])).await;

    let store = shared(MemoryStore::new());
    let client = test_client();
    let url = format!("{}/feed", server.uri());
    subscribe(&client, &store, &url, None, None).await.unwrap();

    let err = subscribe(&client, &store, &url, None, None).await.unwrap_err();
    assert!(matches!(err, FeedError::DuplicateFeed(_)));
    assert_eq!(store.lock().unwrap().article_count(), 1);
}

#[tokio::test]
async fn test_refresh_all_isolates_failures() {
    let server = MockServer::start().await;
    serve(&server, "/ok", rss("Ok", &[("a", "A")])).await;
    serve_once(&server, "/flaky", rss("Flaky", &[("b", "B")])).await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let store = shared(MemoryStore::new());
    let client = test_client();
    let ok = subscribe(&client, &store, &format!("{}/ok", server.uri()), None, None)
        .await
        .unwrap();
    let flaky = subscribe(&client, &store, &format!("{}/flaky", server.uri()), None, None)
        .await
        .unwrap();

    let mut results = refresh_all(&client, &store, None).await.unwrap();
    results.sort_by_key(|r| r.feed_id);
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].feed_id, ok);
    assert!(matches!(results[0].result, Ok(0)));
    assert_eq!(results[1].feed_id, flaky);
    assert!(results[1].result.is_err());

    assert_eq!(mark_all_read(&store, None).unwrap(), 2);
    assert_eq!(unread_count(&store, ok).unwrap(), 0);
}

// ============================================================================
// Icons
// ============================================================================

#[tokio::test]
async fn test_subscribe_stores_resolved_icon() {
    let server = MockServer::start().await;
    serve(&server, "/feed", rss("Site", &[("1", "One")])).await;
    Mock::given(method("GET"))
        .and(path("/favicon.ico"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(PNG))
        .mount(&server)
        .await;

    let store = shared(MemoryStore::new());
    let url = format!("{}/feed", server.uri());
    let feed_id = subscribe(&test_client(), &store, &url, None, None)
        .await
        .unwrap();

    // Icon resolution is detached from subscribe; poll for it.
    let mut icon = None;
    for _ in 0..100 {
        icon = store.lock().unwrap().feed(feed_id).unwrap().feed.icon.clone();
        if icon.is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(icon.as_deref(), Some(PNG));
}
