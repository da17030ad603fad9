mod common;

use axum_test::TestServer;
use chrono::{Duration, Utc};
use common::{Harness, TEST_SALT, browser, link};
use link_redirector::infrastructure::hot_links::HotLinkTracker;
use link_redirector::utils::password::hash_password;

#[tokio::test]
async fn test_preview_shows_metadata_without_counting() {
    let harness = Harness::new();
    let mut promo = link(1, "promo-2024", "https://example.com/promo");
    promo.title = Some("Spring promo".to_string());
    promo.max_clicks = Some(500);
    harness.links.insert(promo);
    let server = TestServer::new(harness.router()).unwrap();

    let response = server.get("/links/preview/promo-2024").await;

    response.assert_status_ok();
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["slug"], "promo-2024");
    assert_eq!(json["destination"], "https://example.com/promo");
    assert_eq!(json["title"], "Spring promo");
    assert_eq!(json["requires_password"], false);
    assert_eq!(json["redirect_kind"], "permanent");
    assert_eq!(json["click_count"], 0);
    assert_eq!(json["max_clicks"], 500);
    assert_eq!(json["unique_visitors_today"], 0);

    assert!(harness.take_queued().await.is_empty());
    assert!(harness.hot_links.top(5).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_preview_counts_unique_visitors() {
    let harness = Harness::new();
    harness.links.insert(link(2, "daily", "https://example.com"));

    for ip in ["192.0.2.1", "192.0.2.2", "192.0.2.1"] {
        harness
            .resolver
            .resolve("daily", None, browser(ip))
            .await
            .unwrap();
    }
    harness.flush_clicks().await;

    let server = TestServer::new(harness.router()).unwrap();
    let json = server
        .get("/links/preview/daily")
        .await
        .json::<serde_json::Value>();

    assert_eq!(json["click_count"], 3);
    assert_eq!(json["unique_visitors_today"], 2);
}

#[tokio::test]
async fn test_preview_hides_protected_destination() {
    let harness = Harness::new();
    let mut vip = link(3, "vip", "https://example.com/vip");
    vip.password_hash = Some(hash_password("secret123", TEST_SALT).unwrap());
    harness.links.insert(vip);
    let server = TestServer::new(harness.router()).unwrap();

    let json = server
        .get("/links/preview/vip")
        .await
        .json::<serde_json::Value>();

    assert_eq!(json["requires_password"], true);
    assert!(json.get("destination").is_none());
}

#[tokio::test]
async fn test_preview_of_expired_link_still_answers() {
    let harness = Harness::new();
    let mut expired = link(4, "gone", "https://example.com");
    expired.expires_at = Some(Utc::now() - Duration::days(1));
    harness.links.insert(expired);
    let server = TestServer::new(harness.router()).unwrap();

    let response = server.get("/links/preview/gone").await;

    response.assert_status_ok();
    assert_eq!(response.json::<serde_json::Value>()["redirect_kind"], "temporary");
}

#[tokio::test]
async fn test_preview_not_found() {
    let harness = Harness::new();
    let server = TestServer::new(harness.router()).unwrap();

    server.get("/links/preview/unknown").await.assert_status_not_found();
}

#[tokio::test]
async fn test_redirect_stats_report() {
    let harness = Harness::new();
    harness.links.insert(link(5, "alpha", "https://example.com/a"));
    harness.links.insert(link(6, "beta", "https://example.com/b"));

    for slug in ["alpha", "alpha", "beta"] {
        harness
            .resolver
            .resolve(slug, None, browser("192.0.2.1"))
            .await
            .unwrap();
    }

    let server = TestServer::new(harness.router()).unwrap();
    let response = server.get("/redirect/stats?top=5").await;

    response.assert_status_ok();
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["cache"]["backend"], "memory");
    assert_eq!(json["cache"]["hits"], 1);
    assert_eq!(json["cache"]["misses"], 2);
    assert_eq!(json["hot_links"]["capacity"], 100);
    assert_eq!(json["hot_links"]["tracked"], 2);
    assert_eq!(json["hot_links"]["top"].as_array().unwrap().len(), 2);
    assert_eq!(json["click_queue"]["capacity"], 100);
    assert_eq!(json["click_queue"]["available"], 97);
}

#[tokio::test]
async fn test_redirect_stats_rejects_out_of_range_top() {
    let harness = Harness::new();
    let server = TestServer::new(harness.router()).unwrap();

    let response = server.get("/redirect/stats?top=0").await;

    response.assert_status_bad_request();
    assert_eq!(response.json::<serde_json::Value>()["code"], "BAD_REQUEST");
}
