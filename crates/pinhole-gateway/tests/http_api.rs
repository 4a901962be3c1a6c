use axum::http::StatusCode;
use axum_test::TestServer;
use pinhole_gateway::{App, AppState};
use pinhole_generator::RandomGenerator;
use pinhole_shortener::ShortenerService;
use pinhole_storage::MemoryStore;
use serde_json::json;
use std::sync::Arc;

const BASE_URL: &str = "https://pin.hole";

fn test_server() -> (TestServer, Arc<ShortenerService<RandomGenerator>>) {
    let service = Arc::new(ShortenerService::new(
        Arc::new(MemoryStore::new()),
        RandomGenerator::new(),
        BASE_URL,
    ));
    let router = App::router(AppState::new(Arc::clone(&service)));
    (TestServer::new(router).unwrap(), service)
}

#[tokio::test]
async fn shorten_creates_mapping() {
    let (server, _service) = test_server();

    let response = server
        .post("/api/shorten")
        .add_header("x-user-id", "user-1")
        .json(&json!({ "url": "https://example.com" }))
        .await;

    response.assert_status(StatusCode::CREATED);

    let body = response.json::<serde_json::Value>();
    let short_id = body["short_id"].as_str().unwrap();
    assert_eq!(short_id.len(), 8);
    assert_eq!(body["short_url"], format!("{BASE_URL}/{short_id}"));
}

#[tokio::test]
async fn shorten_answers_conflict_for_known_url() {
    let (server, _service) = test_server();

    let first = server
        .post("/api/shorten")
        .add_header("x-user-id", "user-1")
        .json(&json!({ "url": "https://example.com" }))
        .await;
    first.assert_status(StatusCode::CREATED);

    let second = server
        .post("/api/shorten")
        .add_header("x-user-id", "user-2")
        .json(&json!({ "url": "https://example.com" }))
        .await;
    second.assert_status(StatusCode::CONFLICT);

    // The conflict body carries the earlier mapping.
    assert_eq!(
        second.json::<serde_json::Value>()["short_id"],
        first.json::<serde_json::Value>()["short_id"]
    );
}

#[tokio::test]
async fn shorten_requires_user_id() {
    let (server, _service) = test_server();

    let response = server
        .post("/api/shorten")
        .json(&json!({ "url": "https://example.com" }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn shorten_rejects_invalid_urls() {
    let (server, _service) = test_server();

    let response = server
        .post("/api/shorten")
        .add_header("x-user-id", "user-1")
        .json(&json!({ "url": "not-a-url" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.json::<serde_json::Value>()["error"].is_string());
}

#[tokio::test]
async fn batch_shorten_creates_correlated_mappings() {
    let (server, _service) = test_server();

    let response = server
        .post("/api/shorten/batch")
        .add_header("x-user-id", "user-1")
        .json(&json!([
            { "correlation_id": "a", "original_url": "https://example.com/1" },
            { "correlation_id": "bad", "original_url": "not-a-url" },
            { "correlation_id": "b", "original_url": "https://example.com/2" },
        ]))
        .await;

    response.assert_status(StatusCode::CREATED);

    // The invalid item is skipped; the rest come back in request order.
    let results = response.json::<serde_json::Value>();
    let results = results.as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["correlation_id"], "a");
    assert_eq!(results[1]["correlation_id"], "b");
    assert!(results[0]["short_url"]
        .as_str()
        .unwrap()
        .starts_with(BASE_URL));
}

#[tokio::test]
async fn batch_shorten_reuses_existing_mapping() {
    let (server, _service) = test_server();

    let created = server
        .post("/api/shorten")
        .add_header("x-user-id", "user-1")
        .json(&json!({ "url": "https://example.com" }))
        .await;
    let short_url = created.json::<serde_json::Value>()["short_url"]
        .as_str()
        .unwrap()
        .to_owned();

    let response = server
        .post("/api/shorten/batch")
        .add_header("x-user-id", "user-2")
        .json(&json!([
            { "correlation_id": "dup", "original_url": "https://example.com" },
        ]))
        .await;

    response.assert_status(StatusCode::CREATED);
    let results = response.json::<serde_json::Value>();
    assert_eq!(results[0]["short_url"], short_url);
}

#[tokio::test]
async fn batch_shorten_rejects_empty_batch() {
    let (server, _service) = test_server();

    let response = server
        .post("/api/shorten/batch")
        .add_header("x-user-id", "user-1")
        .json(&json!([]))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn redirect_follows_mapping() {
    let (server, _service) = test_server();

    let created = server
        .post("/api/shorten")
        .add_header("x-user-id", "user-1")
        .json(&json!({ "url": "https://example.com" }))
        .await;
    let short_id = created.json::<serde_json::Value>()["short_id"]
        .as_str()
        .unwrap()
        .to_owned();

    let response = server.get(&format!("/{short_id}")).await;

    response.assert_status(StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.header("location"), "https://example.com");
}

#[tokio::test]
async fn redirect_answers_not_found_for_unknown_id() {
    let (server, _service) = test_server();

    let response = server.get("/missing01").await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn user_urls_listing() {
    let (server, _service) = test_server();

    let empty = server
        .get("/api/user/urls")
        .add_header("x-user-id", "user-1")
        .await;
    empty.assert_status(StatusCode::NO_CONTENT);

    for url in ["https://example.com/1", "https://example.com/2"] {
        server
            .post("/api/shorten")
            .add_header("x-user-id", "user-1")
            .json(&json!({ "url": url }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    let response = server
        .get("/api/user/urls")
        .add_header("x-user-id", "user-1")
        .await;
    response.assert_status_ok();

    let urls = response.json::<serde_json::Value>();
    let urls = urls.as_array().unwrap();
    assert_eq!(urls.len(), 2);
    // Oldest first.
    assert_eq!(urls[0]["original_url"], "https://example.com/1");
    assert_eq!(urls[1]["original_url"], "https://example.com/2");
}

#[tokio::test]
async fn delete_batch_is_accepted_and_applied() {
    let (server, service) = test_server();

    let created = server
        .post("/api/shorten")
        .add_header("x-user-id", "user-1")
        .json(&json!({ "url": "https://example.com" }))
        .await;
    let short_id = created.json::<serde_json::Value>()["short_id"]
        .as_str()
        .unwrap()
        .to_owned();

    let response = server
        .delete("/api/user/urls")
        .add_header("x-user-id", "user-1")
        .json(&json!({ "short_ids": [short_id] }))
        .await;
    response.assert_status(StatusCode::ACCEPTED);

    // Deletion is asynchronous; drain the queue before observing.
    service.shutdown().await.unwrap();

    let listing = server
        .get("/api/user/urls")
        .add_header("x-user-id", "user-1")
        .await;
    listing.assert_status(StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn delete_rejects_empty_batch() {
    let (server, _service) = test_server();

    let response = server
        .delete("/api/user/urls")
        .add_header("x-user-id", "user-1")
        .json(&json!({ "short_ids": [] }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn stats_reports_counts() {
    let (server, _service) = test_server();

    for (url, user) in [
        ("https://example.com/1", "user-1"),
        ("https://example.com/2", "user-1"),
        ("https://example.com/3", "user-2"),
    ] {
        server
            .post("/api/shorten")
            .add_header("x-user-id", user)
            .json(&json!({ "url": url }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    let response = server.get("/api/internal/stats").await;
    response.assert_status_ok();

    let stats = response.json::<serde_json::Value>();
    assert_eq!(stats["urls"], 3);
    assert_eq!(stats["users"], 2);
}

#[tokio::test]
async fn health_answers_ok() {
    let (server, _service) = test_server();

    let response = server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.json::<serde_json::Value>()["status"], "ok");
}
