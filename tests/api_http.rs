// tests/api_http.rs
//
// HTTP-level tests for the read view without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::{FixedOffset, TimeZone};
use serde_json::Value as Json;
use tower::ServiceExt as _; // for `oneshot`

use share_watch::api::{self, ViewState};
use share_watch::{Item, SnapshotStore};

const BODY_LIMIT: usize = 1024 * 1024;

fn test_router(store: &SnapshotStore) -> Router {
    api::router(ViewState {
        store: store.clone(),
        verb: "RT".into(),
    })
}

async fn get(app: Router, uri: &str) -> (StatusCode, String) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build request");
    let resp = app.oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    (status, String::from_utf8(bytes.to_vec()).expect("utf8"))
}

async fn seeded_store(dir: &tempfile::TempDir) -> SnapshotStore {
    let store = SnapshotStore::new(dir.path().join("articles.csv"));
    let jst = FixedOffset::east_opt(9 * 3600).unwrap();
    store
        .save(&[
            Item::new(
                jst.with_ymd_and_hms(2025, 9, 5, 0, 0, 0).unwrap(),
                "https://x/hot",
                "Hot article",
                420,
            ),
            Item::new(
                jst.with_ymd_and_hms(2025, 9, 6, 0, 0, 0).unwrap(),
                "https://x/cold",
                "Cold article",
                3,
            ),
        ])
        .await
        .unwrap();
    store
}

#[tokio::test]
async fn health_returns_ok() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path().join("articles.csv"));
    let (status, body) = get(test_router(&store), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.trim(), "OK");
}

#[tokio::test]
async fn index_lists_stored_items() {
    let dir = tempfile::tempdir().unwrap();
    let store = seeded_store(&dir).await;

    let (status, html) = get(test_router(&store), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("2025-09-05: <a href=\"https://x/hot\""));
    assert!(html.contains("Cold article"));
    assert!(html.contains("background-color: #f55"));
}

#[tokio::test]
async fn items_endpoint_returns_json_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let store = seeded_store(&dir).await;

    let (status, body) = get(test_router(&store), "/items").await;
    assert_eq!(status, StatusCode::OK);
    let v: Json = serde_json::from_str(&body).expect("parse items json");
    let arr = v.as_array().expect("array");
    assert_eq!(arr.len(), 2);
    assert_eq!(arr[0]["url"], "https://x/hot");
    assert_eq!(arr[0]["metric"], 420);
}

#[tokio::test]
async fn missing_snapshot_renders_empty_list() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path().join("articles.csv"));

    let (status, body) = get(test_router(&store), "/items").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "[]");
}

#[tokio::test]
async fn corrupt_snapshot_is_503() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path().join("articles.csv"));
    tokio::fs::write(store.path(), "garbage\n").await.unwrap();

    let (status, _) = get(test_router(&store), "/").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
