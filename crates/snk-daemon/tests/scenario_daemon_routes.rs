//! In-process scenario tests for snk-daemon HTTP endpoints.
//!
//! These tests spin up the Axum router **without** binding a TCP socket.
//! Each test calls `routes::build_router` over an in-memory store and drives
//! it via `tower::ServiceExt::oneshot`; no network I/O required.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use snk_daemon::{routes, state};
use snk_db::MemStore;
use tower::ServiceExt; // oneshot

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Fresh router backed by a clean in-memory store.
fn make_router() -> axum::Router {
    let store = Arc::new(MemStore::new());
    let st = Arc::new(state::AppState::new(store, Duration::from_secs(5)));
    routes::build_router(st)
}

/// Drive the router with a single request and return (status, body_bytes).
async fn call(router: &axum::Router, req: Request<axum::body::Body>) -> (StatusCode, bytes::Bytes) {
    let resp = router.clone().oneshot(req).await.expect("oneshot failed");
    let status = resp.status();
    let body = resp
        .into_body()
        .collect()
        .await
        .expect("body collect failed")
        .to_bytes();
    (status, body)
}

async fn get(router: &axum::Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let (status, body) = call(router, req).await;
    (status, parse_json(body))
}

async fn post(router: &axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(axum::body::Body::from(body.to_string()))
        .unwrap();
    let (status, body) = call(router, req).await;
    (status, parse_json(body))
}

/// Parse body bytes as a `serde_json::Value`.
fn parse_json(b: bytes::Bytes) -> Value {
    serde_json::from_slice(&b).expect("body is not valid JSON")
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_reports_service_and_storage() {
    let router = make_router();
    let (status, json) = get(&router, "/v1/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], true);
    assert_eq!(json["service"], "snk-daemon");
    assert_eq!(json["storage"], "memory");
}

// ---------------------------------------------------------------------------
// Snack registry
// ---------------------------------------------------------------------------

#[tokio::test]
async fn snack_crud_round_trip() {
    let router = make_router();

    let (status, _) = post(
        &router,
        "/v1/snacks/create",
        json!({ "snack": { "barcode": "1337", "name": "cola", "brand": "fizz" } }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = post(
        &router,
        "/v1/snacks/create",
        json!({ "snack": { "barcode": "1337" } }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "ALREADY_EXISTS");

    let (status, _) = post(
        &router,
        "/v1/snacks/update",
        json!({ "snack": { "barcode": "1337", "name": "diet cola", "brand": "fizz" } }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = get(&router, "/v1/snacks/list").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["snacks"].as_array().unwrap().len(), 1);
    assert_eq!(json["snacks"][0]["name"], "diet cola");

    let (status, _) = post(&router, "/v1/snacks/delete", json!({ "barcode": "1337" })).await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = post(&router, "/v1/snacks/delete", json!({ "barcode": "1337" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
}

#[tokio::test]
async fn update_of_unknown_snack_is_not_found() {
    let router = make_router();
    let (status, json) = post(
        &router,
        "/v1/snacks/update",
        json!({ "snack": { "barcode": "404" } }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
}

#[tokio::test]
async fn empty_keys_are_invalid_arguments() {
    let router = make_router();

    let (status, json) = post(
        &router,
        "/v1/snacks/create",
        json!({ "snack": { "barcode": "" } }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "INVALID_ARGUMENT");

    let (status, json) = post(
        &router,
        "/v1/locations/create",
        json!({ "location": { "name": "  " } }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "INVALID_ARGUMENT");

    let (status, _) = post(
        &router,
        "/v1/locations/update",
        json!({ "name": "shelf", "new_name": "" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Location registry
// ---------------------------------------------------------------------------

#[tokio::test]
async fn location_rename_carries_contents() {
    let router = make_router();

    let (status, _) = post(
        &router,
        "/v1/contents/add",
        json!({ "snack_barcode": "1", "location_name": "shelf" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = post(
        &router,
        "/v1/locations/update",
        json!({ "name": "shelf", "new_name": "pantry" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, json) = get(&router, "/v1/locations/list").await;
    assert_eq!(json["locations"], json!([{ "name": "pantry" }]));

    let (_, json) = post(&router, "/v1/contents/list", json!({ "location_name": "pantry" })).await;
    assert_eq!(json["contents"][0]["snack"]["barcode"], "1");
    assert_eq!(json["contents"][0]["count"], 1);
}

#[tokio::test]
async fn deleting_location_cascades_to_contents() {
    let router = make_router();
    post(
        &router,
        "/v1/contents/add",
        json!({ "snack_barcode": "1", "location_name": "shelf" }),
    )
    .await;

    let (status, _) = post(&router, "/v1/locations/delete", json!({ "name": "shelf" })).await;
    assert_eq!(status, StatusCode::OK);

    let (_, json) = post(&router, "/v1/contents/list", json!({})).await;
    assert_eq!(json["contents"], json!([]));
    // The snack itself stays registered.
    let (_, json) = get(&router, "/v1/snacks/list").await;
    assert_eq!(json["snacks"][0]["barcode"], "1");
}

// ---------------------------------------------------------------------------
// POST /v1/contents/add
// ---------------------------------------------------------------------------

#[tokio::test]
async fn add_snack_cold_start_then_increment() {
    let router = make_router();
    let body = json!({ "snack_barcode": "1337", "location_name": "cupboard" });

    let (status, json) = post(&router, "/v1/contents/add", body.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["snack_created"], true);
    assert_eq!(json["location_created"], true);
    assert!(json.get("error").is_none());

    let (status, json) = post(&router, "/v1/contents/add", body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["snack_created"], false);
    assert_eq!(json["location_created"], false);

    let (_, json) = post(
        &router,
        "/v1/contents/list",
        json!({ "location_name": "cupboard" }),
    )
    .await;
    let contents = json["contents"].as_array().unwrap();
    assert_eq!(contents.len(), 1);
    assert_eq!(contents[0]["count"], 2);
    assert_eq!(contents[0]["snack"]["name"], "");
}

#[tokio::test]
async fn add_snack_with_empty_barcode_is_rejected_with_flags() {
    let router = make_router();
    let (status, json) = post(
        &router,
        "/v1/contents/add",
        json!({ "snack_barcode": "", "location_name": "cupboard" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["snack_created"], false);
    assert_eq!(json["location_created"], false);
    assert_eq!(json["error"]["code"], "INVALID_ARGUMENT");

    let (_, json) = get(&router, "/v1/locations/list").await;
    assert_eq!(json["locations"], json!([]));
}

#[tokio::test]
async fn list_contents_filters_by_location() {
    let router = make_router();
    for (bc, loc) in [("1", "shelf"), ("2", "shelf"), ("1", "fridge")] {
        post(
            &router,
            "/v1/contents/add",
            json!({ "snack_barcode": bc, "location_name": loc }),
        )
        .await;
    }

    let (_, all) = post(&router, "/v1/contents/list", json!({})).await;
    assert_eq!(all["contents"].as_array().unwrap().len(), 3);

    let (_, shelf) = post(&router, "/v1/contents/list", json!({ "location_name": "shelf" })).await;
    let shelf = shelf["contents"].as_array().unwrap();
    assert_eq!(shelf.len(), 2);
    assert!(shelf.iter().all(|e| e["location_name"] == "shelf"));

    // An empty filter means "every location".
    let (_, empty) = post(&router, "/v1/contents/list", json!({ "location_name": "" })).await;
    assert_eq!(empty["contents"].as_array().unwrap().len(), 3);
}
