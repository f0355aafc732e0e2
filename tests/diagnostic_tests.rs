use axum::http::StatusCode;
use std::sync::Arc;

mod common;
use common::*;

use trenchsight_backend::{repositories::InMemoryDocumentStore, services::NoopMirror};

#[tokio::test]
async fn test_root_message() {
    let app = create_test_app();

    let response = app.send(get_request("/")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        serde_json::json!({ "message": "TrenchSight Backend Running" })
    );
}

#[tokio::test]
async fn test_diagnostic_reports_connected_store() {
    let app = create_test_app();
    create_session(&app).await;

    let response = app.send(get_request("/test")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let report = json_body(response).await;
    assert_eq!(report["backend"], "✅ Running");
    assert_eq!(report["database"], "✅ Connected & Working");
    assert_eq!(report["database_url"], "✅ Set");
    assert_eq!(report["database_name"], "✅ Set");
    assert_eq!(report["connection_status"], "Connected");
    assert_eq!(report["collections"], serde_json::json!(["photosession"]));
}

#[tokio::test]
async fn test_diagnostic_with_unavailable_store() {
    let app = create_test_app_with(InMemoryDocumentStore::unavailable(), Arc::new(NoopMirror));

    let response = app.send(get_request("/test")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let report = json_body(response).await;
    assert_eq!(report["backend"], "✅ Running");
    assert_eq!(report["database"], "⚠️ Not initialized");
    assert_eq!(report["connection_status"], "Not Connected");
    assert!(report["database_url"].is_null());
    assert_eq!(report["collections"], serde_json::json!([]));
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = create_test_app();

    let request = axum::http::Request::builder()
        .uri("/")
        .header("x-request-id", "field-tablet-42")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "field-tablet-42"
    );

    let response = app.send(get_request("/")).await;
    assert!(response.headers().contains_key("x-request-id"));
}
