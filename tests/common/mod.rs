#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::Value;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use trenchsight_backend::{
    config::Settings,
    create_router,
    repositories::InMemoryDocumentStore,
    services::{CloudMirror, MirrorOutcome, NoopMirror},
    AppState,
};

pub const BOUNDARY: &str = "trenchsight-test-boundary";

/// Router plus handles on the collaborators behind it
pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryDocumentStore>,
    pub uploads: TempDir,
}

impl TestApp {
    pub fn uploads_root(&self) -> std::path::PathBuf {
        self.uploads.path().join("uploads")
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }
}

pub fn test_settings(root: &Path) -> Settings {
    Settings {
        database_url: Some("mongodb://localhost:27017".to_string()),
        database_name: Some("trenchsight_test".to_string()),
        google_service_account_json: None,
        google_drive_folder_id: None,
        uploads_dir: root.join("uploads").to_string_lossy().into_owned(),
        max_upload_bytes: 10 * 1024 * 1024,
        host: "127.0.0.1".to_string(),
        port: 8000,
        cors_allow_origins: vec!["*".to_string()],
        log_level: "error".to_string(),
        log_format: "plain".to_string(),
    }
}

/// Test application backed by the in-memory store with mirroring disabled
pub fn create_test_app() -> TestApp {
    create_test_app_with(InMemoryDocumentStore::new(), Arc::new(NoopMirror))
}

pub fn create_test_app_with(store: InMemoryDocumentStore, mirror: Arc<dyn CloudMirror>) -> TestApp {
    let uploads = tempfile::tempdir().expect("Failed to create temp dir");
    let store = Arc::new(store);
    let app_state = AppState::with_components(test_settings(uploads.path()), store.clone(), mirror);

    TestApp {
        router: create_router(app_state),
        store,
        uploads,
    }
}

/// Mirror that answers with a fixed outcome and counts calls
pub struct StubMirror {
    pub outcome: MirrorOutcome,
    pub calls: AtomicUsize,
}

impl StubMirror {
    pub fn new(outcome: MirrorOutcome) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CloudMirror for StubMirror {
    async fn upload_file(&self, _display_name: &str, local_path: &Path) -> MirrorOutcome {
        assert!(local_path.exists(), "mirror called before the file was stored");
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}

/// Helper to extract response body as bytes
pub async fn extract_body(response: Response) -> Vec<u8> {
    let body = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    body.to_vec()
}

pub async fn json_body(response: Response) -> Value {
    serde_json::from_slice(&extract_body(response).await).expect("response is not JSON")
}

pub fn json_request(method: Method, uri: &str, payload: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// Encode a multipart/form-data body with text fields and an optional file part
pub fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    if let Some((filename, content)) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: image/jpeg\r\n\r\n",
                BOUNDARY, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn photo_request(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/photos")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(fields, file)))
        .unwrap()
}

/// Create a session through the API and return its id
pub async fn create_session(app: &TestApp) -> String {
    let payload = serde_json::json!({
        "site_name": "Trench A",
        "date": "2024-05-01",
        "start_lat": 10.0,
        "start_lng": 20.0,
    });
    let response = app
        .send(json_request(Method::POST, "/api/sessions", &payload))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    json_body(response).await["session_id"]
        .as_str()
        .unwrap()
        .to_string()
}

pub fn is_object_id(id: &str) -> bool {
    id.len() == 24 && id.chars().all(|c| c.is_ascii_hexdigit())
}
