use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use crate::AppState;

/// Longest store error text echoed by the diagnostic report
const MAX_ERROR_CHARS: usize = 80;

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "TrenchSight Backend Running" }))
}

/// Diagnostic report. Always 200; store problems only change the status text.
pub async fn diagnostic(State(app_state): State<AppState>) -> Json<Value> {
    let mut response = json!({
        "backend": "✅ Running",
        "database": "❌ Not Available",
        "database_url": null,
        "database_name": null,
        "connection_status": "Not Connected",
        "collections": [],
    });

    if !app_state.store.is_connected() {
        response["database"] = json!("⚠️ Not initialized");
        return Json(response);
    }

    response["database"] = json!("✅ Available");
    response["database_url"] = json!(set_marker(app_state.config.database_url.is_some()));
    response["database_name"] = json!(set_marker(app_state.config.database_name.is_some()));

    match app_state.store.list_collection_names().await {
        Ok(collections) => {
            response["collections"] = json!(collections);
            response["connection_status"] = json!("Connected");
            response["database"] = json!("✅ Connected & Working");
        }
        Err(e) => {
            tracing::warn!(error = %e, "diagnostic store probe failed");
            let detail: String = e.to_string().chars().take(MAX_ERROR_CHARS).collect();
            response["database"] = json!(format!("❌ Error: {}", detail));
        }
    }

    Json(response)
}

fn set_marker(present: bool) -> &'static str {
    if present {
        "✅ Set"
    } else {
        "❌ Not Set"
    }
}
