use axum::response::Json;
use serde_json::{Value, json};

/// Handler for GET / - liveness check
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "OK",
        "service": "voicedesk",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
