use axum::{Json, http::StatusCode};
use serde_json::{Value, json};

/// `GET /healthz`: liveness only.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Render a readiness probe result. Services call this from their own
/// `GET /readyz` after checking their dependencies.
pub fn readiness(ready: bool, detail: &str) -> (StatusCode, Json<Value>) {
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(json!({ "ready": ready, "detail": detail })))
}
