use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde_json::Value;

use mailcraft_core::health::readiness;

use crate::state::AppState;

/// `GET /readyz`: ready once the database answers.
pub async fn readyz(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.db.ping().await {
        Ok(()) => readiness(true, state.sessions.backend()),
        Err(e) => {
            tracing::warn!(error = %e, "database ping failed");
            readiness(false, "database unreachable")
        }
    }
}
