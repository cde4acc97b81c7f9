//! Liveness and health handlers

use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;
use tracing::warn;

use crate::AppState;

pub async fn handle_root() -> impl IntoResponse {
    Json(json!({ "message": "Hello World" }))
}

pub async fn handle_health(State(state): State<AppState>) -> impl IntoResponse {
    let stats = match state.contact_service.store().get_stats() {
        Ok(stats) => stats,
        Err(e) => {
            warn!("Submission store unavailable: {}", e);
            serde_json::Value::Null
        }
    };

    let status = if stats.is_null() { "degraded" } else { "healthy" };

    Json(json!({
        "status": status,
        "app": state.app_name,
        "version": state.version,
        "timestamp": chrono::Utc::now().timestamp(),
        "store_stats": stats,
        "mailer": state.contact_service.mailer_kind(),
    }))
}
