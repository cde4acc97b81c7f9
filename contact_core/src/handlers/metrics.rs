//! Metrics handler

use axum::{extract::State, response::IntoResponse, Json};
use tracing::debug;

use crate::AppState;

pub async fn handle_metrics(State(state): State<AppState>) -> impl IntoResponse {
    debug!("GET /api/metrics");
    Json(state.metrics.get_snapshot())
}
