//! Route table for the relay service

use axum::{
    routing::{get, post},
    Router,
};

use crate::{submission::relay::CONTACT_PATH, AppState};

use super::{
    contact::handle_contact,
    health::{handle_health, handle_root},
    metrics::handle_metrics,
};

pub fn create_routes() -> Router<AppState> {
    Router::new()
        .route("/api/", get(handle_root))
        .route("/health", get(handle_health))
        .route("/api/metrics", get(handle_metrics))
        .route(CONTACT_PATH, post(handle_contact))
}
