//! `POST /api/contact`

use axum::{extract::State, response::IntoResponse, Json};
use tracing::info;

use crate::{
    error::Result,
    extractors::ContactJson,
    models::ContactRequest,
    AppState,
};

pub async fn handle_contact(
    State(state): State<AppState>,
    ContactJson(request): ContactJson<ContactRequest>,
) -> Result<impl IntoResponse> {
    info!(
        name_len = request.name.len(),
        has_subject = request.subject.is_some(),
        "POST /api/contact"
    );

    let response = state.contact_service.submit(request).await?;

    Ok(Json(response))
}
