//! JSON extractor whose rejections use the relay's `{success, detail}` body

use axum::{
    async_trait,
    body::Body,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::json;

pub struct ContactJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ContactJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ContactJsonRejection;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ContactJson(value)),
            Err(JsonRejection::JsonDataError(e)) => Err(ContactJsonRejection::InvalidFields(e.body_text())),
            Err(JsonRejection::JsonSyntaxError(_)) => Err(ContactJsonRejection::Malformed),
            Err(JsonRejection::MissingJsonContentType(_)) => Err(ContactJsonRejection::NotJson),
            Err(other) => Err(ContactJsonRejection::Other(other.body_text())),
        }
    }
}

#[derive(Debug)]
pub enum ContactJsonRejection {
    InvalidFields(String),
    Malformed,
    NotJson,
    Other(String),
}

impl IntoResponse for ContactJsonRejection {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            ContactJsonRejection::InvalidFields(msg) => {
                tracing::debug!("Rejected contact body: {}", msg);
                let detail = if msg.contains("missing field") {
                    "Please fill in all required fields."
                } else {
                    "Invalid field value."
                };
                (StatusCode::UNPROCESSABLE_ENTITY, detail)
            }
            ContactJsonRejection::Malformed => (StatusCode::BAD_REQUEST, "Invalid JSON format"),
            ContactJsonRejection::NotJson => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "Expected request with `Content-Type: application/json`",
            ),
            ContactJsonRejection::Other(msg) => {
                tracing::debug!("JSON extraction failed: {}", msg);
                (StatusCode::BAD_REQUEST, "Failed to parse JSON request")
            }
        };

        let body = Json(json!({
            "success": false,
            "detail": detail,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

impl std::fmt::Display for ContactJsonRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContactJsonRejection::InvalidFields(msg) => write!(f, "Invalid fields: {}", msg),
            ContactJsonRejection::Malformed => write!(f, "Malformed JSON"),
            ContactJsonRejection::NotJson => write!(f, "Missing JSON content type"),
            ContactJsonRejection::Other(msg) => write!(f, "JSON error: {}", msg),
        }
    }
}

impl std::error::Error for ContactJsonRejection {}
