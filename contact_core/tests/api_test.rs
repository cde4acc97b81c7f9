use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use contact_core::{create_app, AppConfig, AppState, MemoryMailer, SubmissionStatus};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.logging.trace_requests = false;
    config.mail.recipient_email = "owner@example.com".to_string();
    config
}

fn setup(config: &AppConfig) -> (Router, AppState, MemoryMailer) {
    let mailer = MemoryMailer::new();
    let state = AppState::new(config, Arc::new(mailer.clone()));
    let app = create_app(state.clone(), config);
    (app, state, mailer)
}

fn post_contact(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/contact")
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn valid_body() -> Value {
    json!({
        "name": "Ada Lovelace",
        "email": "ada@example.com",
        "subject": "Collaboration",
        "message": "I would like to talk about a project."
    })
}

#[tokio::test]
async fn test_root_says_hello() {
    let (app, _, _) = setup(&test_config());

    let response = app
        .oneshot(Request::builder().uri("/api/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await, json!({ "message": "Hello World" }));
}

#[tokio::test]
async fn test_valid_submission_is_stored_and_mailed() {
    let (app, state, mailer) = setup(&test_config());

    let response = app.oneshot(post_contact(valid_body().to_string())).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        read_json(response).await,
        json!({ "success": true, "message": "Thanks — I'll respond within 48 hours." })
    );

    let sent = mailer.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].to, "owner@example.com");
    assert_eq!(sent[0].subject, "New Portfolio Contact: Collaboration");
    assert_eq!(sent[0].reply_to.as_deref(), Some("ada@example.com"));
    assert_eq!(sent[1].subject, "Thank you for contacting me!");

    let stored = state.contact_service.store().list(None, None).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].status, SubmissionStatus::Sent);
}

#[tokio::test]
async fn test_short_message_rejected_with_field_errors() {
    let (app, state, mailer) = setup(&test_config());
    let body = json!({
        "name": "Ada",
        "email": "ada@example.com",
        "message": "Too short"
    });

    let response = app.oneshot(post_contact(body.to_string())).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["detail"], "Message must be at least 10 characters.");
    assert_eq!(body["errors"]["message"], "Message must be at least 10 characters.");

    assert!(state.contact_service.store().is_empty());
    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn test_invalid_email_rejected() {
    let (app, _, _) = setup(&test_config());
    let mut body = valid_body();
    body["email"] = json!("not-an-email");

    let response = app.oneshot(post_contact(body.to_string())).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json(response).await;
    assert_eq!(body["errors"]["email"], "Please enter a valid email address.");
}

#[tokio::test]
async fn test_oversized_name_rejected() {
    let (app, _, _) = setup(&test_config());
    let mut body = valid_body();
    body["name"] = json!("x".repeat(101));

    let response = app.oneshot(post_contact(body.to_string())).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json(response).await;
    assert_eq!(body["errors"]["name"], "Name must not exceed 100 characters.");
}

#[tokio::test]
async fn test_missing_field_rejected() {
    let (app, _, _) = setup(&test_config());
    let body = json!({ "name": "Ada", "email": "ada@example.com" });

    let response = app.oneshot(post_contact(body.to_string())).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["detail"], "Please fill in all required fields.");
}

#[tokio::test]
async fn test_malformed_json_rejected() {
    let (app, _, _) = setup(&test_config());

    let response = app.oneshot(post_contact("{ not json")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(response).await["success"], false);
}

#[tokio::test]
async fn test_missing_content_type_rejected() {
    let (app, _, _) = setup(&test_config());
    let request = Request::builder()
        .method("POST")
        .uri("/api/contact")
        .body(Body::from(valid_body().to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn test_rate_limit_applies_to_posts() {
    let mut config = test_config();
    config.rate_limit.max_requests = 2;
    let (app, _, _) = setup(&config);

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(post_contact(valid_body().to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(post_contact(valid_body().to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key("retry-after"));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_health_and_metrics_report_activity() {
    let (app, _, _) = setup(&test_config());

    app.clone()
        .oneshot(post_contact(valid_body().to_string()))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let health = read_json(response).await;
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["mailer"], "memory");
    assert_eq!(health["store_stats"]["total_submissions"], 1);
    assert_eq!(health["store_stats"]["sent"], 1);

    let response = app
        .oneshot(Request::builder().uri("/api/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let metrics = read_json(response).await;
    assert_eq!(metrics["submissions_accepted"], 1);
    assert_eq!(metrics["requests_by_endpoint"]["/api/contact"], 1);
}
