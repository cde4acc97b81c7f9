//! Contact pipeline for the portfolio site: the form controller with its
//! validation and submission adapters, plus the relay service those
//! adapters can post to.

pub mod config;
pub mod controller;
pub mod error;
pub mod extractors;
pub mod form;
pub mod handlers;
pub mod mail;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod notify;
pub mod readiness;
pub mod services;
pub mod store;
pub mod submission;
pub mod validation;

pub use config::{AppConfig, ChannelKind, ContactConfig};
pub use controller::{ContactForm, FeedbackState, FormSnapshot, SubmitReport};
pub use error::{AppError, Result};
pub use form::{Draft, Field, FormState};
pub use handlers::routes::create_routes;
pub use mail::{connect_mailer, LogMailer, Mailer, MemoryMailer};
pub use metrics::MetricsCollector;
pub use middleware::rate_limit::RateLimiter;
pub use notify::{Notification, NotificationLog, Notifier, TracingNotifier, Variant};
pub use readiness::{acquire, RetryPolicy, Scoped};
pub use services::ContactService;
pub use store::{ContactSubmission, SubmissionStatus, SubmissionStore};
pub use submission::{
    build_adapter, BackendRelayAdapter, DirectChannelAdapter, SubmissionAdapter, SubmissionError,
    SubmissionOutcome,
};
pub use validation::{ValidationProfile, ValidationResult, Validator};

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::{self as axum_middleware, Next},
    response::Response,
    Router,
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::signal;
use tower_http::timeout::TimeoutLayer;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub app_name: String,
    pub version: String,
    pub contact_service: ContactService,
    pub metrics: MetricsCollector,
    pub rate_limiter: RateLimiter,
}

impl AppState {
    pub fn new(config: &AppConfig, mailer: Arc<dyn Mailer>) -> Self {
        let metrics = MetricsCollector::new();
        let contact_service = ContactService::new(
            SubmissionStore::new(config.server.max_stored_submissions),
            mailer,
            Validator::from_profile(config.server.validation),
            metrics.clone(),
            config.mail.recipient_email.clone(),
            config.mail.owner_name.clone(),
        );

        Self {
            app_name: "Portfolio Contact Relay".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            contact_service,
            metrics,
            rate_limiter: RateLimiter::new(&config.rate_limit),
        }
    }
}

pub fn create_app(state: AppState, config: &AppConfig) -> Router {
    let mut router = Router::new().merge(create_routes());

    router = router.layer(middleware::cors::cors_layer_from_config(&config.cors));

    if config.rate_limit.enable {
        router = router.layer(axum_middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            middleware::rate_limit::rate_limit_middleware,
        ));
    }

    router = router.layer(axum_middleware::from_fn_with_state(
        state.clone(),
        metrics_middleware,
    ));

    router = router.layer(TimeoutLayer::new(Duration::from_secs(
        config.server.request_timeout_seconds,
    )));

    if config.logging.trace_requests {
        router = router.layer(middleware::logging::logging_layer());
    }

    router.with_state(state)
}

async fn metrics_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> std::result::Result<Response, std::convert::Infallible> {
    let path = request.uri().path().to_string();
    let start = std::time::Instant::now();

    state.metrics.record_request(&path);

    let response = next.run(request).await;

    state
        .metrics
        .record_response(start.elapsed().as_millis(), response.status().as_u16());

    Ok(response)
}

pub async fn run_server(app: Router, addr: SocketAddr) -> Result<()> {
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let app = app.into_make_service_with_connect_info::<SocketAddr>();

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
