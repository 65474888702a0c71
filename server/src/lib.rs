pub mod config;
pub mod error;
pub mod metrics;
pub mod relay;
pub mod validation;

use std::sync::Arc;

use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use llm_core::CompletionService;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn, Instrument};
use tts_core::SynthesisService;

use crate::config::{ServerConfig, DEFAULT_CORS_ORIGINS};
use crate::metrics::{metrics_endpoint, RelayMetrics};
use crate::relay::generate_audio;

/// Everything a request needs, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub llm: Arc<dyn CompletionService>,
    pub tts: Arc<dyn SynthesisService>,
    pub metrics: Arc<RelayMetrics>,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(
        llm: Arc<dyn CompletionService>,
        tts: Arc<dyn SynthesisService>,
        config: ServerConfig,
    ) -> Self {
        Self {
            llm,
            tts,
            metrics: Arc::new(RelayMetrics::new()),
            config,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_allowed_origins);

    let middleware_stack = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .into_inner();

    Router::new()
        .route("/health", get(health_check))
        .route("/healthz", get(health_check))
        .route("/metrics", get(metrics_endpoint))
        .route("/generate-audio", post(generate_audio))
        .layer(axum::middleware::from_fn(add_request_id))
        .layer(middleware_stack)
        .with_state(state)
}

pub async fn health_check() -> &'static str {
    "ok"
}

/// Credentialed CORS for an explicit origin list. Methods and headers are
/// mirrored from the preflight, since wildcards are not allowed together
/// with credentials.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let mut origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect();

    if origins.is_empty() {
        warn!("No usable CORS origins configured, falling back to local dev origins");
        origins = DEFAULT_CORS_ORIGINS
            .iter()
            .map(|origin| HeaderValue::from_static(*origin))
            .collect();
    }
    info!("CORS configured for {} origin(s)", origins.len());

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

// Request ID middleware for tracing
async fn add_request_id(mut request: Request, next: Next) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();
    let header_value = HeaderValue::from_str(&request_id).ok();
    if let Some(value) = header_value.clone() {
        request.headers_mut().insert("x-request-id", value);
    }
    let span = tracing::info_span!("request", id = %request_id);

    let mut response = next.run(request).instrument(span).await;
    if let Some(value) = header_value {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}
