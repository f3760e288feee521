//! Floodcast Server
//!
//! Scores flood risk from weather and terrain readings.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         FLOODCAST                            │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐   ┌──────────────────────────────────────┐    │
//! │  │  API      │   │  FloodPredictor (Arc, read-only)     │    │
//! │  │  (Axum)   │──▶│  layout → scaler → model → bands     │    │
//! │  └───────────┘   └──────────────────┬───────────────────┘    │
//! │                                     │ loaded once            │
//! │                          ┌──────────▼──────────┐             │
//! │                          │ scaler / model /    │             │
//! │                          │ feature-name files  │             │
//! │                          └─────────────────────┘             │
//! └──────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod handlers;
mod inference;
mod models;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    extract::Request,
    routing::{get, post},
};
use tower_http::{
    cors::{AllowHeaders, AllowMethods, Any, CorsLayer},
    trace::TraceLayer,
    compression::CompressionLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use config::{Config, CorsPolicy, LogFormat};
use inference::{ArtifactBundle, FloodPredictor};

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env().context("Invalid configuration")?;

    // Initialize logging
    init_tracing(config.log_format);

    tracing::info!("Floodcast server starting...");

    // Load artifacts; any failure stops startup
    let bundle = ArtifactBundle::load(&config.artifacts).context("Failed to load model artifacts")?;
    let predictor = FloodPredictor::new(bundle, config.thresholds, config.missing_value);

    if config.is_production() && config.cors == CorsPolicy::Any {
        tracing::warn!("CORS accepts every origin; set CORS_ALLOWED_ORIGINS to restrict it");
    }

    // Build application state
    let state = AppState {
        predictor: Arc::new(predictor),
        config: config.clone(),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from((config.host, config.port));
    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let registry = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "floodcast=debug,tower_http=debug".into()));

    match format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<FloodPredictor>,
    pub config: Config,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors);

    Router::new()
        .route("/health", get(handlers::health::check))
        .route("/predict", post(handlers::predict::predict))
        .route("/predict/weather", post(handlers::predict::predict_weather))
        .route("/api/v1/model", get(handlers::model::info))
        .layer(CompressionLayer::new())
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                tracing::info_span!(
                    "request",
                    id = %Uuid::new_v4(),
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(cors)
        .with_state(state)
}

fn cors_layer(policy: &CorsPolicy) -> CorsLayer {
    match policy {
        CorsPolicy::Any => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
        // Credentials rule out wildcards, so methods and headers are mirrored
        CorsPolicy::AllowList(origins) => CorsLayer::new()
            .allow_origin(origins.clone())
            .allow_credentials(true)
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request()),
    }
}
