//! Mobile Price Predictor - Web front-end and prediction service
//!
//! Collects phone specifications from an HTML form or a JSON body, asks the
//! remote classifier for a price tier and answers with the result.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   PRICE SERVER (Axum)                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  form / JSON ──► validate ──► cache? ──► remote model       │
//! │                                 │             │             │
//! │                                 ▼             ▼             │
//! │                         ┌────────────┐  ┌───────────────┐   │
//! │                         │  SQLite    │  │ Metrics       │   │
//! │                         │  cache     │  │ collector     │   │
//! │                         └────────────┘  └───────────────┘   │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod client;
mod config;
mod error;
mod handlers;
mod models;


use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use price_core::{MetricsCollector, PredictionCache};

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    // Initialize logging (JSON lines in production)
    let json_layer = config
        .is_production()
        .then(|| tracing_subscriber::fmt::layer().json());
    let text_layer = (!config.is_production()).then(tracing_subscriber::fmt::layer);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "price_server=debug,price_core=info,tower_http=debug".into()),
        )
        .with(json_layer)
        .with(text_layer)
        .init();

    tracing::info!("Mobile Price Predictor starting ({})...", config.environment);
    tracing::info!("Model endpoint: {}", config.model_endpoint_url);

    // Open the prediction cache
    let cache = PredictionCache::open(&config.database_path)
        .with_context(|| format!("failed to open cache {}", config.database_path))?;

    // Start host sampling
    let metrics = Arc::new(MetricsCollector::new(config.metrics.clone()));
    metrics.start();

    let model = client::ModelClient::new(config.model_endpoint_url.clone(), config.model_timeout())
        .context("failed to build model client")?;

    // Build application state
    let state = AppState {
        config: config.clone(),
        cache,
        metrics: Arc::clone(&metrics),
        model,
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    metrics.stop();
    tracing::info!("Server stopped");
    Ok(())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: config::Config,
    pub cache: PredictionCache,
    pub metrics: Arc<MetricsCollector>,
    pub model: client::ModelClient,
}

impl AppState {
    /// Run a cache operation on the blocking pool
    pub async fn with_cache<F, R>(&self, op: F) -> AppResult<R>
    where
        F: FnOnce(&PredictionCache) -> R + Send + 'static,
        R: Send + 'static,
    {
        let cache = self.cache.clone();
        Ok(tokio::task::spawn_blocking(move || op(&cache)).await?)
    }
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    let static_dir = ServeDir::new(&state.config.static_dir);

    Router::new()
        // HTML form
        .route("/", get(handlers::page::index).post(handlers::page::submit))
        .route("/health", get(handlers::health::check))

        // JSON API
        .route("/api/v1/predict", post(handlers::predict::predict))
        .route("/api/v1/metrics", get(handlers::metrics::snapshot))
        .route("/api/v1/metrics/history", get(handlers::metrics::history))
        .route("/api/v1/cache/stats", get(handlers::cache::stats))

        .nest_service("/static", static_dir)
        .fallback(handlers::not_found)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
