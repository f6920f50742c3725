//! Health check handler

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    timestamp: i64,
    metrics_running: bool,
    cache_enabled: bool,
    cache_available: bool,
    model_endpoint: String,
}

/// Healthy when the cache database answers; degraded otherwise.
pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    let cache_available = state
        .with_cache(|cache| cache.is_available())
        .await
        .unwrap_or(false);

    Json(HealthResponse {
        status: if cache_available { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().timestamp(),
        metrics_running: state.metrics.is_running(),
        cache_enabled: state.config.cache_enabled,
        cache_available,
        model_endpoint: state.model.endpoint_url().to_string(),
    })
}
