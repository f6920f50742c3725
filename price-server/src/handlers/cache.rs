//! Cache statistics handler

use axum::{extract::State, Json};
use serde::Serialize;

use price_core::CacheStats;

use crate::{AppResult, AppState};

#[derive(Serialize)]
pub struct CacheStatsResponse {
    enabled: bool,
    #[serde(flatten)]
    stats: CacheStats,
    hit_rate: f64,
}

pub async fn stats(State(state): State<AppState>) -> AppResult<Json<CacheStatsResponse>> {
    let stats = state.with_cache(|cache| cache.stats()).await?;

    Ok(Json(CacheStatsResponse {
        enabled: state.config.cache_enabled,
        hit_rate: stats.hit_rate(),
        stats,
    }))
}
