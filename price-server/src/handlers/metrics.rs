//! Metrics handlers

use axum::{
    extract::{Query, State},
    Json,
};

use price_core::logic::metrics::{MetricsHistory, MetricsSnapshot};

use crate::models::HistoryParams;
use crate::AppState;

/// Longest history window served over HTTP
const MAX_HISTORY_HOURS: u32 = 24 * 7;

pub async fn snapshot(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

pub async fn history(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> Json<MetricsHistory> {
    let hours = params.hours.unwrap_or(24).min(MAX_HISTORY_HOURS);
    Json(state.metrics.history(hours))
}
