//! Cache result types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Internal storage failure. Never crosses the public cache API.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Snapshot of a cache hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedPrediction {
    pub fingerprint: String,
    pub prediction: i64,
    pub prediction_text: String,
    pub confidence: Option<f64>,
    pub cached_at: DateTime<Utc>,
    /// Counter after this hit was counted
    pub access_count: u64,
}

/// Aggregate cache statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub total_predictions: u64,
    pub total_accesses: u64,
    pub recent_predictions_24h: u64,
    /// Mean over entries that carry a confidence
    pub average_confidence: Option<f64>,
    pub cache_size_bytes: u64,
    pub cache_size_mb: f64,
}

impl CacheStats {
    /// Share of accesses served by an already existing entry (percent)
    pub fn hit_rate(&self) -> f64 {
        if self.total_accesses == 0 {
            return 0.0;
        }
        let repeats = self.total_accesses.saturating_sub(self.total_predictions);
        repeats as f64 / self.total_accesses as f64 * 100.0
    }
}

/// One row of the prediction audit trail
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionLog {
    pub session_id: Option<String>,
    pub fingerprint: Option<String>,
    pub predicted_class: Option<i64>,
    pub latency_ms: f64,
    pub success: bool,
    pub error_message: Option<String>,
}

/// A failed request read back from the audit trail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedPrediction {
    pub session_id: Option<String>,
    pub latency_ms: f64,
    pub error_message: Option<String>,
    pub logged_at: DateTime<Utc>,
}
