//! Metrics data types
//!
//! Samples are immutable once captured; everything here is plain data and
//! serializes into the export file unchanged.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants;

// ============================================================================
// CONFIG
// ============================================================================

/// Collector settings
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Capacity of every rolling window
    pub capacity: usize,
    /// Pause between two system samples
    pub sample_interval: Duration,
    /// Pause used once sampling keeps failing
    pub backoff_interval: Duration,
    /// Consecutive failures before switching to `backoff_interval`
    pub failures_before_backoff: u32,
    /// Lookback used for trend classification
    pub trend_window: chrono::Duration,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            capacity: constants::DEFAULT_METRICS_CAPACITY,
            sample_interval: Duration::from_secs(constants::DEFAULT_METRICS_INTERVAL_SECS),
            backoff_interval: Duration::from_secs(constants::DEFAULT_METRICS_BACKOFF_SECS),
            failures_before_backoff: 3,
            trend_window: chrono::Duration::hours(1),
        }
    }
}

impl MetricsConfig {
    pub fn from_env() -> Self {
        Self {
            capacity: constants::get_metrics_capacity(),
            sample_interval: constants::get_metrics_interval(),
            backoff_interval: constants::get_metrics_backoff(),
            ..Default::default()
        }
    }
}

// ============================================================================
// SAMPLES
// ============================================================================

/// Cumulative host network counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkIo {
    pub bytes_sent: u64,
    pub bytes_recv: u64,
    pub packets_sent: u64,
    pub packets_recv: u64,
}

/// Host resource usage at one point in time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemMetrics {
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub memory_used_mb: f64,
    pub memory_total_mb: f64,
    pub disk_usage_percent: f64,
    pub network_io: NetworkIo,
    pub timestamp: DateTime<Utc>,
}

/// Cumulative request counters after one more observation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationMetrics {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    /// Mean over the raw-latency window (ms)
    pub average_response_time: f64,
    /// Cache hits over cache lookups (percent)
    pub cache_hit_rate: f64,
    pub timestamp: DateTime<Utc>,
}

/// One recorded error event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
    pub stack_trace: Option<String>,
    pub timestamp: DateTime<Utc>,
}

// ============================================================================
// TRENDS
// ============================================================================

/// Coarse direction of a metric over the lookback window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    #[default]
    Stable,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemTrend {
    pub cpu: Trend,
    pub memory: Trend,
    pub disk: Trend,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationTrend {
    pub requests: Trend,
    pub response_time: Trend,
    pub failures: Trend,
}

// ============================================================================
// REPORTS
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemReport {
    pub current: SystemMetrics,
    pub trend: SystemTrend,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplicationReport {
    pub current: ApplicationMetrics,
    pub trend: ApplicationTrend,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorSummary {
    /// Errors still retained in the window
    pub total_errors: usize,
    pub recent_errors: Vec<ErrorRecord>,
}

/// Current state of the collector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub system: SystemReport,
    pub application: ApplicationReport,
    pub errors: ErrorSummary,
    pub timestamp: DateTime<Utc>,
}

/// Samples captured within a lookback window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsHistory {
    pub system: Vec<SystemMetrics>,
    pub application: Vec<ApplicationMetrics>,
    pub hours: u32,
}

/// Layout of the export file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsExport {
    pub system_metrics: Vec<SystemMetrics>,
    pub application_metrics: Vec<ApplicationMetrics>,
    pub error_log: Vec<ErrorRecord>,
    pub export_timestamp: DateTime<Utc>,
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum SamplingError {
    #[error("host data unavailable: {0}")]
    Unavailable(String),

    #[error("sampler panicked")]
    Panicked,
}

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("failed to write metrics export: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize metrics: {0}")]
    Serialize(#[from] serde_json::Error),
}
