//! Trend classification
//!
//! Among the samples inside the lookback window, take the first and last
//! value and compute `slope = (last - first) / count`. Fewer than two
//! samples is always `Stable`.
//!
//! Thresholds are policy, not derived constants:
//! - system metrics (cpu / memory / disk percent): ±1.0 point per sample
//! - application metrics (requests / latency / failures): ±0.1 unit per sample

use chrono::{DateTime, Utc};

use super::types::{ApplicationMetrics, ApplicationTrend, SystemMetrics, SystemTrend, Trend};

pub const SYSTEM_TREND_THRESHOLD: f64 = 1.0;
pub const APPLICATION_TREND_THRESHOLD: f64 = 0.1;

/// Classify an ordered series of values
pub fn classify(values: &[f64], threshold: f64) -> Trend {
    let (Some(first), Some(last)) = (values.first(), values.last()) else {
        return Trend::Stable;
    };
    if values.len() < 2 {
        return Trend::Stable;
    }

    let slope = (last - first) / values.len() as f64;
    if slope > threshold {
        Trend::Increasing
    } else if slope < -threshold {
        Trend::Decreasing
    } else {
        Trend::Stable
    }
}

pub fn system_trend<'a, I>(samples: I, since: DateTime<Utc>) -> SystemTrend
where
    I: IntoIterator<Item = &'a SystemMetrics>,
{
    let recent: Vec<&SystemMetrics> = samples.into_iter().filter(|m| m.timestamp > since).collect();
    let series = |f: fn(&SystemMetrics) -> f64| recent.iter().map(|m| f(m)).collect::<Vec<_>>();

    SystemTrend {
        cpu: classify(&series(|m| m.cpu_percent), SYSTEM_TREND_THRESHOLD),
        memory: classify(&series(|m| m.memory_percent), SYSTEM_TREND_THRESHOLD),
        disk: classify(&series(|m| m.disk_usage_percent), SYSTEM_TREND_THRESHOLD),
    }
}

pub fn application_trend<'a, I>(samples: I, since: DateTime<Utc>) -> ApplicationTrend
where
    I: IntoIterator<Item = &'a ApplicationMetrics>,
{
    let recent: Vec<&ApplicationMetrics> =
        samples.into_iter().filter(|m| m.timestamp > since).collect();
    let series =
        |f: fn(&ApplicationMetrics) -> f64| recent.iter().map(|m| f(m)).collect::<Vec<_>>();

    ApplicationTrend {
        requests: classify(&series(|m| m.total_requests as f64), APPLICATION_TREND_THRESHOLD),
        response_time: classify(
            &series(|m| m.average_response_time),
            APPLICATION_TREND_THRESHOLD,
        ),
        failures: classify(&series(|m| m.failed_requests as f64), APPLICATION_TREND_THRESHOLD),
    }
}
