use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tempfile::TempDir;

use super::*;

#[derive(Clone, Copy)]
enum Mode {
    /// cpu / memory / disk grow by `step` on every call
    Ramp(f64),
    /// first sample is stamped this many hours ago, later ones now
    Backdated(i64),
    Fail,
    Panic,
}

struct ScriptedSampler {
    calls: Arc<AtomicUsize>,
    mode: Mode,
}

impl ScriptedSampler {
    fn boxed(mode: Mode) -> (Box<dyn SystemSampler>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let sampler = ScriptedSampler {
            calls: Arc::clone(&calls),
            mode,
        };
        (Box::new(sampler), calls)
    }
}

impl SystemSampler for ScriptedSampler {
    fn sample(&mut self) -> Result<SystemMetrics, SamplingError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        match self.mode {
            Mode::Ramp(step) => Ok(SystemMetrics {
                cpu_percent: step * n as f64,
                memory_percent: step * n as f64,
                disk_usage_percent: step * n as f64,
                memory_total_mb: 8192.0,
                timestamp: Utc::now(),
                ..Default::default()
            }),
            Mode::Backdated(hours) => {
                let timestamp = if n == 1 {
                    Utc::now() - chrono::Duration::hours(hours)
                } else {
                    Utc::now()
                };
                Ok(SystemMetrics {
                    cpu_percent: n as f64,
                    memory_total_mb: 8192.0,
                    timestamp,
                    ..Default::default()
                })
            }
            Mode::Fail => Err(SamplingError::Unavailable("scripted".to_string())),
            Mode::Panic => panic!("scripted sampler panic"),
        }
    }
}

fn fast_config() -> MetricsConfig {
    MetricsConfig {
        capacity: 100,
        sample_interval: Duration::from_millis(10),
        backoff_interval: Duration::from_millis(10),
        ..Default::default()
    }
}

fn collector(mode: Mode) -> (MetricsCollector, Arc<AtomicUsize>) {
    let (sampler, calls) = ScriptedSampler::boxed(mode);
    (MetricsCollector::with_sampler(fast_config(), sampler), calls)
}

// ============================================================================
// REQUESTS
// ============================================================================

#[test]
fn test_record_request_counters_and_mean() {
    let (metrics, _) = collector(Mode::Ramp(1.0));
    metrics.record_request(100.0, true);
    metrics.record_request(200.0, false);
    metrics.record_request(300.0, true);

    let current = metrics.snapshot().application.current;
    assert_eq!(current.total_requests, 3);
    assert_eq!(current.successful_requests, 2);
    assert_eq!(current.failed_requests, 1);
    assert!((current.average_response_time - 200.0).abs() < 1e-9);
}

#[test]
fn test_first_request_starts_counters() {
    let (metrics, _) = collector(Mode::Ramp(1.0));
    metrics.record_request(42.0, false);

    let current = metrics.snapshot().application.current;
    assert_eq!(current.total_requests, 1);
    assert_eq!(current.successful_requests, 0);
    assert_eq!(current.failed_requests, 1);
    assert_eq!(current.average_response_time, 42.0);
}

#[test]
fn test_cache_hit_rate() {
    let (metrics, _) = collector(Mode::Ramp(1.0));
    metrics.record_request(10.0, true);
    assert_eq!(metrics.snapshot().application.current.cache_hit_rate, 0.0);

    metrics.record_cache_lookup(true);
    metrics.record_cache_lookup(false);
    metrics.record_cache_lookup(true);
    metrics.record_cache_lookup(true);
    metrics.record_request(10.0, true);

    assert_eq!(metrics.snapshot().application.current.cache_hit_rate, 75.0);
}

#[test]
fn test_application_window_evicts_oldest() {
    let config = MetricsConfig {
        capacity: 3,
        ..fast_config()
    };
    let (sampler, _) = ScriptedSampler::boxed(Mode::Ramp(1.0));
    let metrics = MetricsCollector::with_sampler(config, sampler);

    for latency in [10.0, 20.0, 30.0, 40.0, 50.0] {
        metrics.record_request(latency, true);
    }

    let history = metrics.history(1);
    assert_eq!(history.application.len(), 3);
    assert_eq!(history.application[0].total_requests, 3);

    // Only the last three latencies count toward the mean
    let current = metrics.snapshot().application.current;
    assert_eq!(current.total_requests, 5);
    assert!((current.average_response_time - 40.0).abs() < 1e-9);
}

#[test]
fn test_request_trend() {
    let (metrics, _) = collector(Mode::Ramp(1.0));
    for _ in 0..5 {
        metrics.record_request(50.0, true);
    }

    let trend = metrics.snapshot().application.trend;
    assert_eq!(trend.requests, Trend::Increasing);
    assert_eq!(trend.response_time, Trend::Stable);
    assert_eq!(trend.failures, Trend::Stable);
}

// ============================================================================
// SNAPSHOT / ERRORS
// ============================================================================

#[test]
fn test_empty_snapshot() {
    let (metrics, _) = collector(Mode::Ramp(1.0));
    let snapshot = metrics.snapshot();

    assert_eq!(snapshot.system.current.cpu_percent, 0.0);
    assert_eq!(snapshot.application.current.total_requests, 0);
    assert_eq!(snapshot.system.trend, SystemTrend::default());
    assert_eq!(snapshot.application.trend, ApplicationTrend::default());
    assert_eq!(snapshot.errors.total_errors, 0);
    assert!(snapshot.errors.recent_errors.is_empty());
}

#[test]
fn test_record_error_summary() {
    let (metrics, _) = collector(Mode::Ramp(1.0));
    for i in 0..12 {
        metrics.record_error("ModelError", &format!("error {}", i), None);
    }
    metrics.record_error("IoError", "disk full", Some("at write_export"));

    let errors = metrics.snapshot().errors;
    assert_eq!(errors.total_errors, 13);
    assert_eq!(errors.recent_errors.len(), 10);

    let last = errors.recent_errors.last().unwrap();
    assert_eq!(last.error_type, "IoError");
    assert_eq!(last.stack_trace.as_deref(), Some("at write_export"));

    let two = metrics.recent_errors(2);
    assert_eq!(two[0].message, "error 11");
}

// ============================================================================
// SAMPLING
// ============================================================================

#[test]
fn test_capture_now_and_system_trend() {
    let (metrics, calls) = collector(Mode::Ramp(10.0));
    for _ in 0..3 {
        metrics.capture_now().unwrap();
    }
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.system.current.cpu_percent, 30.0);
    assert_eq!(snapshot.system.trend.cpu, Trend::Increasing);
    assert_eq!(snapshot.system.trend.disk, Trend::Increasing);
    assert_eq!(metrics.history(1).system.len(), 3);
}

#[test]
fn test_flat_samples_are_stable() {
    let (metrics, _) = collector(Mode::Ramp(0.0));
    for _ in 0..5 {
        metrics.capture_now().unwrap();
    }
    assert_eq!(metrics.snapshot().system.trend, SystemTrend::default());
}

#[test]
fn test_sampler_panic_is_contained() {
    let (metrics, _) = collector(Mode::Panic);
    assert!(matches!(metrics.capture_now(), Err(SamplingError::Panicked)));
    assert!(matches!(metrics.capture_now(), Err(SamplingError::Panicked)));

    metrics.record_request(5.0, true);
    assert_eq!(metrics.snapshot().application.current.total_requests, 1);
    assert!(metrics.history(1).system.is_empty());
}

#[test]
fn test_start_stop() {
    let (metrics, calls) = collector(Mode::Ramp(1.0));
    assert!(!metrics.is_running());

    assert!(metrics.start());
    assert!(!metrics.start());
    assert!(metrics.is_running());

    std::thread::sleep(Duration::from_millis(100));
    assert!(metrics.stop());
    assert!(!metrics.stop());
    assert!(!metrics.is_running());

    let taken = calls.load(Ordering::SeqCst);
    assert!(taken >= 2, "expected several samples, got {}", taken);
    let retained = metrics.history(1).system.len();

    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(calls.load(Ordering::SeqCst), taken);
    assert_eq!(metrics.history(1).system.len(), retained);
}

#[test]
fn test_restart_after_stop() {
    let (metrics, calls) = collector(Mode::Ramp(1.0));
    assert!(metrics.start());
    assert!(metrics.stop());
    let first = calls.load(Ordering::SeqCst);

    assert!(metrics.start());
    std::thread::sleep(Duration::from_millis(50));
    assert!(metrics.stop());
    assert!(calls.load(Ordering::SeqCst) > first);
}

#[test]
fn test_failing_sampler_keeps_loop_alive() {
    let (metrics, calls) = collector(Mode::Fail);
    assert!(metrics.start());
    std::thread::sleep(Duration::from_millis(100));

    assert!(metrics.is_running());
    assert!(calls.load(Ordering::SeqCst) > 3);
    assert!(metrics.history(1).system.is_empty());
    assert!(metrics.stop());
}

#[test]
fn test_backoff_after_repeated_failures() {
    let config = MetricsConfig {
        sample_interval: Duration::from_millis(5),
        backoff_interval: Duration::from_secs(60),
        failures_before_backoff: 3,
        ..fast_config()
    };
    let (sampler, calls) = ScriptedSampler::boxed(Mode::Fail);
    let metrics = MetricsCollector::with_sampler(config, sampler);

    assert!(metrics.start());
    std::thread::sleep(Duration::from_millis(150));
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    // Stop wakes the thread out of the long backoff
    assert!(metrics.stop());
}

// ============================================================================
// EXPORT
// ============================================================================

#[test]
fn test_export_roundtrip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("metrics.json");

    let (metrics, _) = collector(Mode::Ramp(5.0));
    metrics.capture_now().unwrap();
    metrics.record_request(12.0, true);
    metrics.record_error("ValidationError", "bad input", None);

    metrics.export(&path).unwrap();
    let export = exporter::read_export(&path).unwrap();
    assert_eq!(export.system_metrics.len(), 1);
    assert_eq!(export.application_metrics.len(), 1);
    assert_eq!(export.error_log.len(), 1);

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    for key in ["system_metrics", "application_metrics", "error_log", "export_timestamp"] {
        assert!(raw.get(key).is_some(), "missing {}", key);
    }
    assert_eq!(raw["error_log"][0]["type"], "ValidationError");
}

#[test]
fn test_export_overwrites() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("metrics.json");
    std::fs::write(&path, "stale contents that are not json").unwrap();

    let (metrics, _) = collector(Mode::Ramp(1.0));
    metrics.export(&path).unwrap();
    let export = exporter::read_export(&path).unwrap();
    assert!(export.system_metrics.is_empty());
}

#[test]
fn test_export_to_missing_directory_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing").join("metrics.json");

    let (metrics, _) = collector(Mode::Ramp(1.0));
    assert!(matches!(metrics.export(&path), Err(MetricsError::Io(_))));
}

#[test]
fn test_history_excludes_samples_outside_lookback() {
    let (metrics, _) = collector(Mode::Backdated(2));
    metrics.capture_now().unwrap();
    metrics.capture_now().unwrap();

    let last_hour = metrics.history(1);
    assert_eq!(last_hour.hours, 1);
    assert_eq!(last_hour.system.len(), 1);
    assert_eq!(last_hour.system[0].cpu_percent, 2.0);
    assert_eq!(metrics.history(3).system.len(), 2);

    metrics.record_request_at(50.0, true, Utc::now() - chrono::Duration::hours(2));
    metrics.record_request(70.0, true);

    let last_hour = metrics.history(1);
    assert_eq!(last_hour.application.len(), 1);
    assert_eq!(last_hour.application[0].total_requests, 2);
    assert_eq!(metrics.history(3).application.len(), 2);
}
