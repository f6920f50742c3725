//! Metrics Collector - rolling windows fed by a sampling thread
//!
//! Lock layout:
//! - `system`: system window, written by the sampling thread
//! - `requests`: latency window, application window and cache counters
//!   together, so each derived sample is consistent with its inputs
//! - `errors`: error window
//!
//! No lock is held across a sleep or a file write.

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::{Condvar, Mutex};

use super::exporter;
use super::sampler::{HostSampler, SystemSampler};
use super::trend;
use super::types::*;
use super::window::RollingWindow;

// ============================================================================
// STOP SIGNAL
// ============================================================================

#[derive(Default)]
struct StopSignal {
    stopped: Mutex<bool>,
    cond: Condvar,
}

impl StopSignal {
    fn reset(&self) {
        *self.stopped.lock() = false;
    }

    fn raise(&self) {
        *self.stopped.lock() = true;
        self.cond.notify_all();
    }

    /// Sleep up to `timeout`; returns true once the signal is raised
    fn wait(&self, timeout: Duration) -> bool {
        let mut stopped = self.stopped.lock();
        if !*stopped {
            self.cond.wait_for(&mut stopped, timeout);
        }
        *stopped
    }
}

// ============================================================================
// SHARED STATE
// ============================================================================

struct RequestState {
    latencies: RollingWindow<f64>,
    samples: RollingWindow<ApplicationMetrics>,
    cache_lookups: u64,
    cache_hits: u64,
}

impl RequestState {
    fn hit_rate(&self) -> f64 {
        if self.cache_lookups == 0 {
            return 0.0;
        }
        self.cache_hits as f64 / self.cache_lookups as f64 * 100.0
    }
}

struct Shared {
    config: MetricsConfig,
    sampler: Mutex<Box<dyn SystemSampler>>,
    system: Mutex<RollingWindow<SystemMetrics>>,
    requests: Mutex<RequestState>,
    errors: Mutex<RollingWindow<ErrorRecord>>,
    stop: StopSignal,
}

impl Shared {
    fn capture(&self) -> Result<SystemMetrics, SamplingError> {
        let sample = {
            let mut sampler = self.sampler.lock();
            match panic::catch_unwind(AssertUnwindSafe(|| sampler.sample())) {
                Ok(result) => result?,
                Err(_) => return Err(SamplingError::Panicked),
            }
        };

        self.system.lock().push(sample.clone());
        Ok(sample)
    }
}

fn sampling_loop(shared: Arc<Shared>) {
    log::info!(
        "Metrics sampling started (interval: {:?}, capacity: {})",
        shared.config.sample_interval,
        shared.config.capacity
    );

    let mut failures = 0u32;
    loop {
        match shared.capture() {
            Ok(_) => failures = 0,
            Err(e) => {
                failures = failures.saturating_add(1);
                log::warn!("Metrics sampling failed ({} in a row): {}", failures, e);
            }
        }

        let pause = if failures >= shared.config.failures_before_backoff {
            shared.config.backoff_interval
        } else {
            shared.config.sample_interval
        };

        if shared.stop.wait(pause) {
            break;
        }
    }

    log::info!("Metrics sampling stopped");
}

// ============================================================================
// COLLECTOR
// ============================================================================

/// Collects host samples, request outcomes and error events
pub struct MetricsCollector {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl MetricsCollector {
    /// Collector over the local host. Starts stopped.
    pub fn new(config: MetricsConfig) -> Self {
        Self::with_sampler(config, Box::new(HostSampler::new()))
    }

    pub fn with_sampler(config: MetricsConfig, sampler: Box<dyn SystemSampler>) -> Self {
        let capacity = config.capacity;
        let shared = Shared {
            sampler: Mutex::new(sampler),
            system: Mutex::new(RollingWindow::new(capacity)),
            requests: Mutex::new(RequestState {
                latencies: RollingWindow::new(capacity),
                samples: RollingWindow::new(capacity),
                cache_lookups: 0,
                cache_hits: 0,
            }),
            errors: Mutex::new(RollingWindow::new(capacity)),
            stop: StopSignal::default(),
            config,
        };

        Self {
            shared: Arc::new(shared),
            worker: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.shared.config
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Spawn the sampling thread. Returns false if it was already running.
    pub fn start(&self) -> bool {
        let mut worker = self.worker.lock();
        if worker.is_some() {
            return false;
        }

        self.shared.stop.reset();
        let shared = Arc::clone(&self.shared);
        match thread::Builder::new()
            .name("metrics-sampler".to_string())
            .spawn(move || sampling_loop(shared))
        {
            Ok(handle) => {
                *worker = Some(handle);
                true
            }
            Err(e) => {
                log::error!("Failed to spawn metrics thread: {}", e);
                false
            }
        }
    }

    /// Signal the sampling thread and wait for it. Returns false if it was
    /// not running.
    pub fn stop(&self) -> bool {
        // Held through the join so a concurrent start cannot overlap.
        let mut worker = self.worker.lock();
        let Some(handle) = worker.take() else {
            return false;
        };

        self.shared.stop.raise();
        if handle.join().is_err() {
            log::error!("Metrics thread terminated abnormally");
        }
        true
    }

    pub fn is_running(&self) -> bool {
        self.worker.lock().is_some()
    }

    /// Take one system sample on the caller's thread
    pub fn capture_now(&self) -> Result<SystemMetrics, SamplingError> {
        self.shared.capture()
    }

    // ------------------------------------------------------------------------
    // Recording
    // ------------------------------------------------------------------------

    pub fn record_request(&self, latency_ms: f64, success: bool) {
        self.record_request_at(latency_ms, success, Utc::now());
    }

    pub(crate) fn record_request_at(&self, latency_ms: f64, success: bool, at: DateTime<Utc>) {
        let mut state = self.shared.requests.lock();
        state.latencies.push(latency_ms);

        let previous = state.samples.last().cloned().unwrap_or_default();
        let sample = ApplicationMetrics {
            total_requests: previous.total_requests + 1,
            successful_requests: previous.successful_requests + u64::from(success),
            failed_requests: previous.failed_requests + u64::from(!success),
            average_response_time: state.latencies.mean(),
            cache_hit_rate: state.hit_rate(),
            timestamp: at,
        };
        state.samples.push(sample);
    }

    pub fn record_cache_lookup(&self, hit: bool) {
        let mut state = self.shared.requests.lock();
        state.cache_lookups += 1;
        if hit {
            state.cache_hits += 1;
        }
    }

    pub fn record_error(&self, error_type: &str, message: &str, stack_trace: Option<&str>) {
        log::error!("[{}] {}", error_type, message);

        self.shared.errors.lock().push(ErrorRecord {
            error_type: error_type.to_string(),
            message: message.to_string(),
            stack_trace: stack_trace.map(str::to_string),
            timestamp: Utc::now(),
        });
    }

    // ------------------------------------------------------------------------
    // Reporting
    // ------------------------------------------------------------------------

    pub fn snapshot(&self) -> MetricsSnapshot {
        let now = Utc::now();
        let since = now - self.shared.config.trend_window;

        let system = {
            let window = self.shared.system.lock();
            SystemReport {
                current: window.last().cloned().unwrap_or_default(),
                trend: trend::system_trend(window.iter(), since),
            }
        };

        let application = {
            let state = self.shared.requests.lock();
            ApplicationReport {
                current: state.samples.last().cloned().unwrap_or_default(),
                trend: trend::application_trend(state.samples.iter(), since),
            }
        };

        let errors = {
            let window = self.shared.errors.lock();
            ErrorSummary {
                total_errors: window.len(),
                recent_errors: window.tail(10),
            }
        };

        MetricsSnapshot {
            system,
            application,
            errors,
            timestamp: now,
        }
    }

    /// Samples captured within the last `hours`
    pub fn history(&self, hours: u32) -> MetricsHistory {
        let since = Utc::now() - chrono::Duration::hours(i64::from(hours));

        let system = self
            .shared
            .system
            .lock()
            .iter()
            .filter(|m| m.timestamp > since)
            .cloned()
            .collect();
        let application = self
            .shared
            .requests
            .lock()
            .samples
            .iter()
            .filter(|m| m.timestamp > since)
            .cloned()
            .collect();

        MetricsHistory {
            system,
            application,
            hours,
        }
    }

    /// Newest `limit` error records, oldest first
    pub fn recent_errors(&self, limit: usize) -> Vec<ErrorRecord> {
        self.shared.errors.lock().tail(limit)
    }

    /// Write every retained sample and error to `path` as pretty JSON
    pub fn export(&self, path: impl AsRef<Path>) -> Result<(), MetricsError> {
        let export = MetricsExport {
            system_metrics: self.shared.system.lock().to_vec(),
            application_metrics: self.shared.requests.lock().samples.to_vec(),
            error_log: self.shared.errors.lock().to_vec(),
            export_timestamp: Utc::now(),
        };

        let path = path.as_ref();
        match exporter::write_export(&export, path) {
            Ok(()) => {
                log::info!("Metrics exported to {}", path.display());
                Ok(())
            }
            Err(e) => {
                log::error!("Metrics export to {} failed: {}", path.display(), e);
                Err(e)
            }
        }
    }
}

impl Drop for MetricsCollector {
    fn drop(&mut self) {
        self.stop();
    }
}
