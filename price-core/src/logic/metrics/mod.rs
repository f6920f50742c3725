//! Metrics Module - Host and request metrics
//!
//! ## Structure
//! - `collector.rs` - `MetricsCollector`: sampling thread, recording, reports
//! - `sampler.rs` - `SystemSampler` trait and the sysinfo-backed `HostSampler`
//! - `trend.rs` - slope-based trend classification
//! - `window.rs` - fixed-capacity rolling window
//! - `exporter.rs` - JSON export file
//! - `types.rs` - samples, reports, config and errors

pub mod collector;
pub mod exporter;
pub mod sampler;
pub mod trend;
pub mod types;
pub mod window;

#[cfg(test)]
mod tests;

pub use collector::MetricsCollector;
pub use sampler::{HostSampler, SystemSampler};
pub use types::*;
pub use window::RollingWindow;
