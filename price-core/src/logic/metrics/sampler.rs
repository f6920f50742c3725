//! System samplers
//!
//! `HostSampler` reads the machine through `sysinfo`. The collector only
//! sees the `SystemSampler` trait, so tests can feed it scripted samples.

use std::thread;

use chrono::Utc;
use sysinfo::{Disks, Networks, System, MINIMUM_CPU_UPDATE_INTERVAL};

use super::types::{NetworkIo, SamplingError, SystemMetrics};

/// Source of system samples
pub trait SystemSampler: Send {
    fn sample(&mut self) -> Result<SystemMetrics, SamplingError>;
}

/// Samples the local host
pub struct HostSampler {
    system: System,
    networks: Networks,
    disks: Disks,
}

impl HostSampler {
    pub fn new() -> Self {
        let mut system = System::new();
        // CPU usage is a delta between two refreshes; prime the first one
        system.refresh_cpu();
        system.refresh_memory();

        Self {
            system,
            networks: Networks::new_with_refreshed_list(),
            disks: Disks::new_with_refreshed_list(),
        }
    }

    /// Sampler whose first `sample()` already sees a CPU delta
    ///
    /// Blocks for `sysinfo::MINIMUM_CPU_UPDATE_INTERVAL`. Meant for one-shot
    /// readings; the collector thread gets its delta from the interval.
    pub fn primed() -> Self {
        let sampler = Self::new();
        thread::sleep(MINIMUM_CPU_UPDATE_INTERVAL);
        sampler
    }
}

impl Default for HostSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemSampler for HostSampler {
    fn sample(&mut self) -> Result<SystemMetrics, SamplingError> {
        self.system.refresh_cpu();
        self.system.refresh_memory();
        self.networks.refresh();
        self.disks.refresh();

        let total_memory = self.system.total_memory() as f64;
        if total_memory <= 0.0 {
            return Err(SamplingError::Unavailable("memory totals".to_string()));
        }
        let used_memory = self.system.used_memory() as f64;

        let cpus = self.system.cpus();
        let cpu_percent = if cpus.is_empty() {
            0.0
        } else {
            cpus.iter().map(|c| c.cpu_usage() as f64).sum::<f64>() / cpus.len() as f64
        };

        let (disk_total, disk_available) = self
            .disks
            .list()
            .iter()
            .fold((0u64, 0u64), |(total, available), disk| {
                (total + disk.total_space(), available + disk.available_space())
            });
        let disk_usage_percent = if disk_total > 0 {
            (disk_total - disk_available.min(disk_total)) as f64 / disk_total as f64 * 100.0
        } else {
            0.0
        };

        let mut network_io = NetworkIo::default();
        for (_name, data) in self.networks.iter() {
            network_io.bytes_sent += data.total_transmitted();
            network_io.bytes_recv += data.total_received();
            network_io.packets_sent += data.total_packets_transmitted();
            network_io.packets_recv += data.total_packets_received();
        }

        Ok(SystemMetrics {
            cpu_percent,
            memory_percent: used_memory / total_memory * 100.0,
            memory_used_mb: used_memory / 1024.0 / 1024.0,
            memory_total_mb: total_memory / 1024.0 / 1024.0,
            disk_usage_percent,
            network_io,
            timestamp: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_primed_one_shot_sees_cpu_load() {
        let busy = Arc::new(AtomicBool::new(true));
        let spinner = {
            let busy = Arc::clone(&busy);
            thread::spawn(move || {
                let mut x = 0u64;
                while busy.load(Ordering::Relaxed) {
                    x = std::hint::black_box(x.wrapping_add(1));
                }
            })
        };

        let mut sampler = HostSampler::primed();
        let sample = sampler.sample();
        busy.store(false, Ordering::Relaxed);
        spinner.join().unwrap();

        let sample = sample.unwrap();
        assert!(sample.cpu_percent > 0.0, "cpu_percent = {}", sample.cpu_percent);
        assert!(sample.memory_total_mb > 0.0);
    }
}
