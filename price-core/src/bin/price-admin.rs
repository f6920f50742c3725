//! price-admin
//!
//! Administration CLI for the Mobile Price Predictor.
//!
//! # Commands
//!
//! - `price-admin status` - Cache and host health
//! - `price-admin cache-stats` - Detailed cache statistics
//! - `price-admin cleanup-cache --days N` - Delete cache entries older than N days
//! - `price-admin metrics --hours N` - Current metrics and history summary
//! - `price-admin export --type metrics|cache --output FILE` - Export to JSON
//! - `price-admin errors --limit N` - Recent failed predictions from the audit log

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use price_core::constants::{self, APP_NAME, APP_VERSION};
use price_core::logic::metrics::{HostSampler, MetricsHistory, MetricsSnapshot};
use price_core::{CacheStats, MetricsCollector, MetricsConfig, PredictionCache};

#[derive(Parser)]
#[command(name = "price-admin")]
#[command(about = "Mobile Price Predictor administration")]
#[command(version)]
struct Cli {
    /// SQLite cache file (defaults to DATABASE_PATH or predictions.db)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show application status and health
    Status,
    /// Show detailed cache statistics
    CacheStats,
    /// Delete cache entries older than the given age
    CleanupCache {
        /// Maximum age in days
        #[arg(long, default_value_t = constants::DEFAULT_RETENTION_DAYS)]
        days: u32,
    },
    /// Show current metrics and a history summary
    Metrics {
        /// Lookback window in hours
        #[arg(long, default_value_t = 24)]
        hours: u32,
    },
    /// Export metrics or cache statistics to a JSON file
    Export {
        /// What to export
        #[arg(long = "type", value_enum)]
        kind: ExportKind,
        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Show recent failed predictions
    Errors {
        /// Number of records to show
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ExportKind {
    Metrics,
    Cache,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let db_path = cli
        .database
        .unwrap_or_else(|| PathBuf::from(constants::get_database_path()));

    match cli.command {
        Commands::Status => {
            let cache = open_cache(&db_path)?;
            let metrics = sampled_collector();
            show_status(&cache, &metrics);
        }
        Commands::CacheStats => {
            let cache = open_cache(&db_path)?;
            print_cache_stats(&cache.stats());
        }
        Commands::CleanupCache { days } => {
            let cache = open_cache(&db_path)?;
            println!("Cleaning up cache entries older than {} days...", days);
            let deleted = cache.cleanup(days);
            println!("Cleaned up {} old predictions", deleted);
            println!();
            print_cache_stats(&cache.stats());
        }
        Commands::Metrics { hours } => {
            let metrics = sampled_collector();
            print_metrics(&metrics.snapshot(), &metrics.history(hours));
        }
        Commands::Export { kind, output } => {
            println!("Exporting {:?} to {}...", kind, output.display());
            match kind {
                ExportKind::Metrics => {
                    sampled_collector()
                        .export(&output)
                        .context("metrics export failed")?;
                }
                ExportKind::Cache => {
                    let stats = open_cache(&db_path)?.stats();
                    let json = serde_json::to_string_pretty(&stats)?;
                    fs::write(&output, json)
                        .with_context(|| format!("failed to write {}", output.display()))?;
                }
            }
            println!("Data exported successfully to {}", output.display());
        }
        Commands::Errors { limit } => {
            let failures = open_cache(&db_path)?.recent_failures(limit);
            if failures.is_empty() {
                println!("No recent errors found");
            }
            for (i, failure) in failures.iter().enumerate() {
                println!(
                    "{}. [{}] {} ({:.0}ms, session {})",
                    i + 1,
                    failure.logged_at.format("%Y-%m-%d %H:%M:%S"),
                    failure.error_message.as_deref().unwrap_or("unknown error"),
                    failure.latency_ms,
                    failure.session_id.as_deref().unwrap_or("-")
                );
            }
        }
    }

    Ok(())
}

fn open_cache(path: &Path) -> Result<PredictionCache> {
    PredictionCache::open(path).with_context(|| format!("failed to open cache {}", path.display()))
}

/// A stopped collector holding one fresh host sample
fn sampled_collector() -> MetricsCollector {
    let metrics =
        MetricsCollector::with_sampler(MetricsConfig::from_env(), Box::new(HostSampler::primed()));
    if let Err(e) = metrics.capture_now() {
        log::warn!("Host sampling failed: {}", e);
    }
    metrics
}

// ============================================================================
// OUTPUT
// ============================================================================

fn show_status(cache: &PredictionCache, metrics: &MetricsCollector) {
    println!("{} v{}", APP_NAME, APP_VERSION);
    println!("{}", "=".repeat(40));

    let stats = cache.stats();
    if cache.is_available() {
        println!("Database: connected ({:.2} MB)", stats.cache_size_mb);
    } else {
        println!("Database: unavailable ({})", cache.path().display());
    }

    let system = metrics.snapshot().system.current;
    if system.memory_total_mb > 0.0 {
        println!("Metrics: collecting ({:.1}% CPU, {:.1}% memory)", system.cpu_percent, system.memory_percent);
    } else {
        println!("Metrics: not available");
    }

    println!();
    println!("Total Predictions: {}", stats.total_predictions);
    println!("Recent (24h): {}", stats.recent_predictions_24h);
    println!("Average Confidence: {}", format_confidence(stats.average_confidence));
}

fn print_cache_stats(stats: &CacheStats) {
    println!("Cache Statistics");
    println!("{}", "=".repeat(40));
    println!("Total Predictions: {}", stats.total_predictions);
    println!("Total Accesses: {}", stats.total_accesses);
    println!("Recent (24h): {}", stats.recent_predictions_24h);
    println!("Average Confidence: {}", format_confidence(stats.average_confidence));
    println!("Cache Size: {:.2} MB", stats.cache_size_mb);
    if stats.total_accesses > 0 {
        println!("Cache Hit Rate: {:.1}%", stats.hit_rate());
    }
}

fn print_metrics(snapshot: &MetricsSnapshot, history: &MetricsHistory) {
    println!("Application Metrics (last {} hours)", history.hours);
    println!("{}", "=".repeat(50));

    let system = &snapshot.system.current;
    let app = &snapshot.application.current;
    println!("CPU Usage: {:.1}%", system.cpu_percent);
    println!("Memory Usage: {:.1}%", system.memory_percent);
    println!("Disk Usage: {:.1}%", system.disk_usage_percent);
    println!("Total Requests: {}", app.total_requests);
    println!(
        "Success Rate: {:.1}%",
        app.successful_requests as f64 / app.total_requests.max(1) as f64 * 100.0
    );
    println!("Avg Response Time: {:.2}ms", app.average_response_time);

    if let Some(line) = summarize(history.system.iter().map(|m| m.cpu_percent)) {
        println!();
        println!("System ({} data points)", history.system.len());
        println!("   CPU: {}", line);
    }
    if let Some(line) = summarize(history.system.iter().map(|m| m.memory_percent)) {
        println!("   Memory: {}", line);
    }
    if let Some(line) = summarize(history.application.iter().map(|m| m.average_response_time)) {
        println!();
        println!("Application ({} data points)", history.application.len());
        println!("   Response Time (ms): {}", line);
    }
}

fn format_confidence(confidence: Option<f64>) -> String {
    confidence.map_or_else(|| "n/a".to_string(), |c| format!("{:.1}%", c))
}

/// "Min a, Max b, Avg c" or None for an empty series
fn summarize(values: impl Iterator<Item = f64>) -> Option<String> {
    let (mut min, mut max, mut sum, mut count) = (f64::MAX, f64::MIN, 0.0, 0usize);
    for v in values {
        min = min.min(v);
        max = max.max(v);
        sum += v;
        count += 1;
    }
    (count > 0).then(|| format!("Min {:.1}, Max {:.1}, Avg {:.1}", min, max, sum / count as f64))
}
