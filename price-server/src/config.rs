//! Configuration module

use std::env;
use std::time::Duration;

use price_core::constants;
use price_core::{MetricsConfig, ValidationLimits};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// SQLite file backing the prediction cache
    pub database_path: String,

    /// Remote classifier invocation URL
    pub model_endpoint_url: String,

    /// Per-request timeout for the remote classifier
    pub model_timeout_secs: u64,

    /// Consult and fill the prediction cache
    pub cache_enabled: bool,

    /// Environment (development, production)
    pub environment: String,

    /// Directory served under `/static` (result artwork)
    pub static_dir: String,

    /// Range checks applied to incoming features
    pub limits: ValidationLimits,

    /// Metrics collector settings
    pub metrics: MetricsConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),

            database_path: constants::get_database_path(),

            model_endpoint_url: env::var("MODEL_ENDPOINT_URL")
                .unwrap_or_else(|_| "http://localhost:8501/invocations".to_string()),

            model_timeout_secs: env::var("MODEL_TIMEOUT_SECS")
                .ok()
                .and_then(|t| t.parse().ok())
                .unwrap_or(30),

            cache_enabled: env::var("CACHE_ENABLED")
                .map(|v| !matches!(v.trim().to_lowercase().as_str(), "false" | "0" | "no" | "off"))
                .unwrap_or(true),

            environment: env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),

            static_dir: env::var("STATIC_DIR")
                .unwrap_or_else(|_| "static".to_string()),

            limits: ValidationLimits::from_env(),

            metrics: MetricsConfig::from_env(),
        }
    }

    pub fn model_timeout(&self) -> Duration {
        Duration::from_secs(self.model_timeout_secs)
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
