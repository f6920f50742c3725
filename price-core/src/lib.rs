//! Mobile Price Predictor - Core library
//!
//! Everything the HTTP service and the admin CLI share: input validation,
//! the prediction cache and the metrics collector.

pub mod constants;
pub mod logic;

pub use constants::ValidationLimits;
pub use logic::cache::{fingerprint, CacheStats, CachedPrediction, PredictionCache, PredictionLog};
pub use logic::features::{FeatureVector, ValidationError, FEATURE_COUNT, FEATURE_LAYOUT};
pub use logic::metrics::{MetricsCollector, MetricsConfig, MetricsError};
pub use logic::model::{heuristic_confidence, PriceTier};
