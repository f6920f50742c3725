//! Cache Module - Prediction cache, sessions and audit log
//!
//! ## Structure
//! - `store.rs` - `PredictionCache`: put/get/stats/cleanup
//! - `sessions.rs` - session rows and the prediction log
//! - `schema.rs` - table definitions
//! - `types.rs` - result types
//!
//! Entries are keyed by [`fingerprint`]: SHA-256 over the canonical JSON of
//! the preprocessed vector. Accidental collisions are negligible; the key is
//! not meant to resist an attacker crafting colliding inputs.

pub mod schema;
pub mod sessions;
pub mod store;
pub mod types;

use sha2::{Digest, Sha256};

use crate::logic::features::FeatureVector;

pub use store::PredictionCache;
pub use types::{CacheError, CacheStats, CachedPrediction, FailedPrediction, PredictionLog};

/// Deterministic cache key of a feature vector (64 hex chars)
pub fn fingerprint(features: &FeatureVector) -> String {
    let mut hasher = Sha256::new();
    hasher.update(features.canonical_json().as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::ValidationLimits;
    use crate::logic::features::FEATURE_LAYOUT;

    const RAW: [f64; 20] = [
        1000.0, 1.0, 1.5, 1.0, 5.0, 1.0, 16.0, 0.1, 150.0, 4.0, 8.0, 1000.0, 2000.0, 2000.0, 10.0,
        5.0, 10.0, 1.0, 1.0, 1.0,
    ];

    #[test]
    fn test_fingerprint_deterministic() {
        let limits = ValidationLimits::default();
        let v = FeatureVector::parse(&RAW, &limits).unwrap();
        assert_eq!(fingerprint(&v), fingerprint(&v));
        assert_eq!(fingerprint(&v).len(), 64);
    }

    #[test]
    fn test_fingerprint_ignores_construction_order_and_formatting() {
        let limits = ValidationLimits::default();
        let positional = FeatureVector::parse(&RAW, &limits).unwrap();

        let mut named: Vec<(&str, f64)> = FEATURE_LAYOUT.iter().copied().zip(RAW).collect();
        named.reverse();
        let from_names = FeatureVector::from_named(named, &limits).unwrap();

        // 4.2 cores truncates to the same integer as 4
        let mut noisy = RAW;
        noisy[9] = 4.2;
        let truncated = FeatureVector::parse(&noisy, &limits).unwrap();

        assert_eq!(fingerprint(&positional), fingerprint(&from_names));
        assert_eq!(fingerprint(&positional), fingerprint(&truncated));
    }

    #[test]
    fn test_fingerprint_differs_for_different_input() {
        let limits = ValidationLimits::default();
        let mut other = RAW;
        other[13] = 2048.0;
        assert_ne!(
            fingerprint(&FeatureVector::parse(&RAW, &limits).unwrap()),
            fingerprint(&FeatureVector::parse(&other, &limits).unwrap())
        );
    }
}
