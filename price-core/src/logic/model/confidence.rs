//! Confidence heuristic
//!
//! The remote endpoint returns only a class, never a probability. The
//! score produced here is a **heuristic for display**, not a model
//! confidence: it rewards agreement between the RAM-implied tier and the
//! predicted tier and adds a small jitter seeded from the input fingerprint,
//! so the same input always yields the same score.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::labels::PriceTier;
use crate::logic::cache::fingerprint;
use crate::logic::features::layout::RAM;
use crate::logic::features::FeatureVector;

/// Base score before agreement is added (percent)
const BASE_SCORE: f64 = 60.0;

/// Weight of full tier agreement (percent)
const AGREEMENT_WEIGHT: f64 = 30.0;

/// Half-width of the seeded jitter (percent)
const JITTER: f64 = 5.0;

const MIN_SCORE: f64 = 50.0;
const MAX_SCORE: f64 = 99.0;

/// RAM (MB) upper bounds for tiers 0..=2; anything above is tier 3
const RAM_TIER_BOUNDS: [f64; 3] = [1000.0, 2000.0, 3000.0];

/// Heuristic confidence in percent, `None` for unknown classes
pub fn heuristic_confidence(features: &FeatureVector, class: i64) -> Option<f64> {
    let predicted = PriceTier::from_class(class).class()?;

    let ram = features.get(RAM).map(|v| v.as_f64()).unwrap_or(0.0);
    let implied = RAM_TIER_BOUNDS
        .iter()
        .position(|bound| ram < *bound)
        .unwrap_or(RAM_TIER_BOUNDS.len()) as i64;
    let agreement = 1.0 - (implied - predicted).abs() as f64 / 3.0;

    let mut rng = StdRng::seed_from_u64(seed_for(features, class));
    let jitter = rng.gen_range(-JITTER..=JITTER);

    let score = (BASE_SCORE + AGREEMENT_WEIGHT * agreement + jitter).clamp(MIN_SCORE, MAX_SCORE);
    Some((score * 100.0).round() / 100.0)
}

fn seed_for(features: &FeatureVector, class: i64) -> u64 {
    let key = fingerprint(features);
    let head = u64::from_str_radix(&key[..16], 16).unwrap_or(0);
    head ^ class as u64
}
