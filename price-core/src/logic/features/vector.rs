//! Feature Vector - Core data structure for model input
//!
//! Raw input arrives as plain numbers (JSON array, form fields). It goes
//! through two steps before anything else sees it:
//!
//! 1. `validate` - arity, non-negativity, per-field ranges
//! 2. `preprocess` - float positions stay `f64`, the rest become `i64`
//!
//! `FeatureVector::parse` runs both and is the only way to build one.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::layout::{
    feature_index, is_float_feature, BATTERY_POWER, CLOCK_SPEED, FEATURE_COUNT, FEATURE_LAYOUT,
    RAM,
};
use crate::constants::ValidationLimits;

// ============================================================================
// ERRORS
// ============================================================================

/// Rejection reasons surfaced to the client as-is
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Expected {expected} features, got {actual}")]
    WrongArity { expected: usize, actual: usize },

    #[error("All features must be finite numbers")]
    NotFinite,

    #[error("All features must be non-negative")]
    Negative,

    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
    },

    #[error("Missing feature: {0}")]
    MissingField(&'static str),

    #[error("Unknown feature: {0}")]
    UnknownField(String),

    #[error("{0} must be a number")]
    NotANumber(&'static str),
}

// ============================================================================
// FEATURE VALUE
// ============================================================================

/// One normalized element of the vector
///
/// Serializes untagged, so integers print without a fraction and floats
/// always with one (`1000`, `1.5`, `2.0`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Int(i64),
    Float(f64),
}

impl FeatureValue {
    pub fn as_f64(&self) -> f64 {
        match *self {
            FeatureValue::Int(v) => v as f64,
            FeatureValue::Float(v) => v,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, FeatureValue::Float(_))
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Int(v) => write!(f, "{}", v),
            FeatureValue::Float(v) => write!(f, "{:?}", v),
        }
    }
}

// ============================================================================
// VALIDATION & PREPROCESSING
// ============================================================================

/// Check a raw vector against arity, sign and range rules
pub fn validate(raw: &[f64], limits: &ValidationLimits) -> Result<(), ValidationError> {
    if raw.len() != FEATURE_COUNT {
        return Err(ValidationError::WrongArity {
            expected: FEATURE_COUNT,
            actual: raw.len(),
        });
    }

    if raw.iter().any(|v| !v.is_finite()) {
        return Err(ValidationError::NotFinite);
    }

    if raw.iter().any(|v| *v < 0.0) {
        return Err(ValidationError::Negative);
    }

    let checks = [
        ("Battery power", raw[BATTERY_POWER], limits.battery_power),
        ("Clock speed", raw[CLOCK_SPEED], limits.clock_speed),
        ("RAM", raw[RAM], limits.ram),
    ];
    for (field, value, bounds) in checks {
        if !bounds.contains(value) {
            return Err(ValidationError::OutOfRange {
                field,
                min: bounds.min,
                max: bounds.max,
            });
        }
    }

    Ok(())
}

/// Normalize element types. Expects a validated vector.
pub fn preprocess(raw: &[f64]) -> [FeatureValue; FEATURE_COUNT] {
    let mut values = [FeatureValue::Int(0); FEATURE_COUNT];
    for (i, v) in raw.iter().take(FEATURE_COUNT).enumerate() {
        values[i] = if is_float_feature(i) {
            // `+ 0.0` folds -0.0 into 0.0 so both fingerprint alike
            FeatureValue::Float(*v + 0.0)
        } else {
            // truncates toward zero
            FeatureValue::Int(v.trunc() as i64)
        };
    }
    log::debug!("Preprocessed {} features", FEATURE_COUNT);
    values
}

// ============================================================================
// FEATURE VECTOR
// ============================================================================

/// A validated, preprocessed 20-element phone specification
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FeatureVector {
    values: [FeatureValue; FEATURE_COUNT],
}

impl FeatureVector {
    /// Validate then preprocess a positional vector
    pub fn parse(raw: &[f64], limits: &ValidationLimits) -> Result<Self, ValidationError> {
        validate(raw, limits)?;
        Ok(Self {
            values: preprocess(raw),
        })
    }

    /// Build from `(name, value)` pairs in any order
    pub fn from_named<'a, I>(pairs: I, limits: &ValidationLimits) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut slots: [Option<f64>; FEATURE_COUNT] = [None; FEATURE_COUNT];
        for (name, value) in pairs {
            let index =
                feature_index(name).ok_or_else(|| ValidationError::UnknownField(name.to_string()))?;
            slots[index] = Some(value);
        }

        let mut raw = Vec::with_capacity(FEATURE_COUNT);
        for (i, slot) in slots.iter().enumerate() {
            raw.push(slot.ok_or(ValidationError::MissingField(FEATURE_LAYOUT[i]))?);
        }

        Self::parse(&raw, limits)
    }

    pub fn values(&self) -> &[FeatureValue; FEATURE_COUNT] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<FeatureValue> {
        self.values.get(index).copied()
    }

    pub fn get_by_name(&self, name: &str) -> Option<FeatureValue> {
        feature_index(name).and_then(|i| self.get(i))
    }

    /// Stable text form: compact JSON array with normalized element types
    pub fn canonical_json(&self) -> String {
        let parts: Vec<String> = self.values.iter().map(|v| v.to_string()).collect();
        format!("[{}]", parts.join(","))
    }
}
