//! Prediction request and response models

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use price_core::logic::features::{feature_name, FEATURE_COUNT};
use price_core::{FeatureVector, PriceTier, ValidationError, ValidationLimits};

/// JSON body of `POST /api/v1/predict`
///
/// Exactly one of `features` (positional, 20 numbers) or `specs`
/// (field name to value) must be present.
#[derive(Debug, Default, Deserialize)]
pub struct PredictRequest {
    pub features: Option<Vec<f64>>,
    pub specs: Option<HashMap<String, f64>>,
}

impl PredictRequest {
    pub fn into_features(self, limits: &ValidationLimits) -> Result<FeatureVector, InputError> {
        match (self.features, self.specs) {
            (Some(raw), None) => Ok(FeatureVector::parse(&raw, limits)?),
            (None, Some(specs)) => Ok(FeatureVector::from_named(
                specs.iter().map(|(name, value)| (name.as_str(), *value)),
                limits,
            )?),
            (Some(_), Some(_)) => Err(InputError::Ambiguous),
            (None, None) => Err(InputError::Empty),
        }
    }
}

/// Reasons a request body cannot become a feature vector
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("Provide either `features` or `specs`, not both")]
    Ambiguous,

    #[error("Request must contain `features` or `specs`")]
    Empty,
}

/// Fields of the HTML form, keyed by feature name
pub type PredictForm = HashMap<String, String>;

/// Read the 20 named form fields in layout order
pub fn features_from_form(
    form: &PredictForm,
    limits: &ValidationLimits,
) -> Result<FeatureVector, ValidationError> {
    let mut raw = Vec::with_capacity(FEATURE_COUNT);
    for index in 0..FEATURE_COUNT {
        let Some(name) = feature_name(index) else {
            break;
        };
        let text = form
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .ok_or(ValidationError::MissingField(name))?;
        let value: f64 = text.parse().map_err(|_| ValidationError::NotANumber(name))?;
        raw.push(value);
    }
    FeatureVector::parse(&raw, limits)
}

/// Outcome of one prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub prediction: i64,
    pub prediction_text: String,
    pub prediction_image: String,
    pub tier: PriceTier,
    /// Display heuristic in percent, not a model probability
    pub confidence: Option<f64>,
    pub cached: bool,
    pub fingerprint: String,
    pub session_id: String,
    pub latency_ms: f64,
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub hours: Option<u32>,
}
