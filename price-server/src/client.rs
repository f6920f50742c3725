//! Remote model client
//!
//! HTTP client for the hosted price classifier. The endpoint takes a batch of
//! feature rows (`[[f1, ..., f20]]`) and answers with one class per row,
//! either as a bare array (`[2]`) or wrapped (`{"predictions": [2]}`).

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use price_core::FeatureVector;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model endpoint unreachable: {0}")]
    NetworkError(String),

    #[error("model endpoint timed out after {0:?}")]
    Timeout(Duration),

    #[error("model endpoint returned {status}: {body}")]
    ServerError { status: u16, body: String },

    #[error("unexpected model response: {0}")]
    ParseError(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ModelResponse {
    Bare(Vec<serde_json::Number>),
    Wrapped { predictions: Vec<serde_json::Number> },
}

impl ModelResponse {
    fn first_class(self) -> Result<i64, ModelError> {
        let classes = match self {
            ModelResponse::Bare(classes) => classes,
            ModelResponse::Wrapped { predictions } => predictions,
        };

        let first = classes
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::ParseError("empty prediction list".to_string()))?;

        // Classifiers serialized from numpy often emit `2.0`
        first
            .as_i64()
            .or_else(|| first.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .ok_or_else(|| ModelError::ParseError(format!("non-integer class {}", first)))
    }
}

/// Client for the remote classifier
#[derive(Clone)]
pub struct ModelClient {
    endpoint_url: String,
    timeout: Duration,
    http_client: reqwest::Client,
}

impl ModelClient {
    pub fn new(endpoint_url: impl Into<String>, timeout: Duration) -> Result<Self, ModelError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ModelError::NetworkError(e.to_string()))?;

        Ok(Self {
            endpoint_url: endpoint_url.into(),
            timeout,
            http_client,
        })
    }

    pub fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }

    /// Ask the classifier for the price class of one phone
    pub async fn predict(&self, features: &FeatureVector) -> Result<i64, ModelError> {
        let payload = vec![features.values().to_vec()];

        tracing::debug!("Invoking model endpoint {}", self.endpoint_url);

        let response = self
            .http_client
            .post(&self.endpoint_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ModelError::Timeout(self.timeout)
                } else {
                    ModelError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::ServerError {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ModelResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ModelError::Timeout(self.timeout)
            } else {
                ModelError::ParseError(e.to_string())
            }
        })?;

        let class = parsed.first_class()?;
        tracing::info!("Prediction received: {}", class);
        Ok(class)
    }
}
