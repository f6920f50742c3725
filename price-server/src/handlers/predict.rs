//! Prediction handlers
//!
//! Pipeline shared by the JSON API and the HTML form:
//! validate -> cache lookup -> remote model -> label + confidence ->
//! cache write, session and audit log -> metrics.
//!
//! Validation failures are rejected before the pipeline runs and are not
//! counted as requests.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, State},
    http::{HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;

use price_core::{fingerprint, heuristic_confidence, FeatureVector, PredictionLog, PriceTier};

use crate::models::{PredictRequest, PredictResponse};
use crate::{AppError, AppResult, AppState};

pub const SESSION_HEADER: &str = "x-session-id";

/// Longest client-supplied session id we accept
const MAX_SESSION_ID_LEN: usize = 128;

// ============================================================================
// REQUEST CONTEXT
// ============================================================================

/// Who is asking
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub session_id: String,
    pub user_agent: Option<String>,
    pub client_ip: Option<String>,
}

impl RequestContext {
    pub fn from_parts(headers: &HeaderMap, peer: Option<SocketAddr>) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        let session_id = header(SESSION_HEADER)
            .filter(|id| id.len() <= MAX_SESSION_ID_LEN)
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        // First hop of x-forwarded-for is the original client
        let client_ip = header("x-forwarded-for")
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string())
            .or_else(|| peer.map(|addr| addr.ip().to_string()));

        Self {
            session_id,
            user_agent: header("user-agent").map(str::to_string),
            client_ip,
        }
    }
}

// ============================================================================
// PIPELINE
// ============================================================================

/// Run one validated vector through cache, model and bookkeeping
pub async fn run_prediction(
    state: &AppState,
    features: FeatureVector,
    ctx: &RequestContext,
) -> AppResult<PredictResponse> {
    let started = Instant::now();
    let key = fingerprint(&features);

    {
        let ctx = ctx.clone();
        state
            .with_cache(move |cache| {
                cache.touch_session(
                    &ctx.session_id,
                    ctx.user_agent.as_deref(),
                    ctx.client_ip.as_deref(),
                )
            })
            .await?;
    }

    if state.config.cache_enabled {
        let lookup = features.clone();
        let hit = state.with_cache(move |cache| cache.get(&lookup)).await?;
        state.metrics.record_cache_lookup(hit.is_some());

        if let Some(hit) = hit {
            tracing::debug!("Cache hit for {} (access #{})", key, hit.access_count);
            let response = PredictResponse {
                prediction: hit.prediction,
                prediction_image: PriceTier::from_class(hit.prediction).image().to_string(),
                prediction_text: hit.prediction_text,
                tier: PriceTier::from_class(hit.prediction),
                confidence: hit.confidence,
                cached: true,
                fingerprint: key,
                session_id: ctx.session_id.clone(),
                latency_ms: elapsed_ms(started),
            };
            finish(state, &features, &response, false).await?;
            return Ok(response);
        }
    }

    let class = match state.model.predict(&features).await {
        Ok(class) => class,
        Err(e) => {
            let latency_ms = elapsed_ms(started);
            let error = AppError::from(e);
            let message = error.to_string();
            state.metrics.record_request(latency_ms, false);
            state.metrics.record_error(error.kind(), &message, None);

            let entry = PredictionLog {
                session_id: Some(ctx.session_id.clone()),
                fingerprint: Some(key),
                predicted_class: None,
                latency_ms,
                success: false,
                error_message: Some(message),
            };
            state.with_cache(move |cache| cache.log_prediction(&entry)).await?;
            return Err(error);
        }
    };

    let tier = PriceTier::from_class(class);
    let response = PredictResponse {
        prediction: class,
        prediction_text: tier.label().to_string(),
        prediction_image: tier.image().to_string(),
        tier,
        confidence: heuristic_confidence(&features, class),
        cached: false,
        fingerprint: key,
        session_id: ctx.session_id.clone(),
        latency_ms: elapsed_ms(started),
    };
    finish(state, &features, &response, state.config.cache_enabled).await?;
    Ok(response)
}

/// Cache write, session count, audit row and request metrics
async fn finish(
    state: &AppState,
    features: &FeatureVector,
    response: &PredictResponse,
    store: bool,
) -> AppResult<()> {
    let features = features.clone();
    let snapshot = response.clone();
    state
        .with_cache(move |cache| {
            if store {
                cache.put(
                    &features,
                    snapshot.prediction,
                    &snapshot.prediction_text,
                    snapshot.confidence,
                );
            }
            cache.record_session_prediction(&snapshot.session_id);
            cache.log_prediction(&PredictionLog {
                session_id: Some(snapshot.session_id.clone()),
                fingerprint: Some(snapshot.fingerprint.clone()),
                predicted_class: Some(snapshot.prediction),
                latency_ms: snapshot.latency_ms,
                success: true,
                error_message: None,
            });
        })
        .await?;

    state.metrics.record_request(response.latency_ms, true);
    Ok(())
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

// ============================================================================
// JSON API
// ============================================================================

/// `POST /api/v1/predict`
pub async fn predict(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Result<Json<PredictRequest>, JsonRejection>,
) -> AppResult<Response> {
    let Json(request) = body.map_err(|e| AppError::ValidationError(e.body_text()))?;
    let features = request.into_features(&state.config.limits)?;

    let ctx = RequestContext::from_parts(&headers, peer.map(|ConnectInfo(addr)| addr));
    let response = run_prediction(&state, features, &ctx).await?;

    let mut http = Json(response).into_response();
    if let Ok(value) = HeaderValue::from_str(&ctx.session_id) {
        http.headers_mut().insert(SESSION_HEADER, value);
    }
    Ok(http)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_prefers_forwarded_ip_and_given_session() {
        let mut headers = HeaderMap::new();
        headers.insert(SESSION_HEADER, HeaderValue::from_static("abc-123"));
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        headers.insert("user-agent", HeaderValue::from_static("curl/8.0"));

        let peer: SocketAddr = "127.0.0.1:4000".parse().unwrap();
        let ctx = RequestContext::from_parts(&headers, Some(peer));

        assert_eq!(ctx.session_id, "abc-123");
        assert_eq!(ctx.client_ip.as_deref(), Some("203.0.113.7"));
        assert_eq!(ctx.user_agent.as_deref(), Some("curl/8.0"));
    }

    #[test]
    fn test_context_defaults() {
        let peer: SocketAddr = "192.0.2.1:5000".parse().unwrap();
        let ctx = RequestContext::from_parts(&HeaderMap::new(), Some(peer));

        assert!(Uuid::parse_str(&ctx.session_id).is_ok());
        assert_eq!(ctx.client_ip.as_deref(), Some("192.0.2.1"));
        assert_eq!(ctx.user_agent, None);

        let mut headers = HeaderMap::new();
        let long = "x".repeat(MAX_SESSION_ID_LEN + 1);
        headers.insert(SESSION_HEADER, HeaderValue::from_str(&long).unwrap());
        let ctx = RequestContext::from_parts(&headers, None);
        assert_ne!(ctx.session_id, long);
        assert_eq!(ctx.client_ip, None);
    }
}
