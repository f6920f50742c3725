//! HTML form handlers (`GET /`, `POST /`)
//!
//! The page always renders with 200; failures show up as the result text
//! next to the placeholder image.

use std::fmt::Write as _;
use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, State},
    http::HeaderMap,
    response::Html,
    Form,
};

use price_core::logic::features::is_float_feature;
use price_core::{PriceTier, FEATURE_LAYOUT};

use super::predict::{run_prediction, RequestContext};
use crate::models::{features_from_form, PredictForm};
use crate::{AppError, AppState};

const TITLE: &str = "Smartphone Price Predictor";

/// `GET /`
pub async fn index() -> Html<String> {
    Html(render(None, PriceTier::Unknown.image(), &PredictForm::new()))
}

/// `POST /`
pub async fn submit(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Form(form): Form<PredictForm>,
) -> Html<String> {
    let outcome = match features_from_form(&form, &state.config.limits) {
        Ok(features) => {
            let ctx = RequestContext::from_parts(&headers, peer.map(|ConnectInfo(addr)| addr));
            run_prediction(&state, features, &ctx).await
        }
        Err(e) => Err(AppError::from(e)),
    };

    let (text, image) = match outcome {
        Ok(result) => {
            let text = match result.confidence {
                Some(confidence) => format!("{} ({:.1}% confidence)", result.prediction_text, confidence),
                None => result.prediction_text,
            };
            (text, result.prediction_image)
        }
        Err(e) => {
            tracing::warn!("Form prediction failed: {}", e);
            (e.public_message(), PriceTier::Unknown.image().to_string())
        }
    };

    Html(render(Some(&text), &image, &form))
}

fn render(result: Option<&str>, image: &str, form: &PredictForm) -> String {
    let mut fields = String::new();
    for (index, name) in FEATURE_LAYOUT.iter().enumerate() {
        let step = if is_float_feature(index) { "0.1" } else { "1" };
        let value = form.get(*name).map(String::as_str).unwrap_or_default();
        let _ = writeln!(
            fields,
            r#"      <label>{name} <input type="number" name="{name}" min="0" step="{step}" value="{value}" required></label>"#,
            name = name,
            step = step,
            value = escape_html(value),
        );
    }

    let result = result
        .map(|text| format!(r#"    <p class="prediction">{}</p>"#, escape_html(text)))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8">
    <title>{title}</title>
  </head>
  <body>
    <h1>{title}</h1>
    <form method="post" action="/">
{fields}      <button type="submit">Predict</button>
    </form>
{result}
    <img src="/static/{image}" alt="prediction">
  </body>
</html>
"#,
        title = TITLE,
        fields = fields,
        result = result,
        image = escape_html(image),
    )
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
