//! Logic Module - Prediction pipeline building blocks
//!
//! ## Structure
//! - `features/` - 20-field input layout, validation and preprocessing
//! - `model/` - class to price tier mapping, confidence heuristic
//! - `cache/` - SQLite prediction cache, sessions and audit log
//! - `metrics/` - host sampling, request metrics, trends and export

pub mod cache;
pub mod features;
pub mod metrics;
pub mod model;
