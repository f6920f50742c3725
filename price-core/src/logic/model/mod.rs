//! Model Module - Interpreting the remote classifier's output
//!
//! The classifier itself runs elsewhere; this module only maps its integer
//! class to a price tier and attaches a display confidence.

pub mod confidence;
pub mod labels;

// Re-export common types
pub use confidence::heuristic_confidence;
pub use labels::{format_prediction_result, PriceTier};
