//! Features Module - Input schema, validation and preprocessing
//!
//! Turns a raw phone specification into the fixed 20-element vector the
//! remote classifier expects.

pub mod layout;
pub mod vector;


// Re-export common types
pub use layout::{
    feature_index, feature_name, is_float_feature, FEATURE_COUNT, FEATURE_LAYOUT,
};
pub use vector::{preprocess, validate, FeatureValue, FeatureVector, ValidationError};
