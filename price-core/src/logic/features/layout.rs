//! Feature Layout - Centralized Feature Definition
//!
//! **This file controls the input schema the remote model was trained on.**
//!
//! Positions are fixed: the model receives a bare array, so reordering
//! here silently changes every prediction.

// ============================================================================
// FEATURE LAYOUT (Authoritative source)
// ============================================================================

/// Feature names in exact order they appear in the vector
pub const FEATURE_LAYOUT: &[&str] = &[
    "battery_power", // 0: Battery capacity (mAh)
    "blue",          // 1: Has bluetooth
    "clock_speed",   // 2: Processor clock (GHz), float
    "dual_sim",      // 3: Dual SIM support
    "fc",            // 4: Front camera (MP)
    "four_g",        // 5: Has 4G
    "int_memory",    // 6: Internal memory (GB)
    "m_dep",         // 7: Mobile depth (cm), float
    "mobile_wt",     // 8: Weight (g)
    "n_cores",       // 9: Processor cores
    "pc",            // 10: Primary camera (MP)
    "px_height",     // 11: Pixel resolution height
    "px_width",      // 12: Pixel resolution width
    "ram",           // 13: RAM (MB)
    "sc_h",          // 14: Screen height (cm)
    "sc_w",          // 15: Screen width (cm)
    "talk_time",     // 16: Longest talk time on one charge (h)
    "three_g",       // 17: Has 3G
    "touch_screen",  // 18: Has touch screen
    "wifi",          // 19: Has wifi
];

/// Total number of features
/// IMPORTANT: Must match FEATURE_LAYOUT.len()!
pub const FEATURE_COUNT: usize = 20;

/// Positions carried as floating point; every other position is an integer
pub const FLOAT_FEATURES: &[usize] = &[2, 7];

pub const BATTERY_POWER: usize = 0;
pub const CLOCK_SPEED: usize = 2;
pub const RAM: usize = 13;

// ============================================================================
// FEATURE INDEX LOOKUP
// ============================================================================

/// Get feature index by name (O(n) but features are few)
pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_LAYOUT.iter().position(|&n| n == name)
}

/// Get feature name by index
pub fn feature_name(index: usize) -> Option<&'static str> {
    FEATURE_LAYOUT.get(index).copied()
}

pub fn is_float_feature(index: usize) -> bool {
    FLOAT_FEATURES.contains(&index)
}
