//! Export file I/O

use std::fs;
use std::path::Path;

use super::types::{MetricsError, MetricsExport};

/// Overwrite `path` with the pretty-printed export
pub fn write_export(export: &MetricsExport, path: &Path) -> Result<(), MetricsError> {
    let json = serde_json::to_string_pretty(export)?;
    fs::write(path, json)?;
    Ok(())
}

pub fn read_export(path: &Path) -> Result<MetricsExport, MetricsError> {
    let json = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}
