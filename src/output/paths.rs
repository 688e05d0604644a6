// src/output/paths.rs
//! Pure file naming for exports.

use crate::types::{GroupName, ParentLabel};
use std::path::{Path, PathBuf};

/// Default export file name for a group, e.g. `maharashtra_pune.json`.
pub fn export_file_name(label: &ParentLabel, name: &GroupName) -> String {
    format!(
        "{}_{}.json",
        sanitize_segment(label.as_str()),
        sanitize_segment(name.as_str())
    )
}

/// Where an export lands when no explicit path is given.
pub fn default_export_path(dir: &Path, label: &ParentLabel, name: &GroupName) -> PathBuf {
    dir.join(export_file_name(label, name))
}

/// Lowercases and replaces anything outside `[a-z0-9-]` with `_`,
/// collapsing runs.
fn sanitize_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for c in segment.trim().chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() || c == '-' {
            out.push(c);
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }

    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        "unnamed".to_string()
    } else {
        trimmed.chars().take(60).collect()
    }
}
