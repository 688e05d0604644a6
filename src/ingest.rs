//! Turns raw location rows into groups.
//!
//! Input is a JSON array of rows:
//!
//! ```json
//! [{"label": "Maharashtra", "group": "Pune", "code": "411001", "weight": 3124458}]
//! ```

use crate::error::{AppError, Result};
use crate::model::Group;
use crate::types::{GroupName, ParentLabel, PostalCode};
use indexmap::{IndexMap, IndexSet};
use serde::Deserialize;
use std::path::Path;

/// One location row.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IngestRow {
    pub label: String,
    pub group: String,
    pub code: String,
    #[serde(default)]
    pub weight: u64,
}

#[derive(Default)]
struct PendingGroup {
    codes: IndexSet<PostalCode>,
    weight: u64,
}

/// Groups rows by (label, group) in first-seen order.
///
/// Blank codes are skipped. Codes are deduplicated per group, first occurrence
/// wins. The group weight is the largest weight seen across its rows.
pub fn ingest_rows(rows: impl IntoIterator<Item = IngestRow>) -> Result<Vec<Group>> {
    let mut pending: IndexMap<(ParentLabel, GroupName), PendingGroup> = IndexMap::new();
    let mut skipped = 0usize;

    for (index, row) in rows.into_iter().enumerate() {
        let invalid = |reason: String| AppError::InvalidRow { row: index, reason };

        let label = ParentLabel::new(row.label).map_err(|e| invalid(e.to_string()))?;
        let name = GroupName::new(row.group).map_err(|e| invalid(e.to_string()))?;

        let entry = pending.entry((label, name)).or_default();
        entry.weight = entry.weight.max(row.weight);

        if row.code.trim().is_empty() {
            skipped += 1;
            continue;
        }
        let code = PostalCode::parse(&row.code).map_err(|e| invalid(e.to_string()))?;
        entry.codes.insert(code);
    }

    if skipped > 0 {
        log::debug!("Skipped {} rows without a postal code", skipped);
    }

    Ok(pending
        .into_iter()
        .map(|((label, name), group)| Group::new(label, name, group.codes, group.weight))
        .collect())
}

/// Reads and ingests a JSON row file.
pub async fn ingest_file(path: &Path) -> Result<Vec<Group>> {
    let content = tokio::fs::read_to_string(path).await?;
    let rows: Vec<IngestRow> =
        serde_json::from_str(&content).map_err(|source| AppError::JsonParseError {
            path: path.to_path_buf(),
            source,
        })?;
    log::info!("Read {} rows from {}", rows.len(), path.display());
    ingest_rows(rows)
}
