// src/output/plan.rs
//! Pure planning of record exports.

use super::paths::default_export_path;
use super::types::{DeliveryTarget, OutputPlan};
use crate::analytics::export_records;
use crate::error::AppError;
use crate::model::Group;
use std::path::PathBuf;

/// Plans the export of a group's records as a pretty-printed JSON array,
/// to `path` when given and to stdout otherwise. When `path` is an existing
/// directory the file is named after the group inside it.
pub fn plan_export(group: &Group, path: Option<PathBuf>) -> Result<OutputPlan, AppError> {
    let records = export_records(group);
    let mut content = serde_json::to_string_pretty(&records)?;
    content.push('\n');

    let target = match path {
        Some(dir) if dir.is_dir() => DeliveryTarget::WriteFile {
            path: default_export_path(&dir, group.parent_label(), group.name()),
            content,
        },
        Some(path) => DeliveryTarget::WriteFile { path, content },
        None => DeliveryTarget::PrintToStdout { content },
    };
    Ok(OutputPlan::new().with_operation(target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ExtractedRecord;
    use crate::types::{GroupName, ParentLabel};

    #[test]
    fn empty_group_exports_empty_array() {
        let group = Group::new(
            ParentLabel::new("Goa").unwrap(),
            GroupName::new("Panaji").unwrap(),
            Vec::new(),
            0,
        );
        let plan = plan_export(&group, None).unwrap();
        assert_eq!(
            plan.operations,
            vec![DeliveryTarget::PrintToStdout {
                content: "[]\n".to_string()
            }]
        );
    }

    #[test]
    fn directory_target_gets_a_group_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let group = Group::new(
            ParentLabel::new("West Bengal").unwrap(),
            GroupName::new("Kolkata").unwrap(),
            Vec::new(),
            0,
        );
        let plan = plan_export(&group, Some(dir.path().to_path_buf())).unwrap();
        match &plan.operations[0] {
            DeliveryTarget::WriteFile { path, .. } => {
                assert_eq!(path, &dir.path().join("west_bengal_kolkata.json"))
            }
            other => panic!("expected a file target, got {:?}", other),
        }
    }

    #[test]
    fn exported_records_parse_back() {
        let group = Group::new(
            ParentLabel::new("Goa").unwrap(),
            GroupName::new("Panaji").unwrap(),
            Vec::new(),
            0,
        )
        .with_results_appended(vec![ExtractedRecord::new("Manipal Hospital", "Dona Paula")]);

        let plan = plan_export(&group, Some(PathBuf::from("panaji.json"))).unwrap();
        let parsed: Vec<ExtractedRecord> =
            serde_json::from_str(plan.operations[0].content()).unwrap();
        assert_eq!(parsed, export_records(&group));
    }
}
