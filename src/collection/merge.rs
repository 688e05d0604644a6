//! Folding freshly ingested groups into an existing collection.

use crate::model::{Collection, Group, GroupStatus};
use crate::types::ParentLabel;
use std::collections::BTreeMap;
use std::fmt;

/// What a merge changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Labels that did not exist before.
    pub labels_added: usize,
    /// Groups that did not exist before.
    pub groups_added: usize,
    /// Existing groups that gained codes or weight.
    pub groups_updated: usize,
    /// Codes appended to existing groups.
    pub codes_added: usize,
}

impl MergeReport {
    pub fn is_unchanged(&self) -> bool {
        *self == Self::default()
    }
}

impl fmt::Display for MergeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unchanged() {
            return f.write_str("no changes");
        }
        write!(
            f,
            "{} new labels, {} new groups, {} groups updated ({} new codes)",
            self.labels_added, self.groups_added, self.groups_updated, self.codes_added
        )
    }
}

#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub collection: Collection,
    pub report: MergeReport,
}

/// Merges `incoming` into `existing`.
///
/// New labels and new groups are inserted as given. A group that already
/// exists keeps every item, status and result; it only gains codes it did
/// not have (as pending items) and takes the larger weight. Each label's
/// groups end up sorted by name.
pub fn merge(existing: &Collection, incoming: Vec<Group>) -> MergeOutcome {
    let mut by_label: BTreeMap<ParentLabel, Vec<Group>> = BTreeMap::new();
    for group in incoming {
        by_label
            .entry(group.parent_label().clone())
            .or_default()
            .push(group);
    }

    let mut collection = existing.clone();
    let mut report = MergeReport::default();

    for (label, groups) in by_label {
        let mut current = match existing.groups(&label) {
            Some(groups) => groups.clone(),
            None => {
                report.labels_added += 1;
                im::Vector::new()
            }
        };

        for group in groups {
            match current.iter().position(|g| g.name() == group.name()) {
                None => {
                    log::debug!("merge: new group {} / {}", label, group.name());
                    report.groups_added += 1;
                    current.push_back(group);
                }
                Some(index) => {
                    let (updated, changed, added) = merge_group(current[index].clone(), group);
                    if changed {
                        report.groups_updated += 1;
                        report.codes_added += added;
                        current.set(index, updated);
                    }
                }
            }
        }

        current.sort_by(|a, b| a.name().cmp(b.name()));
        collection = collection.with_label(label, current);
    }

    MergeOutcome { collection, report }
}

/// Returns the merged group, whether anything changed, and the number of
/// codes added.
fn merge_group(existing: Group, incoming: Group) -> (Group, bool, usize) {
    let raise_weight = incoming.weight() > existing.weight();
    let codes = incoming.items().iter().map(|item| item.code.clone());
    let (group, added) = existing.with_codes_added(codes);

    let group = if raise_weight {
        group.with_weight(incoming.weight())
    } else {
        group
    };
    // New pending codes mean the group is no longer complete.
    let group = if added > 0 && group.status() == GroupStatus::Completed {
        group.with_status(GroupStatus::Stopped)
    } else {
        group
    };
    (group, added > 0 || raise_weight, added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::start_discovery;
    use crate::model::{ExtractedRecord, ItemStatus};
    use crate::types::{GroupName, PostalCode};
    use pretty_assertions::assert_eq;

    fn code(s: &str) -> PostalCode {
        PostalCode::parse(s).unwrap()
    }

    fn group(label: &str, name: &str, codes: &[&str], weight: u64) -> Group {
        Group::new(
            ParentLabel::new(label).unwrap(),
            GroupName::new(name).unwrap(),
            codes.iter().map(|c| code(c)),
            weight,
        )
    }

    fn with_first_scanned(group: Group) -> Group {
        let first = group.items()[0].code.clone();
        let group = start_discovery(group);
        let (group, _) = crate::discovery::transitions::begin_attempt(group, &first, 1);
        let (group, _) = crate::discovery::transitions::record_success(
            group,
            &first,
            vec![ExtractedRecord::new("Sahyadri Clinic", "1 FC Road")],
        );
        crate::discovery::stop_discovery(group)
    }

    #[test]
    fn merge_adds_codes_without_losing_progress() {
        let pune = with_first_scanned(group("Maharashtra", "Pune", &["411001", "411002"], 100));
        let existing = merge(&Collection::new(), vec![pune]).collection;

        let outcome = merge(
            &existing,
            vec![group("Maharashtra", "Pune", &["411001", "411003"], 150)],
        );

        let label = ParentLabel::new("Maharashtra").unwrap();
        let merged = outcome
            .collection
            .group(&label, &GroupName::new("Pune").unwrap())
            .unwrap();

        let items: Vec<(&str, ItemStatus)> = merged
            .items()
            .iter()
            .map(|i| (i.code.as_str(), i.status))
            .collect();
        assert_eq!(
            items,
            vec![
                ("411001", ItemStatus::Scanned),
                ("411002", ItemStatus::Pending),
                ("411003", ItemStatus::Pending),
            ]
        );
        assert_eq!(merged.weight(), 150);
        assert_eq!(merged.result_count(), 1);
        assert_eq!(
            outcome.report,
            MergeReport {
                labels_added: 0,
                groups_added: 0,
                groups_updated: 1,
                codes_added: 1,
            }
        );
    }

    #[test]
    fn new_codes_reopen_a_completed_group_without_losing_results() {
        let pune = with_first_scanned(group("Maharashtra", "Pune", &["411001"], 100));
        assert_eq!(pune.status(), GroupStatus::Completed);
        let existing = merge(&Collection::new(), vec![pune]).collection;

        let outcome = merge(
            &existing,
            vec![group("Maharashtra", "Pune", &["411001", "411003"], 100)],
        );
        let label = ParentLabel::new("Maharashtra").unwrap();
        let merged = outcome
            .collection
            .group(&label, &GroupName::new("Pune").unwrap())
            .unwrap()
            .clone();
        assert_eq!(merged.status(), GroupStatus::Stopped);

        let resumed = start_discovery(merged);
        let items: Vec<ItemStatus> = resumed.items().iter().map(|i| i.status).collect();
        assert_eq!(items, vec![ItemStatus::Scanned, ItemStatus::Pending]);
        assert_eq!(resumed.result_count(), 1);
    }

    #[test]
    fn merge_sorts_groups_by_name() {
        let outcome = merge(
            &Collection::new(),
            vec![
                group("Karnataka", "Mysuru", &["570001"], 10),
                group("Karnataka", "Bengaluru", &["560001"], 20),
            ],
        );
        let label = ParentLabel::new("Karnataka").unwrap();
        let names: Vec<&str> = outcome
            .collection
            .groups(&label)
            .unwrap()
            .iter()
            .map(|g| g.name().as_str())
            .collect();
        assert_eq!(names, vec!["Bengaluru", "Mysuru"]);
        assert_eq!(outcome.report.labels_added, 1);
        assert_eq!(outcome.report.groups_added, 2);
    }

    #[test]
    fn lower_weight_and_known_codes_change_nothing() {
        let existing = merge(
            &Collection::new(),
            vec![group("Maharashtra", "Pune", &["411001"], 100)],
        )
        .collection;

        let outcome = merge(
            &existing,
            vec![group("Maharashtra", "Pune", &["411001"], 50)],
        );
        assert!(outcome.report.is_unchanged());
        assert_eq!(outcome.collection, existing);
    }

    #[test]
    fn report_display() {
        assert_eq!(MergeReport::default().to_string(), "no changes");
        let report = MergeReport {
            labels_added: 1,
            groups_added: 2,
            groups_updated: 0,
            codes_added: 0,
        };
        assert_eq!(
            report.to_string(),
            "1 new labels, 2 new groups, 0 groups updated (0 new codes)"
        );
    }
}
