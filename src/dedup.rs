//! Address fingerprints and on-arrival deduplication of extracted records.
//!
//! Two records describe the same place when their addresses reduce to the
//! same fingerprint: lowercase, with everything that is not an ASCII letter
//! or digit removed. `"12, Park St."` and `"12 Park St"` both become
//! `"12parkst"`.

use crate::model::ExtractedRecord;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static NON_ALPHANUMERIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^a-z0-9]+")
        .expect("Failed to compile fingerprint regex - this is a bug in the code")
});

/// Normalizes an address into a comparable key.
pub fn fingerprint(address: &str) -> String {
    let lowered = address.to_lowercase();
    NON_ALPHANUMERIC.replace_all(&lowered, "").into_owned()
}

/// Keeps the candidates whose fingerprint is in neither `existing` nor an
/// earlier candidate. Order is preserved; the first occurrence wins.
pub fn filter_new<'a, I>(candidates: Vec<ExtractedRecord>, existing: I) -> Vec<ExtractedRecord>
where
    I: IntoIterator<Item = &'a ExtractedRecord>,
{
    let mut seen: HashSet<String> = existing
        .into_iter()
        .map(|record| fingerprint(&record.address))
        .collect();

    candidates
        .into_iter()
        .filter(|candidate| seen.insert(fingerprint(&candidate.address)))
        .collect()
}
