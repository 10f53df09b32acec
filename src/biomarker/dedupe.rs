//! Duplicate collapsing for merged biomarker fetches.
//!
//! Dashboards merge results from several requests (paged history, category
//! views, refreshes), so the same measurement shows up more than once. This
//! pass keeps the first occurrence of each identity and drops the rest,
//! preserving input order.

use std::collections::HashSet;

use super::{Biomarker, BiomarkerKey};

/// Collapse duplicate records, keeping the first occurrence of each identity.
///
/// A record is a duplicate if its id was already seen, or if its measurement
/// tuple was — two records with different ids but identical
/// (name, value, unit, report_date) are the same physical measurement
/// ingested from different endpoints and collapse intentionally. O(n).
pub fn dedupe(biomarkers: Vec<Biomarker>) -> Vec<Biomarker> {
    let mut seen: HashSet<BiomarkerKey> = HashSet::with_capacity(biomarkers.len() * 2);
    let mut unique = Vec::with_capacity(biomarkers.len());

    for b in biomarkers {
        let tuple_key = BiomarkerKey::Measurement(b.measurement_key());
        let id_seen = b
            .id
            .map(|id| seen.contains(&BiomarkerKey::Id(id)))
            .unwrap_or(false);
        if id_seen || seen.contains(&tuple_key) {
            continue;
        }
        if let Some(id) = b.id {
            seen.insert(BiomarkerKey::Id(id));
        }
        seen.insert(tuple_key);
        unique.push(b);
    }

    unique
}
