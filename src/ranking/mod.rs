//! Position ranking
//!
//! Filtering and stable sorting of merged records for display. Both return
//! new sequences; the working set is never touched.

pub mod compare;
pub mod format;

pub use compare::{compare_values, field_value, SortDirection, SortValue};

use crate::types::MergedRecord;

/// Display query: name filter, zero-share toggle and sort order
#[derive(Debug, Clone, Default)]
pub struct ViewQuery {
    pub filter: String,
    pub hide_zero_share: bool,
    pub sort_key: String,
    pub direction: SortDirection,
}

/// Stable sort by `key`. Ties keep their input order.
pub fn sort(records: &[MergedRecord], key: &str, direction: SortDirection) -> Vec<MergedRecord> {
    let mut keyed: Vec<(SortValue, &MergedRecord)> =
        records.iter().map(|r| (field_value(r, key), r)).collect();

    // slice::sort_by is stable
    keyed.sort_by(|(a, _), (b, _)| compare_values(a, b, direction));

    keyed.into_iter().map(|(_, r)| r.clone()).collect()
}

/// Keep records whose display name contains `query` (case-insensitive),
/// optionally dropping records without LP share.
pub fn filter(records: &[MergedRecord], query: &str, hide_zero_share: bool) -> Vec<MergedRecord> {
    let needle = query.trim().to_lowercase();

    records
        .iter()
        .filter(|r| !hide_zero_share || r.has_position())
        .filter(|r| needle.is_empty() || r.display_name().to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

/// Filter, then sort
pub fn view(records: &[MergedRecord], query: &ViewQuery) -> Vec<MergedRecord> {
    let filtered = filter(records, &query.filter, query.hide_zero_share);
    sort(&filtered, &query.sort_key, query.direction)
}
