//! Fee-only APR
//!
//! Extrapolates trailing 7-day realized fee income to a year:
//!
//!   apr = (earn_7d / 7) * 365 / principal * 100
//!
//! A rough instantaneous signal, not a projection. Young or thin positions
//! swing hard.

use crate::types::MergedRecord;

const DAYS_PER_YEAR: f64 = 365.0;
const WINDOW_DAYS: f64 = 7.0;

/// APR in percent from a 7-day earn figure and principal.
/// `None` when either input is non-positive or non-finite.
pub fn apr_from(earn_7d: f64, principal: f64) -> Option<f64> {
    if !earn_7d.is_finite() || !principal.is_finite() || earn_7d <= 0.0 || principal <= 0.0 {
        return None;
    }

    let daily = earn_7d / WINDOW_DAYS;
    let apr = daily * DAYS_PER_YEAR / principal * 100.0;
    apr.is_finite().then_some(apr)
}

/// APR of a single merged record, based on `lp_earn_vee_7d` and `user_vee`
pub fn apr(record: &MergedRecord) -> Option<f64> {
    apr_from(record.earn_7d(), record.user_vee)
}

/// Set `lp_apr` on every record
pub fn derive_all(records: &[MergedRecord]) -> Vec<MergedRecord> {
    records
        .iter()
        .map(|r| {
            let mut out = r.clone();
            out.lp_apr = apr(r);
            out
        })
        .collect()
}
