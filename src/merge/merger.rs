//! Two-phase snapshot merge
//!
//! Phase 1 (`merge_base`) rebuilds the record set from the base market feed,
//! carrying LP fields forward from the previous working set. Phase 2
//! (`apply_wallet`) overlays wallet positions. Both take their inputs by
//! reference and return a fresh record set; nothing is mutated in place.

use crate::types::{Earn, LpPosition, MergedRecord, PairAddress, PairSnapshot};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Rebuild the record set from a new base snapshot.
///
/// Market fields always come from `base`. LP fields come from the previous
/// record for the same pair, or default to zero. Pairs missing from `base`
/// are dropped.
pub fn merge_base(base: &[PairSnapshot], previous: &[MergedRecord]) -> Vec<MergedRecord> {
    let prev_by_pair: HashMap<&PairAddress, &MergedRecord> =
        previous.iter().map(|r| (r.pair_address(), r)).collect();

    let mut seen: HashSet<&PairAddress> = HashSet::with_capacity(base.len());
    let mut merged = Vec::with_capacity(base.len());

    for snap in base {
        if !seen.insert(&snap.pair_address) {
            warn!("Duplicate pair {} in base feed, keeping first", snap.pair_address);
            continue;
        }

        let mut record = MergedRecord::from_snapshot(snap.clone());

        if let Some(prev) = prev_by_pair.get(&snap.pair_address) {
            record.lp_balance = prev.lp_balance;
            record.lp_share = prev.lp_share;
            record.user_item = prev.user_item;
            record.user_vee = prev.user_vee;
            record.lp_earn_vee_24h = prev.lp_earn_vee_24h;
            record.lp_earn_vee_7d = prev.lp_earn_vee_7d;
        }

        merged.push(record);
    }

    let dropped = previous
        .iter()
        .filter(|r| !seen.contains(r.pair_address()))
        .count();
    if dropped > 0 {
        debug!("merge_base: {} pairs no longer in base feed", dropped);
    }

    merged
}

/// Overlay wallet positions onto the record set.
///
/// A field the wallet omits keeps the record's current value. A wallet earn
/// figure is authoritative; otherwise the record's current figure (possibly
/// unknown) is kept for the fee estimator.
pub fn apply_wallet(records: &[MergedRecord], wallet: &[LpPosition]) -> Vec<MergedRecord> {
    let wallet_by_pair: HashMap<&PairAddress, &LpPosition> =
        wallet.iter().map(|p| (&p.pair_address, p)).collect();

    let matched = records
        .iter()
        .filter(|r| wallet_by_pair.contains_key(r.pair_address()))
        .count();
    if matched < wallet_by_pair.len() {
        debug!(
            "apply_wallet: {} wallet positions have no pair in base feed",
            wallet_by_pair.len() - matched
        );
    }

    records
        .iter()
        .map(|record| match wallet_by_pair.get(record.pair_address()) {
            Some(pos) => overlay(record, pos),
            None => record.clone(),
        })
        .collect()
}

fn overlay(record: &MergedRecord, pos: &LpPosition) -> MergedRecord {
    let mut out = record.clone();

    out.lp_balance = pos.lp_balance.unwrap_or(record.lp_balance);
    out.lp_share = pos.lp_share.unwrap_or(record.lp_share);
    out.user_item = pos.user_item.unwrap_or(record.user_item);
    out.user_vee = pos.user_vee.unwrap_or(record.user_vee);
    out.lp_earn_vee_24h = pos.lp_earn_vee_24h.map(Earn::reported).or(record.lp_earn_vee_24h);
    out.lp_earn_vee_7d = pos.lp_earn_vee_7d.map(Earn::reported).or(record.lp_earn_vee_7d);

    debug!(
        "Wallet overlay {}: share {:.6} -> {:.6}, user_vee {:.2}",
        record.pair_address(),
        record.lp_share,
        out.lp_share,
        out.user_vee
    );

    out
}
