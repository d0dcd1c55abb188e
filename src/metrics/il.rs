//! Impermanent-loss book
//!
//! IL figures are computed by the analytics service; here they are only
//! indexed by pair, completed with target weights where the feed omits them,
//! and attached to merged records together with their classification band.

use crate::error::{json_type_name, FeedError, FeedKind};
use crate::merge::decode_records;
use crate::metrics::classifier::classify;
use crate::types::{IlMetrics, MergedRecord, PairAddress, PositionBand};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;

/// IL metrics for one wallet, keyed case-insensitively by pair
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IlBook {
    /// Feed order is kept so ties resolve the same way every cycle
    metrics: Vec<IlMetrics>,
    #[serde(default)]
    pub vee_usd_price: Option<f64>,
}

impl IlBook {
    pub fn from_metrics(metrics: Vec<IlMetrics>, vee_usd_price: Option<f64>) -> Self {
        let mut metrics = dedupe(metrics);
        fill_target_weights(&mut metrics);
        Self {
            metrics,
            vee_usd_price,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn get(&self, pair: &PairAddress) -> Option<&IlMetrics> {
        self.metrics.iter().find(|m| &m.pair_address == pair)
    }

    pub fn iter(&self) -> impl Iterator<Item = &IlMetrics> {
        self.metrics.iter()
    }

    /// Metrics by `net_effective_pct`, highest first, missing last
    pub fn ranked(&self) -> Vec<&IlMetrics> {
        let mut out: Vec<&IlMetrics> = self.metrics.iter().collect();
        out.sort_by(|a, b| match (finite(a.net_effective_pct), finite(b.net_effective_pct)) {
            (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        out
    }
}

/// Decode the IL feed into a book.
///
/// The response is either a bare array or `{ wallet, vee_usd_price, pairs }`.
/// An envelope without a `pairs` array is rejected like any other
/// non-collection; a non-numeric `vee_usd_price` is treated as unknown.
pub fn decode_il(value: Value) -> Result<IlBook, FeedError> {
    let (pairs, vee_usd_price) = match value {
        Value::Array(_) => (value, None),
        Value::Object(mut envelope) => {
            let vee_usd_price = envelope.get("vee_usd_price").and_then(Value::as_f64);
            match envelope.remove("pairs") {
                Some(pairs) => (pairs, vee_usd_price),
                None => {
                    return Err(FeedError::NotACollection {
                        feed: FeedKind::Il,
                        found: "object",
                    })
                }
            }
        }
        other => {
            return Err(FeedError::NotACollection {
                feed: FeedKind::Il,
                found: json_type_name(&other),
            })
        }
    };

    let metrics: Vec<IlMetrics> = decode_records(FeedKind::Il, pairs)?;
    Ok(IlBook::from_metrics(metrics, vee_usd_price))
}

/// Attach IL metrics and classify every record.
/// Records without IL data get `PositionBand::NotAvailable`.
pub fn attach_il(records: &[MergedRecord], book: &IlBook) -> Vec<MergedRecord> {
    let by_pair: HashMap<&PairAddress, &IlMetrics> =
        book.iter().map(|m| (&m.pair_address, m)).collect();

    records
        .iter()
        .map(|r| {
            let mut out = r.clone();
            out.il = by_pair.get(r.pair_address()).map(|m| (*m).clone());
            out.band = match &out.il {
                Some(il) => classify(il.net_effective_pct),
                None => PositionBand::NotAvailable,
            };
            out
        })
        .collect()
}

fn finite(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite())
}

fn dedupe(metrics: Vec<IlMetrics>) -> Vec<IlMetrics> {
    let mut out: Vec<IlMetrics> = Vec::with_capacity(metrics.len());
    for m in metrics {
        if !out.iter().any(|o| o.pair_address == m.pair_address) {
            out.push(m);
        }
    }
    out
}

/// Weight = net / sum of positive nets; zero for non-positive or missing.
/// Only fills weights the feed left out.
fn fill_target_weights(metrics: &mut [IlMetrics]) {
    let total: f64 = metrics
        .iter()
        .filter_map(|m| finite(m.net_effective_pct))
        .filter(|v| *v > 0.0)
        .sum();

    for m in metrics.iter_mut() {
        if m.target_weight.is_some() {
            continue;
        }
        let weight = match finite(m.net_effective_pct) {
            Some(v) if v > 0.0 && total > 0.0 => v / total,
            _ => 0.0,
        };
        m.target_weight = Some(weight);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::fixtures::{il, snapshot};
    use serde_json::json;

    #[test]
    fn test_decode_envelope() {
        let value = json!({
            "wallet": "0xwallet",
            "vee_usd_price": 0.02,
            "pairs": [
                {"pair_address": "0xAAA", "net_effective_pct": 30.0, "value_lp_vee": 120.0},
                {"pair_address": "0xbbb", "net_effective_pct": null}
            ]
        });

        let book = decode_il(value).unwrap();
        assert_eq!(book.len(), 2);
        assert_eq!(book.vee_usd_price, Some(0.02));
        assert_eq!(book.get(&PairAddress::new("0xaaa")).unwrap().value_lp_vee, Some(120.0));
    }

    #[test]
    fn test_decode_rejects_scalar() {
        let err = decode_il(json!("nope")).unwrap_err();
        assert!(matches!(err, FeedError::NotACollection { feed: FeedKind::Il, .. }));
    }

    #[test]
    fn test_decode_rejects_envelope_without_array() {
        let err = decode_il(json!({"pairs": {"pair_address": "0x1"}})).unwrap_err();
        assert!(matches!(err, FeedError::NotACollection { .. }));
    }

    #[test]
    fn test_decode_rejects_envelope_without_pairs() {
        let err = decode_il(json!({"wallet": "0xwallet", "vee_usd_price": 0.01})).unwrap_err();
        assert!(matches!(
            err,
            FeedError::NotACollection {
                feed: FeedKind::Il,
                found: "object"
            }
        ));
    }

    #[test]
    fn test_target_weights_filled() {
        let mut given = il("0x3", Some(5.0));
        given.target_weight = Some(0.9);
        let book = IlBook::from_metrics(
            vec![il("0x1", Some(30.0)), il("0x2", Some(-4.0)), il("0x4", Some(10.0)), given],
            None,
        );

        let w = |a: &str| book.get(&PairAddress::new(a)).unwrap().target_weight.unwrap();
        // positive total = 30 + 10 + 5
        assert!((w("0x1") - 30.0 / 45.0).abs() < 1e-12);
        assert_eq!(w("0x2"), 0.0);
        assert_eq!(w("0x3"), 0.9);
    }

    #[test]
    fn test_ranked_missing_last() {
        let book = IlBook::from_metrics(
            vec![il("0x1", None), il("0x2", Some(-3.0)), il("0x3", Some(12.0))],
            None,
        );
        let order: Vec<&str> = book.ranked().iter().map(|m| m.pair_address.as_str()).collect();
        assert_eq!(order, vec!["0x3", "0x2", "0x1"]);
    }

    #[test]
    fn test_attach_classifies() {
        let records = vec![
            MergedRecord::from_snapshot(snapshot("0xAAA", "Sword")),
            MergedRecord::from_snapshot(snapshot("0xbbb", "Shield")),
        ];
        let book = IlBook::from_metrics(vec![il("0xaaa", Some(-15.0))], None);

        let out = attach_il(&records, &book);
        assert_eq!(out[0].band, PositionBand::Exit);
        assert!(out[0].il.is_some());
        assert_eq!(out[1].band, PositionBand::NotAvailable);
        assert!(out[1].il.is_none());
    }
}
