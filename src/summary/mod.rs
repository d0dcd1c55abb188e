//! Portfolio Summary
//!
//! Totals across all positions with non-zero LP share, plus a blended APR
//! computed from the aggregated totals. Aggregating first weights each pair
//! by its capital; averaging per-row APRs would let tiny positions dominate.

use crate::ranking::format::{fmt_pct, fmt_usd, fmt_vee};
use crate::types::{MergedRecord, PairAddress, PositionBand};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Pair with the highest net effective return
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestPair {
    pub pair_address: PairAddress,
    pub item_name: Option<String>,
    pub net_effective_pct: f64,
    pub band: PositionBand,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    /// Records with lp_share > 0
    pub positions: usize,
    pub total_principal: f64,
    pub total_earn_24h: f64,
    pub total_earn_7d: f64,
    /// APR of the aggregate (percent); 0 when there is no principal
    pub blended_apr: f64,
    pub best_pair: Option<BestPair>,
    /// Sum of attached IL `value_lp_vee`
    pub total_lp_vee: f64,
    /// Sum of attached IL `value_lp_usd`; `None` when no pair reports USD
    pub total_lp_usd: Option<f64>,
    /// Newest snapshot timestamp across all records
    pub latest_snapshot_ts: Option<DateTime<Utc>>,
}

impl Default for PortfolioSummary {
    fn default() -> Self {
        Self {
            positions: 0,
            total_principal: 0.0,
            total_earn_24h: 0.0,
            total_earn_7d: 0.0,
            blended_apr: 0.0,
            best_pair: None,
            total_lp_vee: 0.0,
            total_lp_usd: None,
            latest_snapshot_ts: None,
        }
    }
}

pub fn summarize(records: &[MergedRecord]) -> PortfolioSummary {
    let mut summary = PortfolioSummary::default();
    let positions: Vec<&MergedRecord> = records.iter().filter(|r| r.has_position()).collect();

    for r in &positions {
        summary.positions += 1;
        summary.total_principal += r.user_vee;
        summary.total_earn_24h += r.earn_24h();
        summary.total_earn_7d += r.earn_7d();
    }

    summary.blended_apr = if summary.total_principal > 0.0 {
        let apr = summary.total_earn_7d / 7.0 * 365.0 / summary.total_principal * 100.0;
        if apr.is_finite() { apr } else { 0.0 }
    } else {
        0.0
    };

    for il in positions.iter().filter_map(|r| r.il.as_ref()) {
        if let Some(v) = il.value_lp_vee.filter(|v| v.is_finite()) {
            summary.total_lp_vee += v;
        }
        if let Some(v) = il.value_lp_usd.filter(|v| v.is_finite()) {
            summary.total_lp_usd = Some(summary.total_lp_usd.unwrap_or(0.0) + v);
        }
    }

    summary.best_pair = best_pair(&positions);
    summary.latest_snapshot_ts = records.iter().map(|r| r.snapshot.ts).max();

    summary
}

/// Highest finite net effective return; earlier record wins ties
fn best_pair(records: &[&MergedRecord]) -> Option<BestPair> {
    let mut best: Option<(&MergedRecord, f64)> = None;

    for &r in records {
        let Some(net) = r.net_effective_pct().filter(|v| v.is_finite()) else {
            continue;
        };
        match best {
            Some((_, top)) if net <= top => {}
            _ => best = Some((r, net)),
        }
    }

    best.map(|(r, net)| BestPair {
        pair_address: r.pair_address().clone(),
        item_name: r.snapshot.item_name.clone(),
        net_effective_pct: net,
        band: r.band,
    })
}

impl PortfolioSummary {
    /// One-line summary for logging
    pub fn summary_line(&self) -> String {
        let best = match &self.best_pair {
            Some(b) => format!(
                "{} ({}, {})",
                b.item_name.clone().unwrap_or_else(|| b.pair_address.short()),
                fmt_pct(Some(b.net_effective_pct)),
                b.band
            ),
            None => "-".to_string(),
        };

        format!(
            "{} positions | Principal: {} VEE | Fees 24h: {} | Fees 7d: {} | APR: {} | Best: {}",
            self.positions,
            fmt_vee(Some(self.total_principal)),
            fmt_vee(Some(self.total_earn_24h)),
            fmt_vee(Some(self.total_earn_7d)),
            fmt_pct(Some(self.blended_apr)),
            best
        )
    }

    /// Multi-line report block
    pub fn generate_report(&self) -> String {
        let mut report = String::new();
        report.push_str("═══════════════════════════════════════════════════════\n");
        report.push_str("                MY LP SUMMARY (ESTIMATED)              \n");
        report.push_str("═══════════════════════════════════════════════════════\n");

        if self.positions == 0 {
            report.push_str("No LP positions.\n");
            return report;
        }

        report.push_str(&format!("Positions:        {}\n", self.positions));
        report.push_str(&format!("Total VEE in LP:  {}\n", fmt_vee(Some(self.total_principal))));
        report.push_str(&format!("Fees 24h (VEE):   {}\n", fmt_vee(Some(self.total_earn_24h))));
        report.push_str(&format!("Fees 7d (VEE):    {}\n", fmt_vee(Some(self.total_earn_7d))));
        report.push_str(&format!("APR (est):        {}\n", fmt_pct(Some(self.blended_apr))));

        if self.total_lp_vee > 0.0 {
            report.push_str(&format!(
                "LP value:         {} VEE ({})\n",
                fmt_vee(Some(self.total_lp_vee)),
                fmt_usd(self.total_lp_usd)
            ));
        }

        if let Some(best) = &self.best_pair {
            report.push_str("───────────────────────────────────────────────────────\n");
            report.push_str(&format!(
                "BEST: {} {} [{}]\n",
                best.item_name.clone().unwrap_or_else(|| best.pair_address.short()),
                fmt_pct(Some(best.net_effective_pct)),
                best.band
            ));
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{apr_from, attach_il, IlBook};
    use crate::types::fixtures::{il, snapshot};
    use crate::types::Earn;

    fn position(addr: &str, user_vee: f64, earn7: f64) -> MergedRecord {
        let mut r = MergedRecord::from_snapshot(snapshot(addr, addr));
        r.lp_share = 0.1;
        r.user_vee = user_vee;
        r.lp_earn_vee_7d = Some(Earn::reported(earn7));
        r.lp_earn_vee_24h = Some(Earn::reported(earn7 / 7.0));
        r
    }

    #[test]
    fn test_blended_apr_weights_by_capital() {
        let records = vec![position("0xbig", 1000.0, 10.0), position("0xtiny", 1.0, 1.0)];
        let summary = summarize(&records);

        let big_apr = apr_from(10.0, 1000.0).unwrap();
        let tiny_apr = apr_from(1.0, 1.0).unwrap();
        let naive_avg = (big_apr + tiny_apr) / 2.0;

        // (11 / 7 * 365) / 1001 * 100
        assert!((summary.blended_apr - 57.2998).abs() < 1e-3, "blended = {}", summary.blended_apr);
        assert!((summary.blended_apr - big_apr).abs() < 6.0);
        assert!((summary.blended_apr - naive_avg).abs() > 2000.0);
    }

    #[test]
    fn test_zero_share_excluded() {
        let mut idle = position("0xidle", 500.0, 50.0);
        idle.lp_share = 0.0;
        let records = vec![position("0x1", 100.0, 7.0), idle];

        let summary = summarize(&records);
        assert_eq!(summary.positions, 1);
        assert_eq!(summary.total_principal, 100.0);
        assert!((summary.total_earn_7d - 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_no_principal_gives_zero_apr() {
        let summary = summarize(&[position("0x1", 0.0, 5.0)]);
        assert_eq!(summary.blended_apr, 0.0);
        assert_eq!(summarize(&[]).blended_apr, 0.0);
    }

    #[test]
    fn test_best_pair_ties_keep_first() {
        let records = vec![
            position("0x1", 10.0, 1.0),
            position("0x2", 10.0, 1.0),
            position("0x3", 10.0, 1.0),
        ];
        let mut m1 = il("0x1", Some(5.0));
        m1.value_lp_vee = Some(10.0);
        m1.value_lp_usd = Some(0.5);
        let book = IlBook::from_metrics(vec![m1, il("0x2", Some(25.0)), il("0x3", Some(25.0))], None);
        let records = attach_il(&records, &book);

        let summary = summarize(&records);
        let best = summary.best_pair.unwrap();
        assert_eq!(best.pair_address.as_str(), "0x2");
        assert_eq!(best.band, PositionBand::Strong);
        assert_eq!(summary.total_lp_vee, 10.0);
        assert_eq!(summary.total_lp_usd, Some(0.5));
    }

    #[test]
    fn test_best_pair_ignores_pairs_without_position() {
        let mut watched = position("0x9", 0.0, 0.0);
        watched.lp_share = 0.0;
        let records = vec![position("0x1", 10.0, 1.0), watched];

        let mut m9 = il("0x9", Some(80.0));
        m9.value_lp_vee = Some(50.0);
        let book = IlBook::from_metrics(vec![il("0x1", Some(12.0)), m9], None);
        let records = attach_il(&records, &book);

        let summary = summarize(&records);
        let best = summary.best_pair.unwrap();
        assert_eq!(best.pair_address.as_str(), "0x1");
        assert_eq!(best.net_effective_pct, 12.0);
        assert_eq!(summary.total_lp_vee, 0.0);
        assert_eq!(summary.positions, 1);
    }

    #[test]
    fn test_report_without_positions() {
        let report = summarize(&[]).generate_report();
        assert!(report.contains("No LP positions."));
    }
}
