//! Fee income fallback
//!
//! When the fee-accounting pipeline has not reported earnings for a position
//! yet, estimate them from pool volume:
//!
//!   earn = volume * fee_rate * lp_share
//!
//! Precedence per window: known figure > estimated from volume > zero.
//! An estimate is made once, when the window has no figure, and then carried
//! like any other value until the wallet feed reports one.
//! Pairs without LP share never get a synthetic non-zero fee.

use crate::error::ConfigError;
use crate::types::{Earn, MergedRecord};

/// Default share of swap volume paid out to LPs (5%)
pub const DEFAULT_FEE_RATE: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeeEstimator {
    fee_rate: f64,
}

impl FeeEstimator {
    /// `fee_rate` is a fraction of volume, e.g. 0.05 for 5%
    pub fn new(fee_rate: f64) -> Result<Self, ConfigError> {
        if !fee_rate.is_finite() || fee_rate < 0.0 {
            return Err(ConfigError::InvalidFeeRate(fee_rate));
        }
        Ok(Self { fee_rate })
    }

    pub fn fee_rate(&self) -> f64 {
        self.fee_rate
    }

    /// Fill in missing earn figures
    pub fn estimate(&self, record: &MergedRecord) -> MergedRecord {
        let mut out = record.clone();
        let share = record.lp_share;

        if share > 0.0 {
            out.lp_earn_vee_24h =
                Some(self.resolve(record.lp_earn_vee_24h, record.snapshot.volume_24h(), share));
            out.lp_earn_vee_7d =
                Some(self.resolve(record.lp_earn_vee_7d, record.snapshot.volume_7d(), share));
        } else {
            // no LP, no fee
            out.lp_earn_vee_24h = Some(keep_reported_or_zero(record.lp_earn_vee_24h));
            out.lp_earn_vee_7d = Some(keep_reported_or_zero(record.lp_earn_vee_7d));
        }

        out
    }

    pub fn estimate_all(&self, records: &[MergedRecord]) -> Vec<MergedRecord> {
        records.iter().map(|r| self.estimate(r)).collect()
    }

    fn resolve(&self, current: Option<Earn>, volume: f64, share: f64) -> Earn {
        match current {
            Some(earn) => earn,
            None => Earn::estimated(volume * self.fee_rate * share),
        }
    }
}

impl Default for FeeEstimator {
    fn default() -> Self {
        Self {
            fee_rate: DEFAULT_FEE_RATE,
        }
    }
}

fn keep_reported_or_zero(current: Option<Earn>) -> Earn {
    match current {
        Some(earn) if earn.is_reported() => earn,
        _ => Earn::estimated(0.0),
    }
}
