// Core data structures shared by the merge, metrics and ranking layers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};

/// On-chain pair address.
///
/// Equality and hashing ignore ASCII case, so `0xAAA` and `0xaaa` address the
/// same pool everywhere a merge, lookup or join happens. The original spelling
/// is kept for display.
#[derive(Debug, Clone)]
pub struct PairAddress {
    raw: String,
    key: String,
}

impl PairAddress {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let key = raw.trim().to_ascii_lowercase();
        Self { raw, key }
    }

    /// Address as received from the feed
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Lowercased lookup key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Shortened form for tables: `0x1234...abcd`
    pub fn short(&self) -> String {
        let s = self.raw.as_str();
        if s.chars().count() <= 10 {
            return s.to_string();
        }
        let head: String = s.chars().take(6).collect();
        let tail: String = s.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
        format!("{}...{}", head, tail)
    }
}

impl PartialEq for PairAddress {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for PairAddress {}

impl Hash for PairAddress {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Display for PairAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl From<&str> for PairAddress {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl Serialize for PairAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for PairAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::new(raw))
    }
}

/// Latest market state of one pair, as produced by the collector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairSnapshot {
    pub pair_address: PairAddress,
    #[serde(default)]
    pub item_name: Option<String>,
    #[serde(default)]
    pub item_address: Option<String>,
    #[serde(default)]
    pub vee_address: Option<String>,

    pub price_vee: f64,
    #[serde(default)]
    pub price_24h_ago: Option<f64>,
    #[serde(default)]
    pub price_7d_ago: Option<f64>,
    #[serde(default)]
    pub price_change_24h_pct: Option<f64>,
    #[serde(default)]
    pub price_change_7d_pct: Option<f64>,

    #[serde(default)]
    pub reserve_vee: f64,
    #[serde(default)]
    pub reserve_item: f64,

    /// Realized volume from indexed trades
    #[serde(default)]
    pub volume_24h_vee: Option<f64>,
    #[serde(default)]
    pub volume_7d_vee: Option<f64>,
    /// Estimated volume (reserve deltas) when trades are not indexed yet
    #[serde(default)]
    pub volume_24h_est: Option<f64>,
    #[serde(default)]
    pub volume_7d_est: Option<f64>,
    #[serde(default)]
    pub volume_24h_prev_vee: Option<f64>,
    #[serde(default)]
    pub volume_7d_prev_vee: Option<f64>,
    #[serde(default)]
    pub volume_change_24h_pct: Option<f64>,
    #[serde(default)]
    pub volume_change_7d_pct: Option<f64>,
    #[serde(default)]
    pub volume_24h_trades: Option<u64>,
    #[serde(default)]
    pub volume_7d_trades: Option<u64>,

    pub ts: DateTime<Utc>,
}

impl PairSnapshot {
    /// Best available 24h volume: realized, then estimated, then zero
    pub fn volume_24h(&self) -> f64 {
        self.volume_24h_vee.or(self.volume_24h_est).unwrap_or(0.0)
    }

    /// Best available 7d volume: realized, then estimated, then zero
    pub fn volume_7d(&self) -> f64 {
        self.volume_7d_vee.or(self.volume_7d_est).unwrap_or(0.0)
    }
}

/// Wallet-scoped LP position for one pair. Every field may be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LpPosition {
    pub pair_address: PairAddress,
    #[serde(default)]
    pub lp_balance: Option<f64>,
    #[serde(default)]
    pub lp_share: Option<f64>,
    #[serde(default)]
    pub user_item: Option<f64>,
    #[serde(default)]
    pub user_vee: Option<f64>,
    #[serde(default)]
    pub lp_earn_vee_24h: Option<f64>,
    #[serde(default)]
    pub lp_earn_vee_7d: Option<f64>,
}

/// Where a fee-earn figure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EarnSource {
    /// Provided by the fee-accounting pipeline (zero included)
    Reported,
    /// Synthesized from volume and the configured fee rate
    Estimated,
}

/// Fee income over one window, tagged with its provenance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Earn {
    pub value: f64,
    pub source: EarnSource,
}

impl Earn {
    pub fn reported(value: f64) -> Self {
        Self { value, source: EarnSource::Reported }
    }

    pub fn estimated(value: f64) -> Self {
        Self { value, source: EarnSource::Estimated }
    }

    pub fn is_reported(&self) -> bool {
        self.source == EarnSource::Reported
    }
}

/// Impermanent-loss analytics for one pair, computed upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IlMetrics {
    pub pair_address: PairAddress,
    #[serde(default)]
    pub item_name: Option<String>,
    #[serde(default)]
    pub value_lp_vee: Option<f64>,
    #[serde(default)]
    pub value_lp_usd: Option<f64>,
    #[serde(default)]
    pub value_hodl_vee: Option<f64>,
    #[serde(default)]
    pub value_hodl_usd: Option<f64>,
    #[serde(default)]
    pub il_vee: Option<f64>,
    #[serde(default)]
    pub il_usd: Option<f64>,
    #[serde(default)]
    pub il_pct: Option<f64>,
    #[serde(default)]
    pub il_annualized_pct: Option<f64>,
    /// Fee-only APR as seen by the analytics service
    #[serde(default)]
    pub lp_apr: Option<f64>,
    #[serde(default)]
    pub net_effective_pct: Option<f64>,
    #[serde(default)]
    pub target_weight: Option<f64>,
    #[serde(default)]
    pub days_in_position: Option<f64>,
    #[serde(default)]
    pub entry_ts: Option<String>,
    #[serde(default)]
    pub current_ts: Option<String>,
}

/// Recommendation band derived from net effective return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PositionBand {
    #[default]
    NotAvailable,
    Exit,
    Watch,
    Ok,
    Strong,
}

impl PositionBand {
    pub fn label(&self) -> &'static str {
        match self {
            PositionBand::NotAvailable => "N/A",
            PositionBand::Exit => "EXIT",
            PositionBand::Watch => "Watch / weak",
            PositionBand::Ok => "OK / small",
            PositionBand::Strong => "Strong / overweight",
        }
    }
}

impl fmt::Display for PositionBand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Latest snapshot joined with the latest known LP position plus derived metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedRecord {
    #[serde(flatten)]
    pub snapshot: PairSnapshot,

    pub lp_balance: f64,
    pub lp_share: f64,
    pub user_item: f64,
    pub user_vee: f64,
    pub lp_earn_vee_24h: Option<Earn>,
    pub lp_earn_vee_7d: Option<Earn>,

    /// Fee-only APR in percent; `None` when undefined
    pub lp_apr: Option<f64>,

    #[serde(default)]
    pub il: Option<IlMetrics>,
    #[serde(default)]
    pub band: PositionBand,
}

impl MergedRecord {
    /// Record for a pair with no position ever observed
    pub fn from_snapshot(snapshot: PairSnapshot) -> Self {
        Self {
            snapshot,
            lp_balance: 0.0,
            lp_share: 0.0,
            user_item: 0.0,
            user_vee: 0.0,
            lp_earn_vee_24h: None,
            lp_earn_vee_7d: None,
            lp_apr: None,
            il: None,
            band: PositionBand::NotAvailable,
        }
    }

    pub fn pair_address(&self) -> &PairAddress {
        &self.snapshot.pair_address
    }

    pub fn display_name(&self) -> &str {
        self.snapshot.item_name.as_deref().unwrap_or("")
    }

    pub fn has_position(&self) -> bool {
        self.lp_share > 0.0
    }

    pub fn earn_24h(&self) -> f64 {
        self.lp_earn_vee_24h.map(|e| e.value).unwrap_or(0.0)
    }

    pub fn earn_7d(&self) -> f64 {
        self.lp_earn_vee_7d.map(|e| e.value).unwrap_or(0.0)
    }

    pub fn net_effective_pct(&self) -> Option<f64> {
        self.il.as_ref().and_then(|il| il.net_effective_pct)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_address_case_insensitive() {
        let a = PairAddress::new("0xAAA");
        let b = PairAddress::new("0xaaa");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "0xAAA");

        let mut set = std::collections::HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_pair_address_short() {
        let a = PairAddress::new("0x2aEb84d9b061C850B1F3C8C5200BaE14270D49f0");
        assert_eq!(a.short(), "0x2aEb...49f0");
        assert_eq!(PairAddress::new("0xabc").short(), "0xabc");
    }

    #[test]
    fn test_volume_prefers_realized() {
        let mut snap = fixtures::snapshot("0x1", "Sword");
        assert_eq!(snap.volume_7d(), 0.0);
        snap.volume_7d_est = Some(40.0);
        assert_eq!(snap.volume_7d(), 40.0);
        snap.volume_7d_vee = Some(50.0);
        assert_eq!(snap.volume_7d(), 50.0);
    }

    #[test]
    fn test_band_labels() {
        assert_eq!(PositionBand::NotAvailable.to_string(), "N/A");
        assert_eq!(PositionBand::Watch.to_string(), "Watch / weak");
    }
}
