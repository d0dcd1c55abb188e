//! Type-aware value ordering
//!
//! Numbers compare numerically, everything else as text. Missing values sort
//! after every present value regardless of direction.

use crate::types::MergedRecord;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    fn apply(self, ord: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(format!("unknown sort direction: {}", other)),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "asc"),
            SortDirection::Desc => write!(f, "desc"),
        }
    }
}

/// A field value pulled out of a record for sorting
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Number(f64),
    Text(String),
    Missing,
}

impl SortValue {
    fn number(v: f64) -> Self {
        if v.is_finite() {
            SortValue::Number(v)
        } else {
            SortValue::Missing
        }
    }

    fn opt_number(v: Option<f64>) -> Self {
        v.map(Self::number).unwrap_or(SortValue::Missing)
    }

    fn opt_text(v: Option<&str>) -> Self {
        v.map(|s| SortValue::Text(s.to_string())).unwrap_or(SortValue::Missing)
    }

    fn as_text(&self) -> String {
        match self {
            SortValue::Number(n) => n.to_string(),
            SortValue::Text(s) => s.clone(),
            SortValue::Missing => String::new(),
        }
    }
}

/// Compare two values under `direction`. Missing always goes last.
pub fn compare_values(a: &SortValue, b: &SortValue, direction: SortDirection) -> Ordering {
    match (a, b) {
        (SortValue::Missing, SortValue::Missing) => Ordering::Equal,
        (SortValue::Missing, _) => Ordering::Greater,
        (_, SortValue::Missing) => Ordering::Less,
        (SortValue::Number(x), SortValue::Number(y)) => {
            direction.apply(x.partial_cmp(y).unwrap_or(Ordering::Equal))
        }
        _ => direction.apply(compare_text(&a.as_text(), &b.as_text())),
    }
}

/// Case-folded comparison, raw text as tie-break so the order is total
pub fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Look up a sortable field by its published name.
/// Unknown keys yield `Missing`, which leaves the order untouched.
pub fn field_value(record: &MergedRecord, key: &str) -> SortValue {
    let snap = &record.snapshot;
    let il = record.il.as_ref();

    match key {
        "pair_address" => SortValue::Text(snap.pair_address.to_string()),
        "item_name" => SortValue::opt_text(snap.item_name.as_deref()),
        "price_vee" => SortValue::number(snap.price_vee),
        "price_24h_ago" => SortValue::opt_number(snap.price_24h_ago),
        "price_7d_ago" => SortValue::opt_number(snap.price_7d_ago),
        "price_change_24h_pct" => SortValue::opt_number(snap.price_change_24h_pct),
        "price_change_7d_pct" => SortValue::opt_number(snap.price_change_7d_pct),
        "reserve_vee" => SortValue::number(snap.reserve_vee),
        "reserve_item" => SortValue::number(snap.reserve_item),
        "volume_24h_vee" => SortValue::opt_number(snap.volume_24h_vee),
        "volume_7d_vee" => SortValue::opt_number(snap.volume_7d_vee),
        "volume_24h_prev_vee" => SortValue::opt_number(snap.volume_24h_prev_vee),
        "volume_7d_prev_vee" => SortValue::opt_number(snap.volume_7d_prev_vee),
        "volume_change_24h_pct" => SortValue::opt_number(snap.volume_change_24h_pct),
        "volume_change_7d_pct" => SortValue::opt_number(snap.volume_change_7d_pct),
        "ts" => SortValue::Number(snap.ts.timestamp_millis() as f64),
        "lp_balance" => SortValue::number(record.lp_balance),
        "lp_share" => SortValue::number(record.lp_share),
        "user_item" => SortValue::number(record.user_item),
        "user_vee" => SortValue::number(record.user_vee),
        "lp_earn_vee_24h" => SortValue::opt_number(record.lp_earn_vee_24h.map(|e| e.value)),
        "lp_earn_vee_7d" => SortValue::opt_number(record.lp_earn_vee_7d.map(|e| e.value)),
        "lp_apr" => SortValue::opt_number(record.lp_apr),
        "band" => SortValue::Text(record.band.label().to_string()),
        "value_lp_vee" => SortValue::opt_number(il.and_then(|m| m.value_lp_vee)),
        "value_lp_usd" => SortValue::opt_number(il.and_then(|m| m.value_lp_usd)),
        "il_vee" => SortValue::opt_number(il.and_then(|m| m.il_vee)),
        "il_pct" => SortValue::opt_number(il.and_then(|m| m.il_pct)),
        "il_annualized_pct" => SortValue::opt_number(il.and_then(|m| m.il_annualized_pct)),
        "net_effective_pct" => SortValue::opt_number(il.and_then(|m| m.net_effective_pct)),
        "target_weight" => SortValue::opt_number(il.and_then(|m| m.target_weight)),
        "days_in_position" => SortValue::opt_number(il.and_then(|m| m.days_in_position)),
        _ => SortValue::Missing,
    }
}
