//! Error types for feed decoding and configuration
//!
//! Shape failures are typed so the pipeline can decide per feed whether to
//! drop the whole cycle (base) or just skip one step (wallet, IL).
//! Transport failures stay as `anyhow::Error` at the adapter layer.

use std::fmt;
use thiserror::Error;

/// Which upstream feed a record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedKind {
    Base,
    Wallet,
    Il,
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FeedKind::Base => write!(f, "base"),
            FeedKind::Wallet => write!(f, "wallet"),
            FeedKind::Il => write!(f, "il"),
        }
    }
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("{feed} feed is not a collection of records (got {found})")]
    NotACollection { feed: FeedKind, found: &'static str },

    #[error("{feed} feed record {index} is malformed: {source}")]
    MalformedRecord {
        feed: FeedKind,
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("{feed} feed record {index} ({pair}) has lp_share {value} outside [0, 1]")]
    ShareOutOfRange {
        feed: FeedKind,
        index: usize,
        pair: String,
        value: f64,
    },
}

impl FeedError {
    pub fn feed(&self) -> FeedKind {
        match self {
            FeedError::NotACollection { feed, .. }
            | FeedError::MalformedRecord { feed, .. }
            | FeedError::ShareOutOfRange { feed, .. } => *feed,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("fee_rate must be a finite, non-negative fraction (got {0})")]
    InvalidFeeRate(f64),

    #[error("poll_interval_ms must be greater than zero")]
    ZeroPollInterval,

    #[error("feed location for {0} is empty")]
    EmptyFeedLocation(FeedKind),

    #[error("invalid value for {name}: {value}")]
    InvalidEnv { name: &'static str, value: String },
}

/// JSON type name, for error messages
pub(crate) fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
