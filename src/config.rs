//! Configuration management
//!
//! Settings come from a TOML file; a handful of values can be overridden
//! from the environment (or a `.env` file) so the same config can be shared
//! between wallets:
//!
//!   FEE_RATE, POLL_INTERVAL_MS, LP_WALLET_FEED, LP_IL_FEED
//!
//! Reloaded on SIGHUP.

use crate::error::{ConfigError, FeedKind};
use crate::metrics::DEFAULT_FEE_RATE;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Top-level TOML configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    pub feeds: FeedsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Share of swap volume paid to LPs, as a fraction
    #[serde(default = "default_fee_rate")]
    pub fee_rate: f64,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Where the published state is written; not written when unset
    #[serde(default)]
    pub output_file: Option<String>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Emit logs as JSON lines
    #[serde(default)]
    pub log_json: bool,
    #[serde(default = "default_max_state_age")]
    pub max_state_age_secs: i64,
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            fee_rate: default_fee_rate(),
            poll_interval_ms: default_poll_interval(),
            output_file: None,
            log_level: default_log_level(),
            log_json: false,
            max_state_age_secs: default_max_state_age(),
            http_timeout_secs: default_http_timeout(),
        }
    }
}

fn default_fee_rate() -> f64 { DEFAULT_FEE_RATE }
fn default_poll_interval() -> u64 { 60_000 }
fn default_log_level() -> String { "info".to_string() }
fn default_max_state_age() -> i64 { 300 }
fn default_http_timeout() -> u64 { 10 }

/// Feed locations: file paths or http(s) URLs
#[derive(Debug, Clone, Deserialize)]
pub struct FeedsConfig {
    pub base: String,
    #[serde(default)]
    pub wallet: Option<String>,
    #[serde(default)]
    pub il: Option<String>,
}

impl EngineConfig {
    /// Load from a TOML file, apply environment overrides and validate
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        dotenv::dotenv().ok();

        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let mut config = Self::from_toml(&content)?;
        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;

        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse TOML configuration")?;
        Ok(config)
    }

    /// Apply overrides from `lookup` (normally the process environment).
    /// Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(v) = get("FEE_RATE") {
            self.general.fee_rate = v
                .parse()
                .map_err(|_| ConfigError::InvalidEnv { name: "FEE_RATE", value: v.clone() })?;
        }
        if let Some(v) = get("POLL_INTERVAL_MS") {
            self.general.poll_interval_ms = v
                .parse()
                .map_err(|_| ConfigError::InvalidEnv { name: "POLL_INTERVAL_MS", value: v.clone() })?;
        }
        if let Some(v) = get("LP_WALLET_FEED") {
            self.feeds.wallet = Some(v);
        }
        if let Some(v) = get("LP_IL_FEED") {
            self.feeds.il = Some(v);
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.general.fee_rate.is_finite() || self.general.fee_rate < 0.0 {
            return Err(ConfigError::InvalidFeeRate(self.general.fee_rate));
        }
        if self.general.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        if self.feeds.base.trim().is_empty() {
            return Err(ConfigError::EmptyFeedLocation(FeedKind::Base));
        }
        if matches!(&self.feeds.wallet, Some(w) if w.trim().is_empty()) {
            return Err(ConfigError::EmptyFeedLocation(FeedKind::Wallet));
        }
        if matches!(&self.feeds.il, Some(l) if l.trim().is_empty()) {
            return Err(ConfigError::EmptyFeedLocation(FeedKind::Il));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const MINIMAL: &str = r#"
[feeds]
base = "data/lp_pairs.json"
"#;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::from_toml(MINIMAL).unwrap();
        assert_eq!(config.general.fee_rate, 0.05);
        assert_eq!(config.general.poll_interval_ms, 60_000);
        assert_eq!(config.general.log_level, "info");
        assert!(!config.general.log_json);
        assert_eq!(config.general.max_state_age_secs, 300);
        assert!(config.feeds.wallet.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full() {
        let toml_str = r#"
[general]
fee_rate = 0.003
poll_interval_ms = 15000
output_file = "/tmp/lp_state.json"
log_level = "debug"

[feeds]
base = "https://api.example.com/lp/pairs"
wallet = "https://api.example.com/lp/wallet/0xabc"
il = "data/il.json"
"#;
        let config = EngineConfig::from_toml(toml_str).unwrap();
        assert_eq!(config.general.fee_rate, 0.003);
        assert_eq!(config.general.output_file.as_deref(), Some("/tmp/lp_state.json"));
        assert_eq!(config.feeds.il.as_deref(), Some("data/il.json"));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = EngineConfig::from_toml(MINIMAL).unwrap();
        config
            .apply_overrides(env(&[
                ("FEE_RATE", "0.01"),
                ("POLL_INTERVAL_MS", "5000"),
                ("LP_WALLET_FEED", "wallet.json"),
                ("LP_IL_FEED", "  "),
            ]))
            .unwrap();

        assert_eq!(config.general.fee_rate, 0.01);
        assert_eq!(config.general.poll_interval_ms, 5000);
        assert_eq!(config.feeds.wallet.as_deref(), Some("wallet.json"));
        assert!(config.feeds.il.is_none());
    }

    #[test]
    fn test_bad_env_value() {
        let mut config = EngineConfig::from_toml(MINIMAL).unwrap();
        let err = config.apply_overrides(env(&[("FEE_RATE", "five")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { name: "FEE_RATE", .. }));
    }

    #[test]
    fn test_validation() {
        let mut config = EngineConfig::from_toml(MINIMAL).unwrap();
        config.general.fee_rate = -0.1;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidFeeRate(_))));

        let mut config = EngineConfig::from_toml(MINIMAL).unwrap();
        config.general.poll_interval_ms = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroPollInterval)));

        let mut config = EngineConfig::from_toml(MINIMAL).unwrap();
        config.feeds.wallet = Some(String::new());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptyFeedLocation(FeedKind::Wallet))
        ));
    }

    #[test]
    fn test_missing_feeds_section() {
        assert!(EngineConfig::from_toml("[general]\nfee_rate = 0.05\n").is_err());
    }
}
