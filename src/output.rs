//! Published State
//!
//! JSON snapshot of the current working set, written after every successful
//! cycle so the report CLI (or any other process) can read it without
//! talking to the feeds.

use crate::pipeline::WorkingSet;
use crate::summary::PortfolioSummary;
use crate::types::MergedRecord;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Refresh counters, kept for the life of the process
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct RefreshStats {
    pub total_cycles: u64,
    pub successful_cycles: u64,
    pub failed_cycles: u64,
    /// Ticks dropped because a cycle was still running
    pub skipped_ticks: u64,
    pub start_time: Option<DateTime<Utc>>,
}

impl RefreshStats {
    pub fn started_now() -> Self {
        Self {
            start_time: Some(Utc::now()),
            ..Default::default()
        }
    }
}

/// On-disk format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishedState {
    pub last_updated: DateTime<Utc>,
    pub generation: u64,
    pub fee_rate: f64,
    pub records: Vec<MergedRecord>,
    pub summary: PortfolioSummary,
    pub stats: RefreshStats,
}

impl PublishedState {
    pub fn from_working_set(ws: &WorkingSet, fee_rate: f64, stats: RefreshStats) -> Self {
        Self {
            last_updated: ws.refreshed_at.unwrap_or_else(Utc::now),
            generation: ws.generation,
            fee_rate,
            records: ws.records.clone(),
            summary: ws.summary.clone(),
            stats,
        }
    }

    /// Write to JSON file (temp file, then rename)
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize published state")?;

        let temp_path = path.as_ref().with_extension("tmp");
        std::fs::write(&temp_path, &json)
            .with_context(|| format!("Failed to write temp file {}", temp_path.display()))?;
        std::fs::rename(&temp_path, path.as_ref()).context("Failed to rename temp file")?;

        Ok(())
    }

    pub fn read_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read state file {}", path.as_ref().display()))?;
        let state: Self = serde_json::from_str(&json).context("Failed to parse state JSON")?;
        Ok(state)
    }

    /// Older than `max_age_secs`
    pub fn is_stale(&self, max_age_secs: i64) -> bool {
        let age = Utc::now().signed_duration_since(self.last_updated);
        age.num_seconds() > max_age_secs
    }
}
