//! Refresh Scheduler
//!
//! Drives the pipeline on a fixed interval. Each tick fetches the feeds
//! concurrently, merges against the current working set, swaps the result
//! into the store and publishes it to the state file.
//!
//! Ticks never overlap: if the previous cycle is still running the tick is
//! counted as skipped and dropped.

use super::{CycleGuard, CycleInputs, RefreshPipeline, WorkingSet, WorkingSetStore};
use crate::error::FeedKind;
use crate::feeds::FeedSet;
use crate::output::{PublishedState, RefreshStats};
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Log the summary line every N successful cycles
const SUMMARY_EVERY: u64 = 10;

#[derive(Clone)]
pub struct RefreshScheduler {
    store: Arc<WorkingSetStore>,
    feeds: Arc<FeedSet>,
    pipeline: RefreshPipeline,
    guard: CycleGuard,
    stats: Arc<Mutex<RefreshStats>>,
    output_file: Option<PathBuf>,
}

impl RefreshScheduler {
    pub fn new(store: Arc<WorkingSetStore>, feeds: FeedSet, pipeline: RefreshPipeline) -> Self {
        Self {
            store,
            feeds: Arc::new(feeds),
            pipeline,
            guard: CycleGuard::new(),
            stats: Arc::new(Mutex::new(RefreshStats::started_now())),
            output_file: None,
        }
    }

    /// Use a guard shared with earlier schedulers over the same store
    pub fn with_guard(mut self, guard: CycleGuard) -> Self {
        self.guard = guard;
        self
    }

    pub fn with_output_file(mut self, path: PathBuf) -> Self {
        self.output_file = Some(path);
        self
    }

    pub fn store(&self) -> Arc<WorkingSetStore> {
        Arc::clone(&self.store)
    }

    pub async fn stats(&self) -> RefreshStats {
        self.stats.lock().await.clone()
    }

    /// Run one cycle unless another is in flight.
    /// Returns `Ok(false)` when the tick was skipped.
    pub async fn tick(&self) -> Result<bool> {
        match self.guard.try_begin() {
            Some(_ticket) => {
                self.run_cycle().await?;
                Ok(true)
            }
            None => {
                self.stats.lock().await.skipped_ticks += 1;
                warn!("Refresh still in progress, skipping tick");
                Ok(false)
            }
        }
    }

    /// Fetch, merge, publish, replace. Callers must hold the cycle guard.
    async fn run_cycle(&self) -> Result<()> {
        self.stats.lock().await.total_cycles += 1;

        let ws = match self.fetch_and_merge().await {
            Ok(ws) => ws,
            Err(e) => {
                self.stats.lock().await.failed_cycles += 1;
                error!("Refresh cycle failed, keeping previous working set: {:#}", e);
                return Err(e);
            }
        };

        // Counted before publishing so the state file includes this cycle
        let stats = {
            let mut stats = self.stats.lock().await;
            stats.successful_cycles += 1;
            stats.clone()
        };

        if let Some(path) = &self.output_file {
            let published = PublishedState::from_working_set(&ws, self.pipeline.fee_rate(), stats);
            if let Err(e) = published.write_to_file(path) {
                error!("Failed to write state file: {:#}", e);
            }
        }

        if ws.generation % SUMMARY_EVERY == 1 {
            info!("{}", ws.summary.summary_line());
        }

        self.store.replace(ws).await;
        Ok(())
    }

    async fn fetch_and_merge(&self) -> Result<WorkingSet> {
        let (base, wallet, il) = tokio::join!(
            self.feeds.base.fetch(),
            self.feeds.fetch_optional(FeedKind::Wallet),
            self.feeds.fetch_optional(FeedKind::Il),
        );

        let base = base.with_context(|| format!("base feed {} unavailable", self.feeds.base.describe()))?;
        let inputs = CycleInputs {
            base,
            wallet: optional(FeedKind::Wallet, wallet),
            il: optional(FeedKind::Il, il),
        };

        let previous = self.store.snapshot().await;
        let outcome = self.pipeline.run(&previous, inputs)?;
        debug!(
            "Cycle {} merged {} records ({} optional feeds rejected)",
            outcome.working_set.generation,
            outcome.working_set.records.len(),
            outcome.rejected.len()
        );

        Ok(outcome.working_set)
    }

    /// Tick until `reload` is raised. Returns `Ok(true)` to request a restart
    /// with fresh configuration.
    pub async fn run(&self, poll_interval: Duration, reload: &AtomicBool) -> Result<bool> {
        let mut interval = tokio::time::interval(poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;

            if reload.swap(false, Ordering::SeqCst) {
                info!("Config reload requested - restarting scheduler...");
                return Ok(true);
            }

            match self.guard.try_begin() {
                Some(ticket) => {
                    let this = self.clone();
                    tokio::spawn(async move {
                        let _ticket = ticket;
                        // errors are logged and counted in run_cycle
                        let _ = this.run_cycle().await;
                    });
                }
                None => {
                    let skipped = {
                        let mut stats = self.stats.lock().await;
                        stats.skipped_ticks += 1;
                        stats.skipped_ticks
                    };
                    warn!("Refresh still in progress, skipping tick ({} skipped so far)", skipped);
                }
            }
        }
    }
}

/// Transport failure on an optional feed degrades to "not available"
fn optional(kind: FeedKind, fetched: Option<Result<Value>>) -> Option<Value> {
    match fetched? {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("{} feed unavailable this cycle: {:#}", kind, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feeds::testing::StaticFeed;
    use crate::metrics::FeeEstimator;
    use serde_json::json;

    fn base_doc(volume_7d: f64) -> Value {
        json!([{
            "pair_address": "0xAAA",
            "item_name": "Iron Sword",
            "price_vee": 2.0,
            "reserve_vee": 1000,
            "reserve_item": 500,
            "volume_7d_vee": volume_7d,
            "ts": "2026-01-01T12:00:00Z"
        }])
    }

    fn wallet_doc() -> Value {
        json!([{"pair_address": "0xAAA", "lp_share": 0.1, "user_vee": 200}])
    }

    fn scheduler(feeds: FeedSet) -> RefreshScheduler {
        let pipeline = RefreshPipeline::new(FeeEstimator::new(0.05).unwrap());
        RefreshScheduler::new(Arc::new(WorkingSetStore::new()), feeds, pipeline)
    }

    #[tokio::test]
    async fn test_tick_publishes_working_set() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("state.json");
        let feeds = FeedSet::new(Arc::new(StaticFeed::new(base_doc(5000.0))))
            .with_wallet(Arc::new(StaticFeed::new(wallet_doc())));
        let sched = scheduler(feeds).with_output_file(out.clone());

        assert!(sched.tick().await.unwrap());

        let ws = sched.store().snapshot().await;
        assert_eq!(ws.generation, 1);
        assert!((ws.records[0].lp_apr.unwrap() - 651.7857142857).abs() < 1e-6);

        let published = PublishedState::read_from_file(&out).unwrap();
        assert_eq!(published.generation, 1);
        assert_eq!(published.fee_rate, 0.05);
        assert_eq!(published.stats.total_cycles, 1);
        assert_eq!(published.stats.successful_cycles, 1);

        let stats = sched.stats().await;
        assert_eq!(stats.total_cycles, 1);
        assert_eq!(stats.successful_cycles, 1);
    }

    #[tokio::test]
    async fn test_published_stats_include_current_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("state.json");
        let base = Arc::new(StaticFeed::new(base_doc(5000.0)));
        let sched = scheduler(FeedSet::new(base.clone())).with_output_file(out.clone());

        sched.tick().await.unwrap();
        sched.tick().await.unwrap();
        let published = PublishedState::read_from_file(&out).unwrap();
        assert_eq!(published.generation, 2);
        assert_eq!(published.stats.total_cycles, 2);
        assert_eq!(published.stats.successful_cycles, 2);
        assert_eq!(published.stats.failed_cycles, 0);

        // a failed cycle publishes nothing
        base.set(json!({"error": "maintenance"}));
        assert!(sched.tick().await.is_err());
        let published = PublishedState::read_from_file(&out).unwrap();
        assert_eq!(published.generation, 2);
        assert_eq!(published.stats.successful_cycles, 2);
    }

    #[tokio::test]
    async fn test_base_failure_keeps_previous_set() {
        let base = Arc::new(StaticFeed::new(base_doc(5000.0)));
        let sched = scheduler(FeedSet::new(base.clone()));
        sched.tick().await.unwrap();

        base.set(json!({"error": "maintenance"}));
        assert!(sched.tick().await.is_err());

        let ws = sched.store().snapshot().await;
        assert_eq!(ws.generation, 1);
        let stats = sched.stats().await;
        assert_eq!(stats.failed_cycles, 1);
        assert_eq!(stats.successful_cycles, 1);
    }

    #[tokio::test]
    async fn test_wallet_outage_keeps_position() {
        let wallet = Arc::new(StaticFeed::new(wallet_doc()));
        let feeds = FeedSet::new(Arc::new(StaticFeed::new(base_doc(5000.0)))).with_wallet(wallet.clone());
        let sched = scheduler(feeds);
        sched.tick().await.unwrap();

        let unreachable = FeedSet::new(Arc::new(StaticFeed::new(base_doc(5000.0))))
            .with_wallet(Arc::new(StaticFeed::failing()));
        let sched = RefreshScheduler {
            feeds: Arc::new(unreachable),
            ..sched
        };
        sched.tick().await.unwrap();

        let ws = sched.store().snapshot().await;
        assert_eq!(ws.generation, 2);
        assert_eq!(ws.records[0].lp_share, 0.1);
        assert_eq!(ws.records[0].user_vee, 200.0);
    }

    #[tokio::test]
    async fn test_overlapping_tick_is_skipped() {
        let slow = Arc::new(StaticFeed::new(base_doc(5000.0)).with_delay(Duration::from_millis(200)));
        let sched = scheduler(FeedSet::new(slow.clone()));

        let first = {
            let s = sched.clone();
            tokio::spawn(async move { s.tick().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(!sched.tick().await.unwrap());
        assert!(first.await.unwrap().unwrap());

        let stats = sched.stats().await;
        assert_eq!(stats.skipped_ticks, 1);
        assert_eq!(stats.total_cycles, 1);
        assert_eq!(slow.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_run_returns_on_reload() {
        let sched = scheduler(FeedSet::new(Arc::new(StaticFeed::new(base_doc(5000.0)))));
        let reload = AtomicBool::new(true);
        let restart = sched.run(Duration::from_millis(10), &reload).await.unwrap();
        assert!(restart);
        assert!(!reload.load(Ordering::SeqCst));
    }
}
