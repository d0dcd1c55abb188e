//! LP Position Engine
//!
//! Reconciles liquidity-pool feeds (pair snapshots, wallet positions,
//! impermanent-loss analytics) into one working set per refresh cycle,
//! fills in fee income where it has not been reported yet, and derives
//! APR, recommendation bands and portfolio totals.

pub mod config;
pub mod error;
pub mod feeds;
pub mod merge;
pub mod metrics;
pub mod output;
pub mod pipeline;
pub mod ranking;
pub mod summary;
pub mod types;

// Re-export commonly used types
pub use config::EngineConfig;
pub use error::{ConfigError, FeedError, FeedKind};
pub use feeds::{feed_from_location, FeedSet, FeedSource};
pub use metrics::{FeeEstimator, IlBook};
pub use output::{PublishedState, RefreshStats};
pub use pipeline::{CycleInputs, RefreshPipeline, RefreshScheduler, WorkingSet, WorkingSetStore};
pub use summary::{summarize, PortfolioSummary};
pub use types::{Earn, EarnSource, IlMetrics, LpPosition, MergedRecord, PairAddress, PairSnapshot, PositionBand};
