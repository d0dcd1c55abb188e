//! Refresh Pipeline
//!
//! One refresh cycle as a pure function of (previous working set, raw feeds):
//!
//!   base -> merge_base -> apply_wallet -> fee fallback -> APR
//!        -> attach IL + classify -> summarize
//!
//! A malformed base feed rejects the whole cycle. A malformed wallet or IL
//! feed only skips its own step; the rest of the cycle still runs.

pub mod guard;
pub mod scheduler;
pub mod store;

pub use guard::{CycleGuard, CycleTicket};
pub use scheduler::RefreshScheduler;
pub use store::{WorkingSet, WorkingSetStore};

use crate::error::FeedError;
use crate::merge::{apply_wallet, decode_base, decode_wallet, merge_base};
use crate::metrics::{attach_il, decode_il, yield_calc, FeeEstimator};
use crate::summary::summarize;
use chrono::Utc;
use serde_json::Value;
use tracing::{debug, warn};

/// Raw feed payloads for one cycle. `None` means the feed is disabled or
/// could not be retrieved this time.
#[derive(Debug, Clone)]
pub struct CycleInputs {
    pub base: Value,
    pub wallet: Option<Value>,
    pub il: Option<Value>,
}

impl CycleInputs {
    pub fn base_only(base: Value) -> Self {
        Self {
            base,
            wallet: None,
            il: None,
        }
    }
}

#[derive(Debug)]
pub struct CycleOutcome {
    pub working_set: WorkingSet,
    /// Optional feeds rejected this cycle
    pub rejected: Vec<FeedError>,
}

#[derive(Debug, Clone, Copy)]
pub struct RefreshPipeline {
    estimator: FeeEstimator,
}

impl RefreshPipeline {
    pub fn new(estimator: FeeEstimator) -> Self {
        Self { estimator }
    }

    pub fn fee_rate(&self) -> f64 {
        self.estimator.fee_rate()
    }

    /// Run one cycle. `previous` is never modified.
    pub fn run(&self, previous: &WorkingSet, inputs: CycleInputs) -> Result<CycleOutcome, FeedError> {
        let mut rejected = Vec::new();

        let base = decode_base(inputs.base)?;
        let mut records = merge_base(&base, &previous.records);
        debug!("Merged {} base pairs against {} previous records", records.len(), previous.records.len());

        if let Some(raw) = inputs.wallet {
            match decode_wallet(raw) {
                Ok(positions) => records = apply_wallet(&records, &positions),
                Err(e) => {
                    warn!("Wallet overlay skipped: {}", e);
                    rejected.push(e);
                }
            }
        }

        let records = self.estimator.estimate_all(&records);
        let records = yield_calc::derive_all(&records);

        let il_book = match inputs.il {
            Some(raw) => match decode_il(raw) {
                Ok(book) => book,
                Err(e) => {
                    warn!("IL feed rejected, keeping previous book: {}", e);
                    rejected.push(e);
                    previous.il_book.clone()
                }
            },
            None => previous.il_book.clone(),
        };
        let records = attach_il(&records, &il_book);

        let summary = summarize(&records);

        Ok(CycleOutcome {
            working_set: WorkingSet {
                generation: previous.generation + 1,
                refreshed_at: Some(Utc::now()),
                records,
                il_book,
                summary,
            },
            rejected,
        })
    }
}
