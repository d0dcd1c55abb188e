//! Working set store
//!
//! The current merged state lives behind an `Arc` that is swapped whole on
//! every successful refresh. Readers get an immutable snapshot and never see
//! a half-merged record.

use crate::metrics::IlBook;
use crate::summary::PortfolioSummary;
use crate::types::MergedRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Result of one refresh cycle; read-only once published
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkingSet {
    /// Incremented on every replacement; 0 before the first cycle
    pub generation: u64,
    pub refreshed_at: Option<DateTime<Utc>>,
    pub records: Vec<MergedRecord>,
    /// Last accepted IL feed, reused when the next one is unavailable
    pub il_book: IlBook,
    pub summary: PortfolioSummary,
}

impl WorkingSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct WorkingSetStore {
    current: RwLock<Arc<WorkingSet>>,
}

impl WorkingSetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current working set
    pub async fn snapshot(&self) -> Arc<WorkingSet> {
        Arc::clone(&*self.current.read().await)
    }

    /// Replace the working set as a whole
    pub async fn replace(&self, next: WorkingSet) {
        let next = Arc::new(next);
        let mut guard = self.current.write().await;
        debug!(
            "Working set generation {} -> {} ({} records)",
            guard.generation,
            next.generation,
            next.records.len()
        );
        *guard = next;
    }
}
