//! Single-flight guard for refresh cycles
//!
//! A tick that arrives while a cycle is still running is skipped rather than
//! queued, so two merges never race against the same previous working set.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct CycleGuard {
    in_flight: Arc<AtomicBool>,
}

/// Held for the duration of one cycle; releases the guard on drop
#[derive(Debug)]
pub struct CycleTicket {
    in_flight: Arc<AtomicBool>,
}

impl CycleGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the guard, or `None` if a cycle is already running
    pub fn try_begin(&self) -> Option<CycleTicket> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| CycleTicket {
                in_flight: Arc::clone(&self.in_flight),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

impl Drop for CycleTicket {
    fn drop(&mut self) {
        self.in_flight.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_cycle_is_refused() {
        let guard = CycleGuard::new();
        let ticket = guard.try_begin();
        assert!(ticket.is_some());
        assert!(guard.is_busy());
        assert!(guard.try_begin().is_none());

        drop(ticket);
        assert!(!guard.is_busy());
        assert!(guard.try_begin().is_some());
    }

    #[tokio::test]
    async fn test_ticket_moves_into_task() {
        let guard = CycleGuard::new();
        let ticket = guard.try_begin().unwrap();

        let handle = tokio::spawn(async move {
            let _ticket = ticket;
            tokio::task::yield_now().await;
        });
        handle.await.unwrap();

        assert!(!guard.is_busy());
    }
}
