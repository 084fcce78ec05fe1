//! Run counters shared by concurrently completing units.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::ItemError;
use crate::types::{ItemOutcome, StatsSnapshot};

/// Lock-free aggregate of item outcomes for one run
///
/// Category counters are bumped before `completed`, so any snapshot that observes
/// a completion also observes its category.
#[derive(Debug)]
pub struct RunStats {
    total: u64,
    completed: AtomicU64,
    successful: AtomicU64,
    failed: AtomicU64,
    skipped: AtomicU64,
    rate_limited: AtomicU64,
    malformed: AtomicU64,
}

impl RunStats {
    /// Fresh counters for a run over `total` entries
    pub fn new(total: u64) -> Self {
        Self {
            total,
            completed: AtomicU64::new(0),
            successful: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            rate_limited: AtomicU64::new(0),
            malformed: AtomicU64::new(0),
        }
    }

    /// Record one outcome and return the completion count including it
    pub fn record(&self, outcome: &ItemOutcome) -> u64 {
        match outcome {
            ItemOutcome::Saved => {
                self.successful.fetch_add(1, Ordering::Relaxed);
            }
            ItemOutcome::Skipped => {
                self.skipped.fetch_add(1, Ordering::Relaxed);
                self.successful.fetch_add(1, Ordering::Relaxed);
            }
            ItemOutcome::Failed(err) => {
                match err {
                    ItemError::RateLimited => {
                        self.rate_limited.fetch_add(1, Ordering::Relaxed);
                    }
                    ItemError::Malformed { .. } => {
                        self.malformed.fetch_add(1, Ordering::Relaxed);
                    }
                    ItemError::Transport { .. } | ItemError::Persistence { .. } => {}
                }
                self.failed.fetch_add(1, Ordering::Relaxed);
            }
        }
        self.completed.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Entries in the run
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Point-in-time copy of the counters
    pub fn snapshot(&self) -> StatsSnapshot {
        let completed = self.completed.load(Ordering::Acquire);
        StatsSnapshot {
            total: self.total,
            completed,
            successful: self.successful.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            rate_limited: self.rate_limited.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
        }
    }
}
