//! Concurrency coordinator: drives every entry through skip-check, fetch and
//! persist exactly once under the run's [`ConcurrencyPolicy`].
//!
//! Split into focused submodules:
//! - `stats` - Atomic run counters
//! - `progress` - Completion-driven progress events and logs
//! - `unit` - The per-item unit of work
//! - `bounded` - Bounded-parallel strategy (admission limiter)
//! - `sequential` - Sequential strategy with a fixed delay

mod bounded;
mod progress;
mod sequential;
mod stats;
mod unit;


pub use stats::RunStats;

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::client::QuestionFetcher;
use crate::config::{ConcurrencyPolicy, ProgressConfig};
use crate::store::ResultStore;
use crate::types::{Event, RunSummary, WorkEntry};

use progress::ProgressReporter;
use unit::UnitContext;

/// Schedules fetch+persist work for one output folder
#[derive(Clone)]
pub struct Coordinator {
    fetcher: Arc<dyn QuestionFetcher>,
    store: ResultStore,
    progress: ProgressConfig,
    event_tx: broadcast::Sender<Event>,
    cancel_token: CancellationToken,
}

impl Coordinator {
    /// Create a coordinator writing into `store`
    pub fn new(
        fetcher: Arc<dyn QuestionFetcher>,
        store: ResultStore,
        progress: ProgressConfig,
        event_tx: broadcast::Sender<Event>,
    ) -> Self {
        Self {
            fetcher,
            store,
            progress,
            event_tx,
            cancel_token: CancellationToken::new(),
        }
    }

    /// Use an externally owned cancellation token (e.g. wired to Ctrl+C)
    #[must_use]
    pub fn with_cancellation(mut self, cancel_token: CancellationToken) -> Self {
        self.cancel_token = cancel_token;
        self
    }

    /// Token that stops admission of new work when cancelled
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel_token
    }

    /// Process every entry once and return the final summary
    ///
    /// Per-item failures never abort the run. With zero entries the run completes
    /// immediately.
    pub async fn run(&self, entries: Vec<WorkEntry>, policy: ConcurrencyPolicy) -> RunSummary {
        let total = entries.len() as u64;
        let started_at = Utc::now();
        let start = Instant::now();

        tracing::info!(
            total,
            policy = %policy,
            output_dir = %self.store.root().display(),
            "Processing questions"
        );
        self.event_tx
            .send(Event::RunStarted {
                total,
                output_dir: self.store.root().to_path_buf(),
            })
            .ok();

        let (report_every, log_every) = match policy {
            ConcurrencyPolicy::Bounded { .. } => (
                self.progress.batch_size.min(total),
                self.progress.log_every,
            ),
            // Every item is worth a line when they arrive seconds apart
            ConcurrencyPolicy::Sequential { .. } => (self.progress.sequential_every, 1),
        };

        let ctx = Arc::new(UnitContext {
            fetcher: Arc::clone(&self.fetcher),
            store: self.store.clone(),
            stats: RunStats::new(total),
            reporter: ProgressReporter::new(total, report_every, log_every, self.event_tx.clone()),
        });

        let cancelled = if entries.is_empty() {
            false
        } else {
            match policy {
                ConcurrencyPolicy::Bounded { max_in_flight } => {
                    bounded::run_bounded(Arc::clone(&ctx), entries, max_in_flight, &self.cancel_token)
                        .await
                }
                ConcurrencyPolicy::Sequential { delay } => {
                    sequential::run_sequential(&ctx, entries, delay, &self.cancel_token).await
                }
            }
        };

        let summary = RunSummary {
            stats: ctx.stats.snapshot(),
            elapsed: start.elapsed(),
            started_at,
            policy,
            output_dir: self.store.root().to_path_buf(),
            cancelled,
        };

        tracing::info!(
            total = summary.stats.total,
            successful = summary.stats.successful,
            failed = summary.stats.failed,
            skipped = summary.stats.skipped,
            elapsed_secs = summary.elapsed.as_secs_f64(),
            cancelled,
            "Processing finished"
        );
        self.event_tx
            .send(Event::RunFinished {
                summary: summary.clone(),
            })
            .ok();

        summary
    }
}
