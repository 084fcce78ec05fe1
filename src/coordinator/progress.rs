//! Completion-driven progress reporting.
//!
//! Reports are produced by the unit that completes an item, so a slow fetch or a
//! sequential delay can never hold back a report for work that already finished.
//!
//! Concurrent units may deliver `ItemCompleted` events out of completion order.
//! `Progress` counts never go backwards: a report older than one already sent is
//! dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use tokio::sync::broadcast;

use crate::types::{Event, ItemOutcome, StatsSnapshot, rate_per_second};

/// Emits `ItemCompleted` and `Progress` events and the matching log lines
pub(crate) struct ProgressReporter {
    total: u64,
    /// Emit a `Progress` event every N completions (and on the last one)
    report_every: u64,
    /// Log an item message at info level every N completions
    log_every: u64,
    started: Instant,
    /// Highest `completed` count reported so far
    last_reported: AtomicU64,
    event_tx: broadcast::Sender<Event>,
}

impl ProgressReporter {
    pub(crate) fn new(
        total: u64,
        report_every: u64,
        log_every: u64,
        event_tx: broadcast::Sender<Event>,
    ) -> Self {
        Self {
            total,
            report_every: report_every.max(1),
            log_every: log_every.max(1),
            started: Instant::now(),
            last_reported: AtomicU64::new(0),
            event_tx,
        }
    }

    /// Handle the `completed`-th completion
    pub(crate) fn on_item(&self, completed: u64, local_id: Option<&str>, outcome: &ItemOutcome) {
        let error = match outcome {
            ItemOutcome::Failed(err) => Some(err.to_string()),
            ItemOutcome::Saved | ItemOutcome::Skipped => None,
        };

        if completed % self.log_every == 0 {
            tracing::info!(
                local_id = local_id.unwrap_or("-"),
                outcome = outcome.label(),
                error = error.as_deref().unwrap_or(""),
                completed,
                total = self.total,
                "Item completed"
            );
        }

        self.event_tx
            .send(Event::ItemCompleted {
                local_id: local_id.map(str::to_string),
                outcome: outcome.label().to_string(),
                error,
            })
            .ok();

        if completed % self.report_every == 0 || completed == self.total {
            self.report(completed);
        }
    }

    /// Emit a progress report for `completed` items, unless a later count was already reported
    pub(crate) fn report(&self, completed: u64) {
        if self.last_reported.fetch_max(completed, Ordering::AcqRel) >= completed {
            return;
        }

        let snapshot = StatsSnapshot {
            total: self.total,
            completed,
            ..Default::default()
        };
        let percent = snapshot.percent_complete();
        let rate = rate_per_second(completed, self.started.elapsed());

        tracing::info!(
            completed,
            total = self.total,
            percent = %format!("{percent:.1}%"),
            rate = %format!("{rate:.1} req/s"),
            "Progress"
        );

        self.event_tx
            .send(Event::Progress {
                completed,
                total: self.total,
                percent,
                rate,
            })
            .ok();
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn progress_points(events: &[Event]) -> Vec<u64> {
        events
            .iter()
            .filter_map(|e| match e {
                Event::Progress { completed, .. } => Some(*completed),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn reports_at_boundaries_and_on_last_item() {
        let (tx, mut rx) = broadcast::channel(256);
        let reporter = ProgressReporter::new(7, 3, 50, tx);

        for completed in 1..=7 {
            reporter.on_item(completed, Some("q"), &ItemOutcome::Saved);
        }

        let events = drain(&mut rx);
        assert_eq!(progress_points(&events), vec![3, 6, 7]);
        let completions = events
            .iter()
            .filter(|e| matches!(e, Event::ItemCompleted { .. }))
            .count();
        assert_eq!(completions, 7);
    }

    #[test]
    fn progress_event_carries_percentage() {
        let (tx, mut rx) = broadcast::channel(16);
        let reporter = ProgressReporter::new(4, 2, 1, tx);
        reporter.on_item(2, None, &ItemOutcome::Skipped);

        let events = drain(&mut rx);
        match events.last() {
            Some(Event::Progress {
                completed,
                total,
                percent,
                ..
            }) => {
                assert_eq!((*completed, *total), (2, 4));
                assert!((percent - 50.0).abs() < 1e-9);
            }
            other => panic!("expected progress event, got {other:?}"),
        }
    }

    #[test]
    fn late_report_for_lower_count_is_dropped() {
        let (tx, mut rx) = broadcast::channel(16);
        let reporter = ProgressReporter::new(6, 2, 50, tx);

        // Unit completing 4th sends before the unit completing 2nd
        reporter.on_item(4, Some("q4"), &ItemOutcome::Saved);
        reporter.on_item(2, Some("q2"), &ItemOutcome::Saved);
        reporter.on_item(6, Some("q6"), &ItemOutcome::Saved);

        let events = drain(&mut rx);
        assert_eq!(progress_points(&events), vec![4, 6]);
        let completions = events
            .iter()
            .filter(|e| matches!(e, Event::ItemCompleted { .. }))
            .count();
        assert_eq!(completions, 3);
    }

    #[test]
    fn zero_intervals_are_clamped() {
        let (tx, mut rx) = broadcast::channel(16);
        let reporter = ProgressReporter::new(2, 0, 0, tx);
        reporter.on_item(1, Some("q1"), &ItemOutcome::Saved);
        assert_eq!(progress_points(&drain(&mut rx)), vec![1]);
    }
}
