//! Unit of work: skip-check, fetch, persist, for a single item.

use std::sync::Arc;

use crate::client::QuestionFetcher;
use crate::error::ItemError;
use crate::store::ResultStore;
use crate::types::{FetchOutcome, ItemOutcome, WorkItem};

use super::progress::ProgressReporter;
use super::stats::RunStats;

/// Shared state for every unit of one run, reducing parameter passing between helpers.
pub(crate) struct UnitContext {
    pub(crate) fetcher: Arc<dyn QuestionFetcher>,
    pub(crate) store: ResultStore,
    pub(crate) stats: RunStats,
    pub(crate) reporter: ProgressReporter,
}

impl UnitContext {
    /// Record the final outcome of an entry and report progress.
    pub(crate) fn complete(&self, local_id: Option<&str>, outcome: ItemOutcome) {
        let completed = self.stats.record(&outcome);
        self.reporter.on_item(completed, local_id, &outcome);
    }

    /// Record an entry rejected before dispatch.
    pub(crate) fn reject(&self, position: usize, error: ItemError) {
        tracing::warn!(
            item = position + 1,
            error = %error,
            "Skipping malformed item"
        );
        self.complete(None, ItemOutcome::Failed(error));
    }
}

/// Drive one item through skip-check, fetch and persist.
///
/// Never fails: every problem is folded into the returned [`ItemOutcome`].
pub(crate) async fn process_item(
    fetcher: &dyn QuestionFetcher,
    store: &ResultStore,
    item: &WorkItem,
) -> ItemOutcome {
    let local_id = item.local_id.as_str();
    let external_id = item.external_id.as_str();

    if store.exists(local_id).await {
        tracing::debug!(local_id, "Skipped - record already exists");
        return ItemOutcome::Skipped;
    }

    match fetcher.fetch(external_id).await {
        FetchOutcome::Success(payload) => match store.save(local_id, &payload).await {
            Ok(()) => {
                tracing::debug!(local_id, "Successfully saved");
                ItemOutcome::Saved
            }
            Err(e) => {
                tracing::error!(local_id, error = %e, "Error saving question data");
                ItemOutcome::Failed(ItemError::Persistence {
                    reason: e.to_string(),
                })
            }
        },
        FetchOutcome::RateLimited => {
            tracing::warn!(local_id, external_id, "Rate limited (429)");
            ItemOutcome::Failed(ItemError::RateLimited)
        }
        FetchOutcome::Failed { status, reason } => {
            tracing::error!(
                local_id,
                external_id,
                status = status.map(|s| s.to_string()).unwrap_or_else(|| "-".into()),
                reason = %reason,
                "API call failed"
            );
            ItemOutcome::Failed(ItemError::Transport { status, reason })
        }
    }
}
