//! Sequential-delayed strategy: one item at a time, in input order.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::types::WorkEntry;

use super::unit::{UnitContext, process_item};

/// Visit entries strictly in order, pausing `delay` after each dispatched item.
///
/// No pause follows a skipped or malformed entry, nor the last entry of the list.
/// Returns `true` if the run was cancelled before every entry was visited.
pub(crate) async fn run_sequential(
    ctx: &UnitContext,
    entries: Vec<WorkEntry>,
    delay: Duration,
    cancel_token: &CancellationToken,
) -> bool {
    let total = entries.len();

    for (index, entry) in entries.into_iter().enumerate() {
        if cancel_token.is_cancelled() {
            return true;
        }

        let item = match entry {
            WorkEntry::Ready(item) => item,
            WorkEntry::Rejected { position, error } => {
                ctx.reject(position, error);
                continue;
            }
        };

        tracing::debug!(
            position = index + 1,
            total,
            local_id = %item.local_id,
            "Processing"
        );

        let outcome = process_item(ctx.fetcher.as_ref(), &ctx.store, &item).await;
        let dispatched = outcome.was_dispatched();
        ctx.complete(Some(&item.local_id), outcome);

        if dispatched && index + 1 < total {
            tokio::select! {
                _ = cancel_token.cancelled() => return true,
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    false
}
