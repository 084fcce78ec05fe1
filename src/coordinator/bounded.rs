//! Bounded-parallel strategy: at most `max_in_flight` units in flight at once.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::error::ItemError;
use crate::types::{ItemOutcome, WorkEntry};

use super::unit::{UnitContext, process_item};

/// Run every entry as an independent unit behind an admission limiter.
///
/// Completions arrive in any order. A panicking unit is recorded as a failure for
/// that item only. Returns `true` if admission stopped early on cancellation; units
/// already admitted are always allowed to finish.
pub(crate) async fn run_bounded(
    ctx: Arc<UnitContext>,
    entries: Vec<WorkEntry>,
    max_in_flight: usize,
    cancel_token: &CancellationToken,
) -> bool {
    let limiter = Arc::new(Semaphore::new(max_in_flight.max(1)));
    let mut units = JoinSet::new();
    let mut cancelled = false;

    for entry in entries {
        let item = match entry {
            WorkEntry::Ready(item) => item,
            WorkEntry::Rejected { position, error } => {
                ctx.reject(position, error);
                continue;
            }
        };

        let permit = tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                cancelled = true;
                break;
            }
            permit = Arc::clone(&limiter).acquire_owned() => match permit {
                Ok(permit) => permit,
                // The limiter is never closed while dispatching
                Err(_) => {
                    cancelled = true;
                    break;
                }
            },
        };

        let unit_ctx = Arc::clone(&ctx);
        units.spawn(async move {
            // Held until the unit finishes, whatever the outcome
            let _permit = permit;
            let outcome =
                AssertUnwindSafe(process_item(unit_ctx.fetcher.as_ref(), &unit_ctx.store, &item))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|panic| {
                        let reason = format!("unit of work panicked: {}", panic_message(panic.as_ref()));
                        tracing::error!(local_id = %item.local_id, reason = %reason, "Unit of work aborted");
                        ItemOutcome::Failed(ItemError::Transport {
                            status: None,
                            reason,
                        })
                    });
            unit_ctx.complete(Some(&item.local_id), outcome);
        });

        // Reap finished units so the set stays proportional to max_in_flight
        while let Some(result) = units.try_join_next() {
            log_join_failure(result);
        }
    }

    if cancelled {
        tracing::warn!(
            in_flight = units.len(),
            "Run cancelled, waiting for in-flight requests to finish"
        );
    }

    while let Some(result) = units.join_next().await {
        log_join_failure(result);
    }

    cancelled
}

fn log_join_failure(result: Result<(), tokio::task::JoinError>) {
    if let Err(e) = result {
        tracing::error!(error = %e, "Unit task failed after recording its outcome");
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
