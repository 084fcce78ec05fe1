//! # qbank-dl
//!
//! Bulk fetcher for question-bank records, plus a read-only library over the
//! downloaded records.
//!
//! A run reads an input list (a JSON array of `{questionId, external_id}`
//! records), asks the remote endpoint for every question that has no record yet,
//! and writes each answer to `<output>/<questionId>.json`. Re-running the same list
//! only fetches what is still missing.
//!
//! Two execution strategies are available:
//! - **Bounded** - up to `max_in_flight` requests in parallel
//! - **Sequential** - one request at a time with a fixed delay in between
//!
//! ## Quick Start
//!
//! ```no_run
//! use qbank_dl::{Config, RunController};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let controller = RunController::new(Config::default())?;
//!
//!     // Subscribe to events
//!     let mut events = controller.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let summary = controller.run(Path::new("math/algebra.json")).await?;
//!     println!("{summary}");
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Fetch client
pub mod client;
/// Configuration types
pub mod config;
/// Concurrency coordinator (decomposed into focused submodules)
pub mod coordinator;
/// Error types
pub mod error;
/// Read access to downloaded records
pub mod library;
/// Run controller
pub mod runner;
/// Input list discovery and loading
pub mod source;
/// Result store
pub mod store;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use client::{HttpQuestionClient, QuestionFetcher};
pub use config::{ConcurrencyPolicy, Config};
pub use coordinator::Coordinator;
pub use error::{ApiError, Error, ItemError, Result, ToHttpStatus};
pub use library::{FolderInfo, QuestionLibrary, QuestionRecord};
pub use runner::{RunController, RunPlan};
pub use store::ResultStore;
pub use types::{
    Event, FetchOutcome, ItemOutcome, RunSummary, StatsSnapshot, WorkEntry, WorkItem,
};

use tokio_util::sync::CancellationToken;

/// Cancel `token` when a termination signal arrives.
///
/// Pair it with [`RunController::execute`] so Ctrl+C stops admitting new work
/// while in-flight requests finish and the summary is still produced.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use qbank_dl::{Config, RunController, cancel_on_signal};
/// use std::path::Path;
/// use tokio_util::sync::CancellationToken;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let controller = RunController::new(Config::default())?;
///     let plan = controller.prepare(Path::new("eng/standardEnglish.json")).await?;
///
///     let token = CancellationToken::new();
///     tokio::spawn(cancel_on_signal(token.clone()));
///
///     let summary = controller.execute(plan, token).await;
///     println!("{summary}");
///     Ok(())
/// }
/// ```
pub async fn cancel_on_signal(token: CancellationToken) {
    tokio::select! {
        _ = wait_for_signal() => {
            tracing::warn!("Interrupt received, stopping");
            token.cancel();
        }
        // Nothing to do once the token was cancelled elsewhere
        _ = token.cancelled() => {}
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn cancel_on_signal_returns_when_token_is_cancelled_elsewhere() {
        let token = CancellationToken::new();
        let watcher = tokio::spawn(cancel_on_signal(token.clone()));

        token.cancel();
        tokio::time::timeout(Duration::from_secs(2), watcher)
            .await
            .expect("watcher should exit")
            .unwrap();
    }
}
