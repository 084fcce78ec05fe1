//! Run controller: load an input list, resolve its output folder, then hand the
//! work to the [`Coordinator`].
//!
//! Failures here are fatal and happen before any request is made. Once dispatch
//! starts, every problem is per-item.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::client::{HttpQuestionClient, QuestionFetcher};
use crate::config::{ConcurrencyPolicy, Config};
use crate::coordinator::Coordinator;
use crate::error::Result;
use crate::source::load_work_items;
use crate::store::ResultStore;
use crate::types::{Event, RunSummary, WorkEntry};

/// A loaded input list and its resolved output folder, ready for dispatch
#[derive(Clone, Debug)]
pub struct RunPlan {
    /// Input list the entries were read from
    pub input_path: PathBuf,
    /// Entries in input order, malformed ones included
    pub entries: Vec<WorkEntry>,
    /// Output folder
    pub store: ResultStore,
    /// Strategy to dispatch with
    pub policy: ConcurrencyPolicy,
}

impl RunPlan {
    /// Number of entries in the input list
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the input list is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Folder records are written to
    pub fn output_dir(&self) -> &Path {
        self.store.root()
    }
}

/// Runs input lists against the question endpoint
pub struct RunController {
    config: Arc<Config>,
    fetcher: Arc<dyn QuestionFetcher>,
    event_tx: broadcast::Sender<Event>,
}

impl RunController {
    /// Validate `config` and build the HTTP client
    ///
    /// The client's idle pool is sized to the admission limit in bounded mode.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let pool_size = match config.policy {
            ConcurrencyPolicy::Bounded { max_in_flight } => max_in_flight,
            ConcurrencyPolicy::Sequential { .. } => 1,
        };
        let client = HttpQuestionClient::new(&config.fetch, pool_size)?;
        tracing::debug!(endpoint = %client.endpoint(), pool_size, "HTTP client ready");
        Ok(Self::with_fetcher(config, Arc::new(client)))
    }

    /// Use a custom fetcher (a different transport, or a test double)
    pub fn with_fetcher(config: Config, fetcher: Arc<dyn QuestionFetcher>) -> Self {
        let (event_tx, _rx) = broadcast::channel(1000);
        Self {
            config: Arc::new(config),
            fetcher,
            event_tx,
        }
    }

    /// Subscribe to run events
    ///
    /// Each subscriber sees every event sent after it subscribed. Slow subscribers
    /// may miss events (`RecvError::Lagged`) but never slow the run down.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// The active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Load `input` and create its output folder under `output.base_dir`
    pub async fn prepare(&self, input: &Path) -> Result<RunPlan> {
        let entries = load_work_items(input).await?;
        let store = ResultStore::resolve_output_location(&self.config.output.base_dir, input).await?;

        Ok(RunPlan {
            input_path: input.to_path_buf(),
            entries,
            store,
            policy: self.config.policy,
        })
    }

    /// Dispatch a prepared plan
    ///
    /// Cancelling `cancel_token` stops admission of new items; the summary is then
    /// marked as cancelled.
    pub async fn execute(&self, plan: RunPlan, cancel_token: CancellationToken) -> RunSummary {
        tracing::info!(
            input = %plan.input_path.display(),
            items = plan.len(),
            "Starting run"
        );

        Coordinator::new(
            Arc::clone(&self.fetcher),
            plan.store,
            self.config.progress.clone(),
            self.event_tx.clone(),
        )
        .with_cancellation(cancel_token)
        .run(plan.entries, plan.policy)
        .await
    }

    /// Prepare and execute `input` without external cancellation
    pub async fn run(&self, input: &Path) -> Result<RunSummary> {
        let plan = self.prepare(input).await?;
        Ok(self.execute(plan, CancellationToken::new()).await)
    }
}
