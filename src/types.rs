//! Core types and events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::ConcurrencyPolicy;
use crate::error::ItemError;

/// One question to fetch: the local file id and the id the remote API knows it by
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Local question id (`questionId`), names the persisted record
    pub local_id: String,
    /// Remote id (`external_id`) sent to the endpoint
    pub external_id: String,
}

impl WorkItem {
    /// Build a work item, rejecting empty ids and local ids that cannot be a file name
    pub fn new(
        local_id: impl Into<String>,
        external_id: impl Into<String>,
    ) -> std::result::Result<Self, ItemError> {
        let local_id = local_id.into();
        let external_id = external_id.into();

        if local_id.trim().is_empty() {
            return Err(ItemError::Malformed {
                reason: "missing questionId".into(),
            });
        }
        if external_id.trim().is_empty() {
            return Err(ItemError::Malformed {
                reason: format!("missing external_id for {local_id}"),
            });
        }
        if local_id.contains(['/', '\\']) || local_id == "." || local_id == ".." {
            return Err(ItemError::Malformed {
                reason: format!("questionId {local_id:?} is not a valid file name"),
            });
        }

        Ok(Self {
            local_id,
            external_id,
        })
    }
}

/// An entry of a loaded input list
///
/// Malformed records stay in the list so they are counted in the run totals, but
/// they never reach the network.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkEntry {
    /// A valid item ready for dispatch
    Ready(WorkItem),
    /// A record rejected at load time
    Rejected {
        /// Zero-based position in the input list
        position: usize,
        /// Why it was rejected
        error: ItemError,
    },
}

/// Result of one network call
#[derive(Clone, Debug, PartialEq)]
pub enum FetchOutcome {
    /// 200 with a JSON body
    Success(serde_json::Value),
    /// 429 Too Many Requests
    RateLimited,
    /// Any other status, transport error, timeout or unparseable body
    Failed {
        /// HTTP status, if a response was received
        status: Option<u16>,
        /// Diagnostic description
        reason: String,
    },
}

/// Final outcome of one work entry
///
/// Exactly one of these is recorded per entry in a completed run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ItemOutcome {
    /// A record already existed; no network call was made
    Skipped,
    /// Fetched and persisted
    Saved,
    /// Rejected, rate limited, or failed to fetch/persist
    Failed(ItemError),
}

impl ItemOutcome {
    /// Skips and saves both count as successes
    pub fn is_success(&self) -> bool {
        matches!(self, ItemOutcome::Skipped | ItemOutcome::Saved)
    }

    /// Whether the entry consumed a network call
    pub fn was_dispatched(&self) -> bool {
        match self {
            ItemOutcome::Skipped => false,
            ItemOutcome::Saved => true,
            ItemOutcome::Failed(err) => err.was_dispatched(),
        }
    }

    /// Short label used in events and logs
    pub fn label(&self) -> &'static str {
        match self {
            ItemOutcome::Skipped => "skipped",
            ItemOutcome::Saved => "saved",
            ItemOutcome::Failed(ItemError::RateLimited) => "rate_limited",
            ItemOutcome::Failed(ItemError::Malformed { .. }) => "malformed",
            ItemOutcome::Failed(ItemError::Persistence { .. }) => "persist_failed",
            ItemOutcome::Failed(ItemError::Transport { .. }) => "failed",
        }
    }
}

/// Read-only view of the run counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Entries in the input list
    pub total: u64,
    /// Entries with a recorded outcome
    pub completed: u64,
    /// Saved or skipped
    pub successful: u64,
    /// Every other outcome
    pub failed: u64,
    /// Of `successful`, how many were skipped because a record existed
    pub skipped: u64,
    /// Of `failed`, how many were rate limited
    pub rate_limited: u64,
    /// Of `failed`, how many were rejected before dispatch
    pub malformed: u64,
}

impl StatsSnapshot {
    /// Percentage of entries completed, 0 when there is nothing to do
    pub fn percent_complete(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f64 / self.total as f64 * 100.0
        }
    }
}

/// Events emitted during a run
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Dispatch is about to begin
    RunStarted {
        /// Entries in the input list
        total: u64,
        /// Output folder
        output_dir: PathBuf,
    },

    /// One entry reached its final outcome
    ItemCompleted {
        /// Local question id (absent for records without one)
        #[serde(skip_serializing_if = "Option::is_none")]
        local_id: Option<String>,
        /// `saved`, `skipped`, `rate_limited`, `malformed`, `persist_failed` or `failed`
        outcome: String,
        /// Failure description
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    /// Periodic progress update
    Progress {
        /// Entries completed so far
        completed: u64,
        /// Entries in the input list
        total: u64,
        /// Completion percentage (0.0 to 100.0)
        percent: f64,
        /// Completions per second since the run started
        rate: f64,
    },

    /// The run ended (normally or by cancellation)
    RunFinished {
        /// Final summary
        summary: RunSummary,
    },
}

/// Summary of one finished run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Final counters
    pub stats: StatsSnapshot,
    /// Wall-clock duration of the dispatch phase
    pub elapsed: Duration,
    /// When dispatch began
    pub started_at: DateTime<Utc>,
    /// Strategy used
    pub policy: ConcurrencyPolicy,
    /// Folder the records were written to
    pub output_dir: PathBuf,
    /// True if the run was interrupted before every entry was visited
    pub cancelled: bool,
}

impl RunSummary {
    /// Successful entries as a percentage of all entries; 0 for an empty run
    pub fn success_rate(&self) -> f64 {
        if self.stats.total == 0 {
            0.0
        } else {
            self.stats.successful as f64 / self.stats.total as f64 * 100.0
        }
    }

    /// Entries per second over the whole run; 0 when no time elapsed
    pub fn average_rate(&self) -> f64 {
        rate_per_second(self.stats.completed, self.elapsed)
    }
}

/// `count / elapsed`, guarded against a zero elapsed time
pub fn rate_per_second(count: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 { count as f64 / secs } else { 0.0 }
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rule = "=".repeat(50);
        writeln!(f, "{rule}")?;
        if self.cancelled {
            writeln!(f, "PROCESSING CANCELLED")?;
        } else {
            writeln!(f, "PROCESSING COMPLETE")?;
        }
        writeln!(f, "{rule}")?;
        writeln!(f, "Output folder: {}", self.output_dir.display())?;
        writeln!(f, "Mode: {}", self.policy)?;
        writeln!(f, "Total questions: {}", self.stats.total)?;
        writeln!(f, "Processed: {}", self.stats.completed)?;
        writeln!(
            f,
            "Successful: {} ({} already present)",
            self.stats.successful, self.stats.skipped
        )?;
        writeln!(
            f,
            "Failed: {} ({} rate limited, {} malformed)",
            self.stats.failed, self.stats.rate_limited, self.stats.malformed
        )?;
        writeln!(f, "Success rate: {:.1}%", self.success_rate())?;
        writeln!(f, "Total time: {:.2} seconds", self.elapsed.as_secs_f64())?;
        writeln!(f, "Average rate: {:.1} requests/second", self.average_rate())?;
        write!(f, "{rule}")
    }
}
