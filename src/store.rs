//! Result store: one pretty-printed JSON file per question
//!
//! Records are written to a temporary sibling file and renamed into place, so a
//! concurrent [`ResultStore::exists`] check never sees a half-written record.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{Error, Result};

/// Suffix of persisted records
const RECORD_EXTENSION: &str = "json";

/// Distinguishes temp files of concurrent writes for the same id
static WRITE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Output folder holding `<local_id>.json` records
#[derive(Clone, Debug)]
pub struct ResultStore {
    root: PathBuf,
}

impl ResultStore {
    /// Open a store rooted at an existing folder
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Derive the output folder from the input list's name and create it
    ///
    /// `eng/algebra.json` under base `out` becomes `out/algebra`. Creating an
    /// existing folder is not an error.
    pub async fn resolve_output_location(base_dir: &Path, input: &Path) -> Result<Self> {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::InputList {
                path: input.to_path_buf(),
                reason: "input path has no file name".into(),
            })?;
        let root = base_dir.join(stem);

        let existed = tokio::fs::try_exists(&root).await.unwrap_or(false);
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|source| Error::OutputLocation {
                path: root.clone(),
                source,
            })?;

        let metadata = tokio::fs::metadata(&root)
            .await
            .map_err(|source| Error::OutputLocation {
                path: root.clone(),
                source,
            })?;
        if metadata.permissions().readonly() {
            return Err(Error::OutputLocation {
                path: root,
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            });
        }

        if existed {
            tracing::info!(folder = %root.display(), "Using existing folder");
        } else {
            tracing::info!(folder = %root.display(), "Created folder");
        }
        Ok(Self { root })
    }

    /// The output folder
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where the record for `local_id` lives
    pub fn record_path(&self, local_id: &str) -> PathBuf {
        self.root.join(format!("{local_id}.{RECORD_EXTENSION}"))
    }

    /// True if a record for `local_id` has been persisted
    pub async fn exists(&self, local_id: &str) -> bool {
        tokio::fs::try_exists(self.record_path(local_id))
            .await
            .unwrap_or(false)
    }

    /// Serialize `payload` (pretty-printed, literal Unicode) and atomically write it
    pub async fn save(&self, local_id: &str, payload: &serde_json::Value) -> std::io::Result<()> {
        let json = serde_json::to_vec_pretty(payload).map_err(std::io::Error::other)?;

        let final_path = self.record_path(local_id);
        let seq = WRITE_SEQ.fetch_add(1, Ordering::Relaxed);
        // Leading dot and .tmp suffix keep partial files out of *.json listings.
        // The id is left out so the temp name is never longer than the record name.
        let tmp_path = self
            .root
            .join(format!(".{}.{seq}.tmp", std::process::id()));

        if let Err(e) = tokio::fs::write(&tmp_path, &json).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e);
        }

        if let Err(e) = tokio::fs::rename(&tmp_path, &final_path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e);
        }

        Ok(())
    }
}
