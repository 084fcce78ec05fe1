//! Input lists: discovery and loading
//!
//! An input list is a JSON array of objects, each carrying at least a `questionId`
//! and an `external_id`. Other fields are ignored.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::{Error, ItemError, Result};
use crate::types::{WorkEntry, WorkItem};

/// Field holding the local id
pub const LOCAL_ID_FIELD: &str = "questionId";
/// Field holding the remote id
pub const EXTERNAL_ID_FIELD: &str = "external_id";

/// Input lists found in one search directory
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputGroup {
    /// The directory searched
    pub dir: PathBuf,
    /// `*.json` files in it, sorted by name
    pub files: Vec<PathBuf>,
}

/// List the `*.json` input files in each search directory
///
/// Missing directories produce an empty group rather than an error.
pub async fn discover_input_files(search_dirs: &[PathBuf]) -> Result<Vec<InputGroup>> {
    let mut groups = Vec::with_capacity(search_dirs.len());

    for dir in search_dirs {
        let mut files = Vec::new();
        match tokio::fs::read_dir(dir).await {
            Ok(mut entries) => {
                while let Some(entry) = entries.next_entry().await? {
                    let path = entry.path();
                    if is_json_file(&path) && entry.file_type().await?.is_file() {
                        files.push(path);
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(dir = %dir.display(), "input directory does not exist");
            }
            Err(e) => return Err(Error::Io(e)),
        }
        files.sort();
        groups.push(InputGroup {
            dir: dir.clone(),
            files,
        });
    }

    Ok(groups)
}

pub(crate) fn is_json_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

/// Load an input list from disk
///
/// Fails only if the file cannot be read or is not a JSON array; individual bad
/// records become [`WorkEntry::Rejected`].
pub async fn load_work_items(path: &Path) -> Result<Vec<WorkEntry>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::InputList {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let entries = parse_work_items(&raw).map_err(|reason| Error::InputList {
        path: path.to_path_buf(),
        reason,
    })?;

    tracing::info!(
        path = %path.display(),
        items = entries.len(),
        "Loaded input list"
    );
    Ok(entries)
}

/// Parse the contents of an input list
pub fn parse_work_items(raw: &str) -> std::result::Result<Vec<WorkEntry>, String> {
    let document: Value = serde_json::from_str(raw).map_err(|e| e.to_string())?;
    let Value::Array(records) = document else {
        return Err("expected a JSON array of question records".to_string());
    };

    Ok(records
        .iter()
        .enumerate()
        .map(|(position, record)| match parse_record(record) {
            Ok(item) => WorkEntry::Ready(item),
            Err(error) => WorkEntry::Rejected { position, error },
        })
        .collect())
}

fn parse_record(record: &Value) -> std::result::Result<WorkItem, ItemError> {
    let Value::Object(fields) = record else {
        return Err(ItemError::Malformed {
            reason: "record is not a JSON object".into(),
        });
    };

    let local_id = id_field(fields.get(LOCAL_ID_FIELD)).ok_or_else(|| ItemError::Malformed {
        reason: format!("missing {LOCAL_ID_FIELD}"),
    })?;
    let external_id =
        id_field(fields.get(EXTERNAL_ID_FIELD)).ok_or_else(|| ItemError::Malformed {
            reason: format!("missing {EXTERNAL_ID_FIELD} for {local_id}"),
        })?;

    WorkItem::new(local_id, external_id)
}

/// Strings are taken as-is, numbers are stringified, anything else counts as missing
fn id_field(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
