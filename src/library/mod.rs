//! Question library: read access to records persisted by earlier runs
//!
//! The library looks questions up by id across every folder that holds records,
//! lists folders with their question counts, and lists the ids in one folder.
//! It is the data source of the HTTP front-end.

mod scan;


use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use utoipa::ToSchema;

use crate::config::LibraryConfig;
use crate::error::{Error, Result};

/// A folder of question records
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FolderInfo {
    /// Folder name relative to the library root (e.g. `math/algebra`)
    pub name: String,
    /// Number of `*.json` records in it
    pub count: usize,
}

/// A question record and the folder it was found in
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct QuestionRecord {
    /// Cleaned record contents
    #[schema(value_type = Object)]
    pub data: Value,
    /// Folder holding the record
    pub folder: String,
}

/// Scanned view over the library root
pub struct QuestionLibrary {
    config: LibraryConfig,
    folders: RwLock<Vec<String>>,
}

impl QuestionLibrary {
    /// Scan `config.root` and build the library
    pub async fn open(config: LibraryConfig) -> Result<Self> {
        let folders = scan::scan_folders(&config).await?;
        tracing::info!(
            root = %config.root.display(),
            folders = folders.len(),
            "Question library ready"
        );
        Ok(Self {
            config,
            folders: RwLock::new(folders),
        })
    }

    /// Re-scan the root, picking up folders created since the last scan
    pub async fn rescan(&self) -> Result<usize> {
        let folders = scan::scan_folders(&self.config).await?;
        let count = folders.len();
        *self.folders.write().await = folders;
        Ok(count)
    }

    /// Scanned folder names in lookup order
    pub async fn folder_names(&self) -> Vec<String> {
        self.folders.read().await.clone()
    }

    /// Every scanned folder with its record count
    pub async fn folders(&self) -> Result<Vec<FolderInfo>> {
        let names = self.folder_names().await;
        let mut infos = Vec::with_capacity(names.len());
        for name in names {
            let count = scan::json_files(&self.folder_path(&name)).await?.len();
            infos.push(FolderInfo { name, count });
        }
        Ok(infos)
    }

    /// Look `question_id` up in every folder, in scan order
    ///
    /// The first match is parsed and cleaned (see [`clean_question`]). A record that
    /// exists but cannot be read is an error, not a miss.
    pub async fn find_question(&self, question_id: &str) -> Result<QuestionRecord> {
        let not_found =
            || Error::NotFound(format!("Question with ID '{question_id}' not found in any folder"));

        if question_id.is_empty()
            || question_id.contains(['/', '\\'])
            || question_id == "."
            || question_id == ".."
        {
            return Err(not_found());
        }

        for folder in self.folder_names().await {
            let path = self.folder_path(&folder).join(format!("{question_id}.json"));
            let raw = match tokio::fs::read_to_string(&path).await {
                Ok(raw) => raw,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(read_error(e)),
            };
            let mut data: Value = serde_json::from_str(&raw).map_err(read_error)?;
            clean_question(&mut data);

            tracing::debug!(question_id, folder = %folder, "Found question");
            return Ok(QuestionRecord { data, folder });
        }

        Err(not_found())
    }

    /// Sorted ids in `folder`
    ///
    /// `folder` must name a scanned folder; backslashes are accepted in place of `/`.
    pub async fn list_questions(&self, folder: &str) -> Result<Vec<String>> {
        let requested = folder.replace('\\', "/");
        let known = self
            .folders
            .read()
            .await
            .iter()
            .find(|name| name.replace('\\', "/") == requested)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Folder not found: {folder}")))?;

        let mut ids: Vec<String> = scan::json_files(&self.folder_path(&known))
            .await?
            .iter()
            .filter_map(|path| path.file_stem())
            .map(|stem| stem.to_string_lossy().into_owned())
            .collect();
        ids.sort();
        Ok(ids)
    }

    fn folder_path(&self, folder: &str) -> PathBuf {
        self.config.root.join(folder)
    }
}

fn read_error(e: impl std::fmt::Display) -> Error {
    Error::Other(format!("Error reading file: {e}"))
}

/// Undo the double escaping found in some records
///
/// In `stem`, `rationale` and each `answerOptions[].content`, the two-character
/// sequences `\n` and `\"` become a newline and `"`. Non-string values are kept.
pub fn clean_question(record: &mut Value) {
    let Some(fields) = record.as_object_mut() else {
        return;
    };

    for key in ["stem", "rationale"] {
        if let Some(value) = fields.get_mut(key) {
            clean_text(value);
        }
    }

    if let Some(Value::Array(options)) = fields.get_mut("answerOptions") {
        for option in options {
            if let Some(content) = option.get_mut("content") {
                clean_text(content);
            }
        }
    }
}

fn clean_text(value: &mut Value) {
    if let Value::String(text) = value {
        *text = text.replace("\\n", "\n").replace("\\\"", "\"");
    }
}
