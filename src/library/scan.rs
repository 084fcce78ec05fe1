//! Folder discovery for the question library.

use std::path::{Path, PathBuf};

use crate::config::LibraryConfig;
use crate::error::Result;
use crate::source::is_json_file;

/// `*.json` files directly inside `dir`; a missing directory has none
pub(crate) async fn json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(files),
        Err(e) => return Err(e.into()),
    };
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if is_json_file(&path) && entry.file_type().await?.is_file() {
            files.push(path);
        }
    }
    Ok(files)
}

async fn has_json_files(dir: &Path) -> Result<bool> {
    Ok(!json_files(dir).await?.is_empty())
}

/// Sorted names of the non-hidden subdirectories of `dir`
async fn subdirectories(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(names),
        Err(e) => return Err(e.into()),
    };
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.starts_with('.') {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

/// Find every folder holding question files, in lookup order
///
/// Content directories' subfolders come first, then the known topic folders at the
/// root, then any other root folder. Names are relative to the library root and
/// use `/` as separator.
pub(crate) async fn scan_folders(config: &LibraryConfig) -> Result<Vec<String>> {
    let root = &config.root;
    let mut folders: Vec<String> = Vec::new();

    for content_dir in &config.content_dirs {
        for name in subdirectories(&root.join(content_dir)).await? {
            let folder = format!("{content_dir}/{name}");
            if has_json_files(&root.join(&folder)).await? {
                push_unique(&mut folders, folder);
            }
        }
    }

    for known in &config.known_folders {
        if has_json_files(&root.join(known)).await? {
            push_unique(&mut folders, known.clone());
        }
    }

    for name in subdirectories(root).await? {
        if config.excluded_dirs.contains(&name) {
            continue;
        }
        if has_json_files(&root.join(&name)).await? {
            push_unique(&mut folders, name);
        }
    }

    tracing::debug!(root = %root.display(), folders = folders.len(), "Scanned question folders");
    Ok(folders)
}

fn push_unique(folders: &mut Vec<String>, folder: String) {
    if !folders.contains(&folder) {
        folders.push(folder);
    }
}
