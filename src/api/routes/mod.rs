//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`questions`] - Question lookup and folder listings
//! - [`system`] - Health, rescan, OpenAPI

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::library::FolderInfo;

mod questions;
mod system;

pub use questions::*;
pub use system::*;

// ============================================================================
// Response bodies (shared across handlers)
// ============================================================================

/// Body of GET /api/question/:id
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QuestionResponse {
    /// Always `true`
    pub success: bool,
    /// The cleaned question record
    #[schema(value_type = Object)]
    pub data: Value,
    /// Folder the record was found in
    pub folder: String,
}

/// Body of GET /api/folders
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FoldersResponse {
    /// Scanned folders in lookup order
    pub folders: Vec<FolderInfo>,
}

/// Body of GET /api/questions/*folder
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QuestionListResponse {
    /// Always `true`
    pub success: bool,
    /// Sorted question ids
    pub questions: Vec<String>,
    /// Number of ids
    pub count: usize,
}

/// Body of POST /api/rescan
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RescanResponse {
    /// Always `true`
    pub success: bool,
    /// Folders found by the new scan
    pub folders: usize,
}
