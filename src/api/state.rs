//! Application state for the API server

use crate::config::ApiConfig;
use crate::library::QuestionLibrary;
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// Cloned for each request (cheap Arc clone).
#[derive(Clone)]
pub struct AppState {
    /// The question library being served
    pub library: Arc<QuestionLibrary>,

    /// API configuration
    pub config: Arc<ApiConfig>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(library: Arc<QuestionLibrary>, config: Arc<ApiConfig>) -> Self {
        Self { library, config }
    }
}
