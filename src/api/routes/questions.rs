//! Question handlers: lookup by id, folder listing, ids per folder.

use crate::api::AppState;
use crate::error::Error;
use axum::{
    Json,
    extract::{Path, State},
};

use super::{FoldersResponse, QuestionListResponse, QuestionResponse};

/// GET /api/question/:id - Find a question in any folder
#[utoipa::path(
    get,
    path = "/api/question/{id}",
    tag = "questions",
    params(
        ("id" = String, Path, description = "Question id (file stem of the record)")
    ),
    responses(
        (status = 200, description = "Question found", body = QuestionResponse),
        (status = 404, description = "No folder holds the question", body = crate::error::ApiError),
        (status = 500, description = "Record could not be read", body = crate::error::ApiError)
    )
)]
pub async fn get_question(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<QuestionResponse>, Error> {
    let record = state.library.find_question(&id).await?;
    Ok(Json(QuestionResponse {
        success: true,
        data: record.data,
        folder: record.folder,
    }))
}

/// GET /api/folders - List folders with question counts
#[utoipa::path(
    get,
    path = "/api/folders",
    tag = "questions",
    responses(
        (status = 200, description = "Scanned folders", body = FoldersResponse),
        (status = 500, description = "A folder could not be read", body = crate::error::ApiError)
    )
)]
pub async fn list_folders(State(state): State<AppState>) -> Result<Json<FoldersResponse>, Error> {
    let folders = state.library.folders().await?;
    Ok(Json(FoldersResponse { folders }))
}

/// GET /api/questions/*folder - List question ids in a folder
#[utoipa::path(
    get,
    path = "/api/questions/{folder}",
    tag = "questions",
    params(
        ("folder" = String, Path, description = "Folder name, may contain '/' (e.g. math/algebra)")
    ),
    responses(
        (status = 200, description = "Sorted question ids", body = QuestionListResponse),
        (status = 404, description = "Unknown folder", body = crate::error::ApiError)
    )
)]
pub async fn list_questions(
    State(state): State<AppState>,
    Path(folder): Path<String>,
) -> Result<Json<QuestionListResponse>, Error> {
    let questions = state.library.list_questions(&folder).await?;
    Ok(Json(QuestionListResponse {
        success: true,
        count: questions.len(),
        questions,
    }))
}
