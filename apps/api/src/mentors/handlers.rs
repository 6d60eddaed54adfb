use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::mentors::options::{query_options, QueryOptions};
use crate::mentors::validation::RegisterMentorRequest;
use crate::models::mentor::MentorRecord;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct MentorListResponse {
    pub mentors: Vec<MentorRecord>,
    pub total: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterMentorResponse {
    pub mentor: MentorRecord,
    pub message: String,
}

/// GET /api/v1/mentors
pub async fn handle_list_mentors(
    State(state): State<AppState>,
) -> Result<Json<MentorListResponse>, AppError> {
    let mentors = state.load_mentors().await?;
    Ok(Json(MentorListResponse {
        total: mentors.len(),
        mentors,
    }))
}

/// GET /api/v1/mentors/options
pub async fn handle_query_options(
    State(state): State<AppState>,
) -> Result<Json<QueryOptions>, AppError> {
    let mentors = state.load_mentors().await?;
    if mentors.is_empty() {
        return Err(AppError::EmptyPool);
    }
    Ok(Json(query_options(&mentors)))
}

/// GET /api/v1/mentors/:id
pub async fn handle_get_mentor(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<MentorRecord>, AppError> {
    state
        .get_mentor(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Mentor {id} not found")))
}

/// POST /api/v1/mentors
///
/// Validation failures never reach the store.
pub async fn handle_register_mentor(
    State(state): State<AppState>,
    Json(request): Json<RegisterMentorRequest>,
) -> Result<(StatusCode, Json<RegisterMentorResponse>), AppError> {
    let new_mentor = request.validate()?;
    let mentor = state.append_mentor(new_mentor).await?;
    let message = format!(
        "Thank you, {}! You’ve been added as a mentor.",
        mentor.name
    );
    Ok((
        StatusCode::CREATED,
        Json(RegisterMentorResponse { mentor, message }),
    ))
}
