//! Axum route handlers for the Recommendation API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::matching::recommender::MentorMatch;
use crate::models::mentor::QueryProfile;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    #[serde(flatten)]
    pub profile: QueryProfile,
    /// Falls back to the configured default when omitted.
    pub k: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendResponse {
    pub matches: Vec<MentorMatch>,
    pub k: usize,
    pub pool_size: usize,
    pub matcher_backend: String,
}

/// POST /api/v1/recommendations
///
/// Ranks the whole mentor pool against the aspirant's profile and returns the top k.
/// An empty pool is rejected before the matcher runs.
pub async fn handle_recommend(
    State(state): State<AppState>,
    Json(request): Json<RecommendRequest>,
) -> Result<Json<RecommendResponse>, AppError> {
    let k = request.k.unwrap_or(state.config.top_k);
    if k == 0 {
        return Err(AppError::Validation("k must be at least 1".to_string()));
    }

    let mentors = state.load_mentors().await?;
    if mentors.is_empty() {
        return Err(AppError::EmptyPool);
    }

    let matches = state
        .matcher
        .recommend(&request.profile, &mentors, k)
        .await?;

    info!(
        "Recommended {} of {} mentors (top score {:.3})",
        matches.len(),
        mentors.len(),
        matches.first().map(|m| m.similarity_score).unwrap_or(0.0)
    );

    Ok(Json(RecommendResponse {
        matches,
        k,
        pool_size: mentors.len(),
        matcher_backend: state.matcher.backend().to_string(),
    }))
}
