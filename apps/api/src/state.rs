use std::sync::Arc;

use anyhow::anyhow;

use crate::config::Config;
use crate::errors::AppError;
use crate::matching::recommender::MentorMatcher;
use crate::models::mentor::{MentorRecord, NewMentor};
use crate::store::MentorStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Pluggable mentor store. Default: CsvMentorStore at MENTOR_DATA_PATH.
    pub store: Arc<dyn MentorStore>,
    /// Pluggable matcher. Default: TfidfMatcher.
    pub matcher: Arc<dyn MentorMatcher>,
    pub config: Config,
}

impl AppState {
    /// Store calls are blocking file I/O, so they run off the async workers.
    pub async fn load_mentors(&self) -> Result<Vec<MentorRecord>, AppError> {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || store.load())
            .await
            .map_err(|e| AppError::Internal(anyhow!("store task failed: {e}")))?
            .map_err(AppError::from)
    }

    pub async fn get_mentor(&self, mentor_id: u64) -> Result<Option<MentorRecord>, AppError> {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || store.get(mentor_id))
            .await
            .map_err(|e| AppError::Internal(anyhow!("store task failed: {e}")))?
            .map_err(AppError::from)
    }

    pub async fn append_mentor(&self, mentor: NewMentor) -> Result<MentorRecord, AppError> {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || store.append(mentor))
            .await
            .map_err(|e| AppError::Internal(anyhow!("store task failed: {e}")))?
            .map_err(AppError::from)
    }
}
