pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::matching::handlers as matching;
use crate::mentors::handlers as mentors;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Mentor pool
        .route(
            "/api/v1/mentors",
            get(mentors::handle_list_mentors).post(mentors::handle_register_mentor),
        )
        .route("/api/v1/mentors/options", get(mentors::handle_query_options))
        .route("/api/v1/mentors/:id", get(mentors::handle_get_mentor))
        // Recommendations
        .route("/api/v1/recommendations", post(matching::handle_recommend))
        .with_state(state)
}
