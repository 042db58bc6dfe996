pub mod protocol;
pub mod rest;
pub mod state;

use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

pub use rest::ApiDoc;
pub use state::AppState;

/// Builds the API router over the shared state.
pub fn router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/inspections/{id}/session",
            post(rest::load_session_handler)
                .get(rest::get_session_handler)
                .delete(rest::close_session_handler),
        )
        .route("/inspections/{id}/readings", put(rest::update_reading_handler))
        .route(
            "/inspections/{id}/visual-checks",
            put(rest::update_visual_check_handler),
        )
        .route("/inspections/{id}/remarks", put(rest::update_remarks_handler))
        .route("/inspections/{id}/reset", post(rest::reset_readings_handler))
        .route("/inspections/{id}/save", post(rest::save_handler))
        .route("/inspections/{id}/submit", post(rest::submit_handler))
        .route(
            "/inspections/{id}/completeness",
            get(rest::completeness_handler),
        )
        .route("/specifications/parse", get(rest::parse_specification_handler))
        .with_state(app_state)
}
