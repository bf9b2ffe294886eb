//! Route modules for the Wordstream server

pub mod documents;
pub mod health;

use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Room for multipart framing on top of the largest accepted file
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Build the full application router
pub fn app(state: AppState) -> Router {
    let max_file_size = state.config().pipeline.limits.max_file_size;
    let body_limit = usize::try_from(max_file_size)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/v1/health", get(health::health_check))
        .nest("/api/v1/documents", documents::router(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
