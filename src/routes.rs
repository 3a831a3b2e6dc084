use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::{api, voice};
use crate::state::AppState;

/// Create the webhook router
///
/// The carrier endpoints take no auth of their own; deployments are expected
/// to validate carrier request signatures at the edge.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(api::health_check))
        .route(
            "/voice/incoming",
            post(voice::incoming_call).get(voice::voice_status),
        )
        .route("/voice/respond", post(voice::respond))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
