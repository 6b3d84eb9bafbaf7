//! Webhook API of the conference stream service

pub mod error;
pub mod handlers;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use error::ApiError;
pub use state::AppState;

/// Create the webhook router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // PSTN legs
        .route("/answer", get(handlers::answer))
        .route("/dtmf", post(handlers::dtmf))
        .route("/event", post(handlers::event))
        // Streaming legs
        .route("/ws_answer", get(handlers::stream_answer))
        .route("/ws_event", post(handlers::stream_event))
        // Operator trigger and downstream sinks
        .route("/call", get(handlers::place_call))
        .route("/results", post(handlers::results))
        .route("/rtc", post(handlers::rtc))
        .route("/_/health", get(handlers::health))
        .route("/_/legs", get(handlers::legs))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
