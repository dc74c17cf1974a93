//! API Routes
//!
//! Configures the Axum router with all proxy endpoints.

use axum::{
    routing::{any, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{health_handler, media_handler, messages_handler, AppState};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `ANY /media?url=...` - Intercept a request for an upstream resource
/// - `POST /messages` - Message protocol (`GET_CACHE_STATS`)
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin, players are served from other origins
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(Any);

    Router::new()
        .route("/media", any(media_handler))
        .route("/messages", post(messages_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
