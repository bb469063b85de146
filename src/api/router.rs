use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers;
use super::state::SharedState;
use crate::ws;

/// Build the Axum router with all routes and middleware.
pub fn create_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check (outside /api prefix)
        .route("/health", get(handlers::health))
        .route("/api/categories", get(handlers::list_categories))
        // Session creation
        .route("/api/sessions/online", post(handlers::create_online))
        .route("/api/sessions/local", post(handlers::create_local))
        // Joining
        .route("/api/sessions/join", post(handlers::join_by_code))
        .route("/api/sessions/{code}/join", post(handlers::join_session))
        // View & actions
        .route("/api/sessions/{code}", get(handlers::get_session))
        .route("/api/sessions/{code}/action", post(handlers::session_action))
        // WebSocket: live session events
        .route("/ws/sessions/{code}", get(ws::ws_handler))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
