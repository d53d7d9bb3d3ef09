//! API module
//!
//! Contains HTTP request handlers and the router that mounts them

pub mod chats;
pub mod health;
pub mod middleware;

use crate::state::AppState;
use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the application router with all routes and middleware
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/chats", get(chats::list_chats))
        .route(
            "/api/chats/:id",
            get(chats::get_chat)
                .put(chats::save_chat)
                .delete(chats::delete_chat),
        )
        // Middleware (order matters - request_id should be first)
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}
