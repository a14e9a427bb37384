use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints that need no session. `/navigation` reads the session cookies
/// but never rejects: an anonymous caller simply gets a redirect decision.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        .route("/health", get(|| async { "ok" }))
        // GET /routes
        // The page table with flags aggregated over each route's ancestry.
        .route("/routes", get(handlers::list_routes))
        // GET /navigation?to=/rooms
        // The guard's verdict for a prospective navigation.
        .route("/navigation", get(handlers::navigate))
        // GET /config
        .route("/config", get(handlers::client_config))
        // POST/DELETE /session
        // Login stores the token and admin marker in cookies; logout expires them.
        .route("/session", post(handlers::login).delete(handlers::logout))
}
