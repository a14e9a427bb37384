use crate::{AppState, handlers};
use axum::{Router, routing::any};

/// Proxy Router Module
///
/// Every method under `/api` is forwarded to the booking backend with the
/// original path and query intact. OPTIONS preflights are answered here.
pub fn proxy_routes() -> Router<AppState> {
    Router::new()
        .route("/api", any(handlers::proxy_api))
        .route("/api/{*rest}", any(handlers::proxy_api))
}
