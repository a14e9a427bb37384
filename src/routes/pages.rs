use crate::{AppState, handlers};
use axum::Router;

/// Pages Router Module
///
/// The SPA owns the URL space, so pages are served from the fallback: every
/// path not claimed by the JSON or proxy routers is resolved against the page
/// table and guarded before the shell is returned.
pub fn page_routes() -> Router<AppState> {
    Router::new().fallback(handlers::render_page)
}
