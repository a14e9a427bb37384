use crate::{
    AppState,
    auth::{CurrentSession, write_session_cookies},
    config::{AppConfig, Env},
    error::ProxyError,
    guard::{self, NavigationDecision},
    models::{
        ClientConfig, LoginRequest, NavigateQuery, NavigationResponse, RouteSummary,
        SessionResponse, View,
    },
    proxy::{self, UpstreamState},
    route_table::{DEFAULT_PATH, LOGIN_PATH, RouteTable},
    session::{self, MemorySessionStore},
};
use axum::{
    Json,
    body::{self, Body},
    extract::{Query, State},
    http::{HeaderMap, Method, StatusCode, Uri, header},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

/// Shared, immutable route table.
pub type RouteTableState = Arc<RouteTable>;

// --- Navigation ---

/// navigate
///
/// [Public Route] Asks the guard about a navigation before the SPA performs
/// it. The session is taken from the request's cookies.
#[utoipa::path(
    get,
    path = "/navigation",
    params(NavigateQuery),
    responses((status = 200, description = "Guard decision", body = NavigationResponse))
)]
pub async fn navigate(
    CurrentSession(session): CurrentSession,
    State(routes): State<RouteTableState>,
    Query(query): Query<NavigateQuery>,
) -> Json<NavigationResponse> {
    let target = routes.resolve(&query.to);
    let decision = guard::check(&target, session);
    tracing::debug!(to = %target.full_path, ?session, ?decision, "navigation check");
    Json(decision.to_response(&target))
}

/// list_routes
///
/// [Public Route] Lists the page table with effective access flags.
#[utoipa::path(
    get,
    path = "/routes",
    responses((status = 200, description = "Route table", body = [RouteSummary]))
)]
pub async fn list_routes(State(routes): State<RouteTableState>) -> Json<Vec<RouteSummary>> {
    Json(routes.routes())
}

/// client_config
///
/// [Public Route] Boot-time settings for the SPA.
#[utoipa::path(
    get,
    path = "/config",
    responses((status = 200, description = "Client config", body = ClientConfig))
)]
pub async fn client_config(State(config): State<AppConfig>) -> Json<ClientConfig> {
    Json(ClientConfig {
        api_base_url: config.api_base_url,
    })
}

// --- Session ---

/// login
///
/// [Public Route] Records a login. The token was issued by the booking API;
/// the gateway only stores it (and the admin marker) in HttpOnly cookies.
///
/// Responds with the page to continue on: the sanitized `redirect` the user was
/// bounced from, otherwise the default landing page.
#[utoipa::path(
    post,
    path = "/session",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = SessionResponse),
        (status = 400, description = "Empty token")
    )
)]
pub async fn login(
    State(config): State<AppConfig>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<SessionResponse>), StatusCode> {
    let token = payload.token.trim();
    if token.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let store = MemorySessionStore::new();
    session::establish(&store, token, payload.is_admin)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    let jar = write_session_cookies(jar, &store, config.env == Env::Production)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let location = safe_redirect(payload.redirect.as_deref());
    tracing::info!(admin = payload.is_admin, %location, "session established");
    Ok((jar, Json(SessionResponse { location })))
}

/// logout
///
/// [Public Route] Expires the session cookies and points the SPA at login.
#[utoipa::path(
    delete,
    path = "/session",
    responses((status = 200, description = "Logged out", body = SessionResponse))
)]
pub async fn logout(
    State(config): State<AppConfig>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<SessionResponse>), StatusCode> {
    let store = MemorySessionStore::from_cookies(&jar);
    session::clear(&store)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    let jar = write_session_cookies(jar, &store, config.env == Env::Production)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    tracing::info!("session cleared");
    Ok((
        jar,
        Json(SessionResponse {
            location: LOGIN_PATH.to_string(),
        }),
    ))
}

/// Accepts only same-origin relative paths as post-login targets.
fn safe_redirect(raw: Option<&str>) -> String {
    match raw {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path.to_string()
        }
        _ => DEFAULT_PATH.to_string(),
    }
}

// --- Pages ---

/// render_page
///
/// [Guarded Route] Serves every SPA page. The guard runs before the shell is
/// produced; a redirect decision becomes `303 See Other`.
pub async fn render_page(
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    let location = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    let target = state.routes.resolve(location);
    let decision = guard::check(&target, session);
    tracing::debug!(to = %target.full_path, ?session, ?decision, "page guard");

    if let NavigationDecision::Proceed = decision {
        let status = if target.is_not_found() {
            StatusCode::NOT_FOUND
        } else {
            StatusCode::OK
        };
        return (status, Html(page_shell(target.view, &state.config.api_base_url))).into_response();
    }

    match decision.location() {
        Some(to) => Redirect::to(&to).into_response(),
        None => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

/// The HTML shell the SPA mounts into. The view is named, not rendered.
fn page_shell(view: View, api_base_url: &str) -> String {
    format!(
        "<!doctype html>\n<html lang=\"en\">\n<head><meta charset=\"utf-8\"><title>Room Booking</title></head>\n<body><div id=\"app\" data-view=\"{}\" data-api-base=\"{}\"></div></body>\n</html>\n",
        view.as_str(),
        escape_attr(api_base_url)
    )
}

fn escape_attr(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

// --- API Proxy ---

/// proxy_api
///
/// [Proxy Route] Forwards `/api/*` to the booking backend and stamps the CORS
/// headers on whatever comes back. Preflights are answered locally.
pub async fn proxy_api(
    State(config): State<AppConfig>,
    State(upstream): State<UpstreamState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let mut response = if method == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        match forward(&config, upstream, method, uri, headers, body).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, status = %e.status(), "proxy request failed");
                e.into_response()
            }
        }
    };

    response
        .headers_mut()
        .extend(proxy::cors_headers(&config.allowed_origin));
    response
}

async fn forward(
    config: &AppConfig,
    upstream: UpstreamState,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Body,
) -> Result<Response, ProxyError> {
    let limit = config.max_body_bytes;
    let declared_length = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared_length.is_some_and(|len| len > limit) {
        return Err(ProxyError::BodyTooLarge { limit });
    }

    let bytes = body::to_bytes(body, limit)
        .await
        .map_err(|e| ProxyError::UnreadableBody(e.to_string()))?;

    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());

    let request = proxy::prepare(method, path_and_query, &headers, bytes)?;
    let response = upstream.send(request).await?;
    Ok(response.into_response())
}
