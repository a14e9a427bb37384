use axum::{Router, extract::FromRef, http::HeaderName};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core domain: the page table, the session seam and the guard between them.
pub mod route_table;
pub mod session;
pub mod guard;

// HTTP surface and infrastructure.
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod proxy;

// Module for routing segregation (Public JSON, Proxy, Pages).
pub mod routes;
use routes::{pages, proxy as proxy_routes, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use handlers::RouteTableState;
pub use proxy::{HttpUpstream, UpstreamState};
pub use route_table::RouteTable;

/// ApiDoc
///
/// OpenAPI document for the gateway's JSON endpoints, served at
/// `/api-docs/openapi.json`. The proxy and page routes are not described.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::navigate, handlers::list_routes, handlers::client_config,
        handlers::login, handlers::logout
    ),
    components(
        schemas(
            models::View, models::RouteMeta, models::RouteSummary, models::DecisionKind,
            models::NavigationResponse, models::ClientConfig, models::SessionResponse,
            models::LoginRequest,
        )
    ),
    tags(
        (name = "roombook-gateway", description = "Room booking page gateway and API proxy")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single immutable container shared by every request: configuration, the
/// page table and the upstream the proxy forwards to.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub routes: RouteTableState,
    pub upstream: UpstreamState,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

impl FromRef<AppState> for RouteTableState {
    fn from_ref(app_state: &AppState) -> RouteTableState {
        app_state.routes.clone()
    }
}

impl FromRef<AppState> for UpstreamState {
    fn from_ref(app_state: &AppState) -> UpstreamState {
        app_state.upstream.clone()
    }
}

/// create_router
///
/// Assembles the gateway: JSON endpoints, the `/api` proxy, and the guarded
/// page fallback that catches every other path.
pub fn create_router(state: AppState) -> Router {
    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        // The proxy answers its own preflights and sets its own CORS headers.
        .merge(proxy_routes::proxy_routes())
        // Anything not matched above is a page request and goes through the guard.
        .merge(pages::page_routes())
        .with_state(state);

    base_router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(trace_span_logger)
                    .on_response(
                        DefaultOnResponse::new()
                            .level(Level::INFO)
                            .latency_unit(tower_http::LatencyUnit::Millis),
                    ),
            )
            .layer(PropagateRequestIdLayer::new(x_request_id)),
    )
}

/// trace_span_logger
///
/// Span for every request, correlated by the generated `x-request-id`.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
