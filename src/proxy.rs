use crate::error::ProxyError;
use async_trait::async_trait;
use axum::{
    body::{Body, Bytes},
    http::{HeaderMap, HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

pub const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, PATCH, OPTIONS";
pub const ALLOW_HEADERS: &str = "Origin, X-Requested-With, Content-Type, Accept, Authorization";

/// Headers that describe the client connection rather than the request, plus
/// the ones reqwest recomputes for the new hop.
const SKIPPED_REQUEST_HEADERS: [&str; 10] = [
    "host",
    "content-length",
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
];

/// UpstreamRequest
///
/// A browser request prepared for forwarding.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    /// Original path and query, appended verbatim to the backend origin.
    pub path_and_query: String,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

/// UpstreamResponse
///
/// What the backend answered. Status and body bytes are relayed unchanged;
/// `location` carries a backend redirect target back to the browser.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    pub location: Option<HeaderValue>,
    pub body: Bytes,
}

/// Upstream
///
/// The booking backend seam. `HttpUpstream` talks to the real origin; tests
/// substitute recording stubs.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, ProxyError>;
}

/// Type alias for the dynamically dispatched upstream.
pub type UpstreamState = Arc<dyn Upstream>;

/// HttpUpstream
///
/// Forwards over HTTP with a shared reqwest client. The client never follows
/// redirects itself: a backend 3xx goes back to the browser as is.
#[derive(Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
    origin: String,
}

impl HttpUpstream {
    pub fn new(origin: &str) -> Result<Self, ProxyError> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self {
            client,
            origin: origin.trim_end_matches('/').to_string(),
        })
    }

    pub fn url_for(&self, path_and_query: &str) -> String {
        format!("{}{}", self.origin, path_and_query)
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, ProxyError> {
        let url = self.url_for(&request.path_and_query);
        tracing::debug!(method = %request.method, %url, "forwarding to backend");

        let mut builder = self
            .client
            .request(request.method, url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let content_type = response.headers().get(header::CONTENT_TYPE).cloned();
        let location = response.headers().get(header::LOCATION).cloned();
        let body = response.bytes().await?;

        Ok(UpstreamResponse {
            status,
            content_type,
            location,
            body,
        })
    }
}

/// The CORS headers attached to every proxy response.
pub fn cors_headers(allowed_origin: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    // An origin that is not a valid header value leaves the header off, which
    // browsers treat as a CORS denial.
    match HeaderValue::from_str(allowed_origin) {
        Ok(origin) => {
            headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        }
        Err(_) => tracing::error!(allowed_origin, "ALLOWED_ORIGIN is not a valid header value"),
    }
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
    headers
}

/// Copies the request headers that make sense on the next hop.
pub fn forwardable_headers(incoming: &HeaderMap) -> HeaderMap {
    let mut headers = incoming.clone();
    for name in SKIPPED_REQUEST_HEADERS {
        headers.remove(name);
    }
    headers
}

/// prepare
///
/// Builds the upstream request. GET must not carry a body; every other method
/// forwards whatever the browser sent.
pub fn prepare(
    method: Method,
    path_and_query: String,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<UpstreamRequest, ProxyError> {
    let body = if method == Method::GET {
        if !body.is_empty() {
            return Err(ProxyError::GetWithBody);
        }
        None
    } else {
        Some(body)
    };

    Ok(UpstreamRequest {
        method,
        path_and_query,
        headers: forwardable_headers(headers),
        body,
    })
}

impl IntoResponse for UpstreamResponse {
    fn into_response(self) -> Response {
        let content_type = self
            .content_type
            .unwrap_or_else(|| HeaderValue::from_static("application/json"));
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        let headers = response.headers_mut();
        headers.insert(header::CONTENT_TYPE, content_type);
        if let Some(location) = self.location {
            headers.insert(header::LOCATION, location);
        }
        response
    }
}
