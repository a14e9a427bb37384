use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, Bytes},
    http::{HeaderValue, Method, Request, Response, StatusCode, header},
};
use roombook_gateway::{
    AppConfig, AppState, RouteTable, create_router,
    error::ProxyError,
    proxy::{ALLOW_HEADERS, ALLOW_METHODS, Upstream, UpstreamRequest, UpstreamResponse},
};
use futures::stream;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower::util::ServiceExt;

// --- Stub Upstream ---

/// Records every forwarded request and answers `201 booked`.
#[derive(Default)]
struct RecordingUpstream {
    seen: Mutex<Vec<UpstreamRequest>>,
}

#[async_trait]
impl Upstream for RecordingUpstream {
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, ProxyError> {
        self.seen.lock().await.push(request);
        Ok(UpstreamResponse {
            status: StatusCode::CREATED,
            content_type: Some(HeaderValue::from_static("text/plain")),
            location: None,
            body: Bytes::from_static(b"booked"),
        })
    }
}

// --- Helper Functions ---

const ORIGIN: &str = "https://rooms.example.net";

fn app_with(upstream: Arc<RecordingUpstream>) -> Router {
    let config = AppConfig {
        allowed_origin: ORIGIN.to_string(),
        max_body_bytes: 64,
        ..AppConfig::default()
    };
    create_router(AppState {
        config,
        routes: Arc::new(RouteTable::booking_app().unwrap()),
        upstream,
    })
}

fn app() -> Router {
    app_with(Arc::new(RecordingUpstream::default()))
}

async fn get_with_cookies(uri: &str, cookies: Option<&str>) -> Response<Body> {
    let mut request = Request::builder().method(Method::GET).uri(uri);
    if let Some(cookies) = cookies {
        request = request.header(header::COOKIE, cookies);
    }
    app()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(response: &Response<Body>) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

// --- Public Endpoints ---

#[tokio::test]
async fn health_check() {
    let response = get_with_cookies("/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}

#[tokio::test]
async fn route_table_is_listed() {
    let response = get_with_cookies("/routes", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let routes: Value = serde_json::from_str(&body_string(response).await).unwrap();
    let routes = routes.as_array().unwrap();
    assert_eq!(routes.len(), 12);
    let edit_room = routes.iter().find(|r| r["name"] == "editRoom").unwrap();
    assert_eq!(edit_room["path"], "/rooms/:id/edit");
    assert_eq!(edit_room["requiresAdmin"], true);
}

#[tokio::test]
async fn client_config_exposes_api_base() {
    let response = get_with_cookies("/config", None).await;
    let config: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(config["apiBaseUrl"], "/api");
}

#[tokio::test]
async fn navigation_query_for_admin_page_while_logged_out() {
    let response = get_with_cookies("/navigation?to=%2Frooms", Some("isAdmin=on")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let decision: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(decision["decision"], "redirect_to_login");
    assert_eq!(decision["location"], "/?redirect=%2Frooms");
    assert_eq!(decision["route"], "rooms");
}

#[tokio::test]
async fn navigation_query_for_admin() {
    let response =
        get_with_cookies("/navigation?to=%2FcreateUser", Some("token=abc; isAdmin=true")).await;
    let decision: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(decision["decision"], "proceed");
    assert_eq!(decision["location"], Value::Null);
}

// --- Guarded Pages ---

#[tokio::test]
async fn anonymous_page_request_redirects_to_login() {
    let response = get_with_cookies("/bookings", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/?redirect=%2Fbookings");
}

#[tokio::test]
async fn admin_flag_without_token_still_goes_to_login() {
    let response = get_with_cookies("/rooms", Some("isAdmin=on")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/?redirect=%2Frooms");
}

#[tokio::test]
async fn non_admin_goes_home() {
    for cookies in ["token=abc; isAdmin=off", "token=abc"] {
        let response = get_with_cookies("/createRoom", Some(cookies)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{cookies}");
        assert_eq!(location(&response), "/home");
    }
}

#[tokio::test]
async fn admin_reaches_admin_pages() {
    for flag in ["on", "true"] {
        let cookies = format!("token=abc; isAdmin={flag}");
        let response = get_with_cookies("/createUser", Some(&cookies)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await.contains("data-view=\"CreateUser\""));
    }
}

#[tokio::test]
async fn public_pages_ignore_session() {
    for cookies in [None, Some("token=abc"), Some("token=abc; isAdmin=true")] {
        let response = get_with_cookies("/about", cookies).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn unknown_page_is_not_found() {
    let response = get_with_cookies("/does/not/exist", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_string(response).await.contains("data-view=\"NotFound\""));
}

#[tokio::test]
async fn pages_only_answer_get() {
    let response = app()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/home")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// --- Session ---

async fn send_json(method: Method, uri: &str, cookies: Option<&str>, body: Value) -> Response<Body> {
    let mut request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookies) = cookies {
        request = request.header(header::COOKIE, cookies);
    }
    app()
        .oneshot(request.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap()
}

#[tokio::test]
async fn admin_login_sets_canonical_marker() {
    let response = send_json(
        Method::POST,
        "/session",
        None,
        serde_json::json!({ "token": "abc", "isAdmin": true, "redirect": "/createRoom" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookies = set_cookies(&response);
    let token = cookies.iter().find(|c| c.starts_with("token=abc")).unwrap();
    assert!(token.contains("HttpOnly"));
    assert!(token.contains("SameSite=Lax"));
    assert!(cookies.iter().any(|c| c.starts_with("isAdmin=true")));

    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["location"], "/createRoom");
}

#[tokio::test]
async fn token_with_separators_survives_cookie_round_trip() {
    let response = send_json(
        Method::POST,
        "/session",
        None,
        serde_json::json!({ "token": "a;b,c" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookies = set_cookies(&response);
    let token = cookies.iter().find(|c| c.starts_with("token=")).unwrap();
    let pair = token.split(';').next().unwrap();
    assert_eq!(pair, "token=a%3Bb%2Cc");

    let response = get_with_cookies("/bookings", Some(pair)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn plain_login_drops_stale_admin_cookie() {
    let response = send_json(
        Method::POST,
        "/session",
        Some("isAdmin=true"),
        serde_json::json!({ "token": "abc", "redirect": "https://evil.example" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookies = set_cookies(&response);
    let admin = cookies.iter().find(|c| c.starts_with("isAdmin=")).unwrap();
    assert!(admin.contains("Max-Age=0"));

    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["location"], "/home");
}

#[tokio::test]
async fn blank_token_is_rejected() {
    let response = send_json(
        Method::POST,
        "/session",
        None,
        serde_json::json!({ "token": "   " }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn logout_expires_cookies() {
    let response = app()
        .oneshot(
            Request::builder()
                .method(Method::DELETE)
                .uri("/session")
                .header(header::COOKIE, "token=abc; isAdmin=true")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookies = set_cookies(&response);
    for name in ["token=", "isAdmin="] {
        let cookie = cookies.iter().find(|c| c.starts_with(name)).unwrap();
        assert!(cookie.contains("Max-Age=0"), "{cookie}");
    }
    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["location"], "/");
}

// --- Proxy ---

fn assert_cors(response: &Response<Body>) {
    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], ORIGIN);
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], ALLOW_METHODS);
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], ALLOW_HEADERS);
}

#[tokio::test]
async fn preflight_is_answered_locally() {
    let upstream = Arc::new(RecordingUpstream::default());
    let response = app_with(upstream.clone())
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/rooms")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_cors(&response);
    assert!(upstream.seen.lock().await.is_empty());
}

#[tokio::test]
async fn get_with_body_is_rejected() {
    let upstream = Arc::new(RecordingUpstream::default());
    let response = app_with(upstream.clone())
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri("/api/rooms")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_cors(&response);
    assert_eq!(body_string(response).await, "GET requests cannot have a body");
    assert!(upstream.seen.lock().await.is_empty());
}

#[tokio::test]
async fn post_is_forwarded_verbatim() {
    let upstream = Arc::new(RecordingUpstream::default());
    let response = app_with(upstream.clone())
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/bookings?roomId=4")
                .header(header::HOST, "gateway.local")
                .header(header::AUTHORIZATION, "Bearer abc")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{\"date\":\"2026-10-20\"}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_cors(&response);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
    assert_eq!(body_string(response).await, "booked");

    let seen = upstream.seen.lock().await;
    assert_eq!(seen.len(), 1);
    let forwarded = &seen[0];
    assert_eq!(forwarded.method, Method::POST);
    assert_eq!(forwarded.path_and_query, "/api/bookings?roomId=4");
    assert_eq!(forwarded.headers[header::AUTHORIZATION], "Bearer abc");
    assert!(forwarded.headers.get(header::HOST).is_none());
    assert_eq!(
        forwarded.body.as_deref(),
        Some(&b"{\"date\":\"2026-10-20\"}"[..])
    );
}

#[tokio::test]
async fn oversized_body_is_refused() {
    let upstream = Arc::new(RecordingUpstream::default());
    let response = app_with(upstream.clone())
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/rooms")
                .header(header::CONTENT_LENGTH, "65")
                .body(Body::from(vec![b'x'; 65]))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_cors(&response);
    assert!(upstream.seen.lock().await.is_empty());
}

#[tokio::test]
async fn chunked_body_over_limit_is_unreadable() {
    let upstream = Arc::new(RecordingUpstream::default());
    let chunks = (0..3).map(|_| Ok::<_, std::io::Error>(Bytes::from(vec![b'x'; 30])));
    let response = app_with(upstream.clone())
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/rooms")
                .body(Body::from_stream(stream::iter(chunks)))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_cors(&response);
    assert!(upstream.seen.lock().await.is_empty());
}
