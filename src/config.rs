use std::env;

/// Default request body ceiling for proxied API calls (10 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// AppConfig
///
/// Holds the gateway's entire configuration state. Immutable once loaded and
/// pulled into handlers via FromRef, as part of the shared AppState.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls log format and required settings.
    pub env: Env,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
    // Origin of the booking backend every /api request is forwarded to.
    pub backend_origin: String,
    // The single browser origin granted CORS access to the proxy.
    pub allowed_origin: String,
    // Base URL the SPA uses for API calls, published via GET /config.
    pub api_base_url: String,
    // Largest request body the proxy will buffer.
    pub max_body_bytes: usize,
}

/// Env
///
/// Defines the runtime context: a local development stack or the deployed
/// production gateway.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// default
    ///
    /// Safe, non-panicking configuration for test state setup. Does not touch
    /// the process environment.
    fn default() -> Self {
        Self {
            env: Env::Local,
            bind_addr: "127.0.0.1:0".to_string(),
            backend_origin: "http://localhost:8080".to_string(),
            allowed_origin: "http://localhost:5173".to_string(),
            api_base_url: "/api".to_string(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads all parameters from environment variables at startup.
    ///
    /// # Panics
    /// Panics if `BACKEND_ORIGIN` or `ALLOWED_ORIGIN` is missing in production,
    /// or if `MAX_BODY_BYTES` is set but not a number.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let max_body_bytes = match env::var("MAX_BODY_BYTES") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .expect("FATAL: MAX_BODY_BYTES must be a positive integer"),
            Err(_) => DEFAULT_MAX_BODY_BYTES,
        };

        match env {
            Env::Local => Self {
                env: Env::Local,
                bind_addr,
                backend_origin: normalize_origin(
                    env::var("BACKEND_ORIGIN")
                        .unwrap_or_else(|_| "http://localhost:8080".to_string()),
                ),
                allowed_origin: env::var("ALLOWED_ORIGIN")
                    .unwrap_or_else(|_| "http://localhost:5173".to_string()),
                // The Vite dev server proxies /api itself.
                api_base_url: "/api".to_string(),
                max_body_bytes,
            },
            Env::Production => {
                let backend_origin = normalize_origin(
                    env::var("BACKEND_ORIGIN").expect("FATAL: BACKEND_ORIGIN required in prod"),
                );
                let api_base_url = format!("{}/api", backend_origin);

                Self {
                    env: Env::Production,
                    bind_addr,
                    backend_origin,
                    allowed_origin: env::var("ALLOWED_ORIGIN")
                        .expect("FATAL: ALLOWED_ORIGIN required in prod"),
                    api_base_url,
                    max_body_bytes,
                }
            }
        }
    }
}

/// Strips trailing slashes so `origin + path` never produces `//`.
fn normalize_origin(origin: String) -> String {
    origin.trim_end_matches('/').to_string()
}
