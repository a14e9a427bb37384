use roombook_gateway::{
    AppState, HttpUpstream, RouteTable, UpstreamState,
    config::{AppConfig, Env},
    create_router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, installs logging, builds the page table and the
/// upstream client, then serves the gateway.
#[tokio::main]
async fn main() {
    // 1. Configuration (fail-fast on missing production settings).
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging: RUST_LOG wins, otherwise sensible local defaults.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "roombook_gateway=debug,tower_http=info,axum=trace".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // JSON lines for the log aggregator.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Gateway starting in {:?} mode", config.env);

    // 3. Page table. Static, so a failure here is a bug in the declarations.
    let routes = Arc::new(RouteTable::booking_app().expect("FATAL: invalid page table"));

    // 4. Upstream booking backend.
    let upstream = Arc::new(
        HttpUpstream::new(&config.backend_origin).expect("FATAL: failed to build the HTTP client"),
    ) as UpstreamState;
    tracing::info!(backend = %config.backend_origin, allowed_origin = %config.allowed_origin, "API proxy configured");

    let bind_addr = config.bind_addr.clone();
    let app = create_router(AppState {
        config,
        routes,
        upstream,
    });

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: failed to bind listener. Check BIND_ADDR.");

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at /swagger-ui");

    axum::serve(listener, app).await.expect("FATAL: server error");
}
