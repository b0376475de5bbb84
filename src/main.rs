use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod codec;
mod config;
mod constants;
mod crypto;
mod error;
mod integrations;
mod models;
mod services;

use config::Config;
use constants::API_VERSION;
use integrations::headless::HeadlessStateService;
use services::arena_simulation::OsSeedSource;
use services::simulator::SeededArenaSimulator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "arena_sim_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    config.validate()?;

    tracing::info!("Starting arena simulation backend");
    tracing::info!("Environment: {}", config.environment);
    tracing::info!("API Version: {}", API_VERSION);

    let headless = HeadlessStateService::new(
        config.headless_endpoint.trim(),
        config.headless_jwt(),
        config.headless_timeout(),
    )?;
    tracing::info!("Reading state from {}", headless.endpoint());

    let app_state = api::AppState {
        table_root: config.table_sheet_root()?,
        config: config.clone(),
        state_service: Arc::new(headless),
        simulator: Arc::new(SeededArenaSimulator::new()),
        seeds: Arc::new(OsSeedSource),
    };

    let app = build_router(app_state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(state: api::AppState) -> Router {
    let cors = cors_from_config(&state.config);
    let timeout = state.config.request_timeout();

    Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        // Arena
        .route("/arena/simulate", post(api::arena::simulate))
        // Avatar state
        .route(
            "/avatar/{address}/world-information",
            get(api::world_information::get_world_information),
        )
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_from_config(config: &Config) -> CorsLayer {
    let raw = config.cors_allowed_origins.trim();
    if raw.is_empty() || raw == "*" {
        return CorsLayer::very_permissive();
    }

    let (allowed, rejected): (Vec<_>, Vec<_>) = raw
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| (origin, origin.parse::<HeaderValue>()))
        .partition(|(_, parsed)| parsed.is_ok());

    for (origin, _) in &rejected {
        tracing::warn!("Ignoring CORS origin {:?}: not a valid header value", origin);
    }
    let allowed: Vec<HeaderValue> = allowed
        .into_iter()
        .filter_map(|(_, parsed)| parsed.ok())
        .collect();

    if allowed.is_empty() {
        tracing::warn!("CORS_ALLOWED_ORIGINS has no usable origin; allowing any origin");
        return CorsLayer::very_permissive();
    }
    tracing::debug!("CORS restricted to {} origin(s)", allowed.len());

    // The API is read-only: GET for lookups, POST for simulations.
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::test_config;

    #[test]
    fn router_builds_with_test_state() {
        let state = crate::api::tests::test_state(Arc::new(
            crate::services::state_service::memory::MemoryStateService::new(),
        ));
        let _router = build_router(state);
    }

    #[test]
    fn cors_accepts_origin_lists() {
        let mut config = test_config();
        config.cors_allowed_origins = "http://localhost:5173, https://arena.example".to_string();
        let _layer = cors_from_config(&config);
        config.cors_allowed_origins = "*".to_string();
        let _layer = cors_from_config(&config);
    }

    #[tokio::test]
    async fn cors_allows_only_listed_origins() {
        let mut state = crate::api::tests::test_state(Arc::new(
            crate::services::state_service::memory::MemoryStateService::new(),
        ));
        state.config.cors_allowed_origins = "https://arena.example, bad\norigin".to_string();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, build_router(state)).await });

        let client = reqwest::Client::new();
        let health = format!("http://{}/health", addr);
        let allowed = client
            .get(&health)
            .header(header::ORIGIN, "https://arena.example")
            .send()
            .await
            .unwrap();
        assert_eq!(
            allowed.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://arena.example"
        );

        let other = client
            .get(&health)
            .header(header::ORIGIN, "https://elsewhere.example")
            .send()
            .await
            .unwrap();
        assert!(other.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }
}
