use rust_address_api::{
    api::{self, handlers::AppState},
    config::Config,
    core::{known_places::KnownPlaces, normalizer::Normalizer},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the application.
///
/// Initializes tracing, configuration, the known-places map and the shared
/// HTTP client, then serves the router with per-IP rate limiting on the
/// query endpoint.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rust_address_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    let known_places = match config.known_places_file {
        Some(ref path) => KnownPlaces::from_file(path)?,
        None => KnownPlaces::default(),
    };
    let normalizer = Normalizer::new(known_places);

    let port = config.port;
    let app_state = Arc::new(AppState::new(config, normalizer)?);
    tracing::info!("AMap client initialized");

    // Configure rate limiter: 10 requests/second per IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Invalid rate limiter configuration"))?,
    );

    // Health check stays outside the rate limiter
    let query_routes = api::query_routes().layer(GovernorLayer {
        config: governor_conf,
    });
    let app = api::build_router(app_state, query_routes);

    // Start server
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
