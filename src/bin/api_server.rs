// API Server Binary Entry Point
//
// Purpose: Start the Axum server for the portfolio site and admin API
// Usage: cargo run --bin api_server

use portfolio_cms::{create_router, AppState, ServerConfig};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing (structured logging)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    // Default log level: info for our crate, warn for others
                    "portfolio_cms=info,tower_http=debug,axum=debug,warn".into()
                }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting portfolio server...");

    // Configuration from environment variables
    // Default: ./data (local development)
    let config = ServerConfig::from_env();
    config.log_summary();
    let port = config.port;

    // Initialize application state (opens store, seeds on first run)
    tracing::info!("Initializing application state...");
    let state = AppState::new(config).await?;
    tracing::info!("Application state initialized successfully");

    // Create router with all endpoints and middleware
    let app = create_router(state);

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .await?;

    Ok(())
}
