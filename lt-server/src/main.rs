//! Laptrace Server
//!
//! Serves the speed-distance and long-run chart pages plus the JSON/SVG API

use anyhow::Result;
use lt_server::{
    api,
    config::{Settings, CONFIG_FILE},
    state,
};
use std::path::Path;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting Laptrace Server");

    let settings = Settings::load(Path::new(CONFIG_FILE))?;

    // Create application state; the provider cache lives as long as the process
    let state = state::AppState::from_settings(&settings)?;

    // Build the router
    let app = api::create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(settings.bind).await?;
    info!("Server listening on http://{}", settings.bind);
    axum::serve(listener, app).await?;

    Ok(())
}
