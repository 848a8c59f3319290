mod configuration;
mod error;
mod routes;
mod state;

use anyhow::Context;
use taleweaver::content::ContentStore;
use taleweaver::narrator::Narrator;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let settings = configuration::Settings::new()?;

    let content = ContentStore::new(settings.content.root.clone());
    info!(root = %content.root().display(), "serving content");
    let narrator = Narrator::from_configs(
        content,
        settings.agent.loop_settings(),
        settings.provider_configs(),
    )?;

    let shutdown = CancellationToken::new();
    let state = state::AppState::new(narrator, shutdown.clone());

    // Create router with CORS support
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::configure(state).layer(cors);

    let addr = settings
        .server
        .socket_addr()
        .context("invalid server host or port")?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;
    info!("server stopped");
    Ok(())
}

// Cancels in-flight turns once Ctrl-C arrives
async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutting down");
    shutdown.cancel();
}
