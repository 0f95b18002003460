mod config;
mod errors;
mod extract;
mod llm_client;
mod proposal;
mod routes;
mod state;
mod text;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::ProviderKind;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first; invalid values abort startup
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Proposal API v{}", env!("CARGO_PKG_VERSION"));

    for kind in ProviderKind::ALL {
        match config.providers.resolve(kind) {
            Some(provider) => info!("Provider {} ready (model: {})", kind, provider.model()),
            None => info!("Provider {} not configured", kind),
        }
    }
    info!("Default provider: {}", config.default_provider);
    if !config.providers.is_configured(config.default_provider) {
        warn!(
            "Default provider {} has no credentials; requests must name another provider",
            config.default_provider
        );
    }

    let state = AppState::new(config.clone())?;

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
