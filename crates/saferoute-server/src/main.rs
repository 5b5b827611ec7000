//! Saferoute Server - hazard-aware walking directions over HTTP

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use saferoute_server::{api, config::Config, state::AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("saferoute_server=debug".parse()?),
        )
        .init();

    tracing::info!("Starting saferoute server...");

    let config = Config::from_env();
    let port = config.server_port;

    // A hazard catalog that does not load is fatal: no filtering without it.
    let state = Arc::new(AppState::from_config(&config)?);
    tracing::info!(
        catalog = %config.catalog_path.display(),
        hazards = state.pipeline().catalog().len(),
        corridor_width_m = config.pipeline.corridor_width_m,
        utm_zone = config.pipeline.utm_zone,
        "Detour pipeline ready"
    );

    let app = api::routes().with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
