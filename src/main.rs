// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use crate::application::aggregator::ChartPolicy;
use crate::application::counts_service::CountsService;
use crate::application::generator_controller::GeneratorConfigController;
use crate::application::live_feed::LiveFeed;
use crate::domain::validation::SumCheck;
use crate::infrastructure::api_client::HttpApiClient;
use crate::infrastructure::config::load_config;
use crate::presentation::app_state::AppState;
use crate::presentation::router::create_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .init();

    // Load configuration
    let config = load_config()?;

    // Create API client (infrastructure layer)
    let client = Arc::new(HttpApiClient::new(&config.upstream)?);

    // Create services (application layer)
    let counts_service = CountsService::new(
        client.clone(),
        ChartPolicy::history(config.charts.history_label_format.clone()),
        ChartPolicy::live(config.charts.live_label_format.clone()),
    );
    let live_feed = LiveFeed::new(counts_service.clone());
    let live_handle = live_feed.start(Duration::from_secs(config.polling.live_interval_secs));

    let mut controller = GeneratorConfigController::new(
        client,
        SumCheck::from_tolerance(config.validation.sum_tolerance),
    );
    if let Err(e) = controller.refresh_status().await {
        tracing::warn!("Generator status unavailable at startup: {}", e);
    }

    // Create application state
    let state = Arc::new(AppState {
        counts_service,
        live_feed,
        generator: Arc::new(tokio::sync::Mutex::new(controller)),
    });

    // Build router (presentation layer)
    let router = create_router(state);

    // Start server
    let addr: SocketAddr = config
        .server
        .listen_addr
        .parse()
        .with_context(|| format!("invalid listen address '{}'", config.server.listen_addr))?;
    tracing::info!("Starting traffic-dashboard service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await?;

    live_handle.stop();
    Ok(())
}
