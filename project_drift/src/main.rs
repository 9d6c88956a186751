mod config;
mod shutdown;
mod worldgen;

use std::sync::Arc;
use std::time::Duration;

use drift::seed;
use drift::{Engine, EngineConfig};
use net::http::CreditSink;
use net::rate_limiter::ConnectionLimiter;
use net::ws_server::SessionHandler;

use crate::config::parse_cli_args;
use crate::worldgen::{TemplateContentGenerator, TemplateProfileGenerator};

#[tokio::main]
async fn main() {
    observability::init_logging();

    let config = parse_cli_args();
    tracing::info!("drift server starting");

    let (shutdown_tx, shutdown_rx) = shutdown::shutdown_channel();

    // Channels: engine -> output router -> per-session writers.
    let (output_tx, output_rx) = tokio::sync::mpsc::unbounded_channel();
    let (register_tx, register_rx) = tokio::sync::mpsc::unbounded_channel();
    let (unregister_tx, unregister_rx) = tokio::sync::mpsc::unbounded_channel();

    tokio::spawn(net::output_router::run_output_router(
        output_rx,
        register_rx,
        unregister_rx,
    ));

    let (state, spawn_room) = seed::seed_world();
    let content = Arc::new(TemplateContentGenerator::from_content_dir(
        &config.game.content_dir,
    ));
    let profiles = Arc::new(TemplateProfileGenerator::new());
    let engine = Engine::new(
        state,
        output_tx,
        content,
        profiles,
        EngineConfig {
            spawn_room,
            topup_base_url: config.game.topup_base_url.clone(),
        },
    );

    let limiter = ConnectionLimiter::new(config.to_limit_config());

    let ws_addr = config.net.ws_addr.clone();
    let ws_handler: Arc<dyn SessionHandler> = engine.clone();
    let ws_shutdown = shutdown_rx.clone().into_inner();
    tokio::spawn(async move {
        if let Err(e) = net::ws_server::run_ws_server_with_shutdown(
            ws_addr,
            ws_handler,
            register_tx,
            unregister_tx,
            limiter,
            ws_shutdown,
        )
        .await
        {
            tracing::error!("WebSocket server error: {}", e);
        }
    });

    let http_addr = config.net.http_addr.clone();
    let credit_sink: Arc<dyn CreditSink> = engine.clone();
    let http_shutdown = shutdown_rx.clone().into_inner();
    tokio::spawn(async move {
        if let Err(e) = net::http::run_topup_server(http_addr, credit_sink, http_shutdown).await {
            tracing::error!("Topup server error: {}", e);
        }
    });

    shutdown::wait_for_signal().await;
    tracing::info!("Shutdown signal received, stopping server...");
    shutdown_tx.trigger();
    engine.broadcast_farewell("The drift closes over the crossroads. Come back soon.");
    tokio::time::sleep(Duration::from_millis(300)).await;

    tracing::info!(players = engine.player_count(), "server stopped");
}
