use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use order_tracking::adapters::auth::JwtSessionValidator;
use order_tracking::adapters::websocket::{spawn_heartbeat, spawn_stats_logger, RealtimeHub};
use order_tracking::app::build_app;
use order_tracking::config::AppConfig;

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;
    init_tracing(&config);

    let validator = JwtSessionValidator::new(config.auth.jwt_secret.clone())
        .with_leeway(config.auth.leeway_secs);
    let hub = Arc::new(RealtimeHub::new(
        Arc::new(validator),
        config.realtime.outbound_buffer,
    ));

    let heartbeat = spawn_heartbeat(hub.clone(), config.realtime.heartbeat_interval());
    let stats = spawn_stats_logger(hub.clone(), config.realtime.stats_interval());

    let app = build_app(hub, &config.server)?;
    let address = config.server.socket_addr()?;
    let listener = TcpListener::bind(address).await?;
    tracing::info!(%address, environment = ?config.server.environment, "Order tracking server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    heartbeat.abort();
    stats.abort();
    tracing::info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
