// Rewards Gateway Service
// HTTP entry point for adding points, redeeming them FIFO, and reading balances

use rewards_gateway::{build_router, config::GatewayConfig, AppState};
use rewards_ledger::{spawn_ledger_actor, RewardLedger};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();

    let config = GatewayConfig::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log.level));
    if config.log.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_line_number(true)
            .init();
    }

    info!("Starting Rewards Gateway");

    let ledger_config = config.ledger_config();
    let ledger = spawn_ledger_actor(RewardLedger::new(), ledger_config.mailbox_capacity);
    info!(
        mailbox_capacity = ledger_config.mailbox_capacity,
        "Ledger actor started"
    );

    let app = build_router(AppState {
        ledger: ledger.clone(),
    });

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Rewards API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down ledger actor");
    ledger.shutdown().await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
