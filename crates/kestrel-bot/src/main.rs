//! Kestrel trading bot entry point.

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Kestrel automated trading bot
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via KESTREL_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    kestrel_bot::init_logging();

    info!("Starting Kestrel v{}", env!("CARGO_PKG_VERSION"));

    // Config path: CLI arg > KESTREL_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("KESTREL_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    info!(config_path = %config_path, "Loading configuration");
    let config = kestrel_bot::AppConfig::from_file(&config_path)?;
    info!(symbol = %config.trading.symbol, broker = ?config.broker.kind, "Configuration loaded");

    let mut engine = kestrel_bot::TradingEngine::new(&config)?;

    // Ctrl-C is honored at the next cycle boundary.
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });

    engine.run(shutdown_rx).await?;
    Ok(())
}
