//! pricewatch server - headless price monitor
//!
//! Polls the configured exchange for every pair in the trading config,
//! raises threshold and percent-move alerts through ntfy, and logs a price
//! summary periodically.
//!
//! # Usage
//! ```sh
//! PRICE_EXCHANGE=okx NTFY_TOPIC=my_alerts cargo run --bin server -- --futures
//! ```

use anyhow::Result;
use clap::Parser;
use pricewatch::application::system::Application;
use pricewatch::config::Config;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{Level, info, warn};
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Trading config file (overrides TRADING_CONFIG_PATH)
    #[arg(long)]
    config: Option<PathBuf>,

    /// No-futures pair file (overrides NO_FUTURES_PATH)
    #[arg(long)]
    no_futures_file: Option<PathBuf>,

    /// Start in futures mode
    #[arg(long)]
    futures: bool,

    /// Build everything but do not start monitoring
    #[arg(long)]
    no_autostart: bool,

    /// Seconds between price summary log lines (0 disables)
    #[arg(long, default_value = "60")]
    summary_interval: u64,

    /// Send a test notification at startup
    #[arg(long)]
    test_notification: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load environment variables
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    info!("pricewatch server {} starting...", env!("CARGO_PKG_VERSION"));

    let mut config = Config::from_env()?;
    if let Some(path) = cli.config {
        config.storage.trading_config_path = path;
    }
    if let Some(path) = cli.no_futures_file {
        config.storage.no_futures_path = path;
    }
    if cli.futures {
        config.monitor.futures_mode = true;
    }
    info!(
        "Configuration loaded: exchange={:?}, poll={:?}, cooldown={:?}",
        config.exchange, config.monitor.poll_interval, config.monitor.alert_cooldown
    );

    let app = Application::build(config).await?;
    let monitor = app.monitor.clone();

    let pairs = monitor.list_pairs().await?;
    if pairs.is_empty() {
        warn!(
            "No trading pairs configured; add some to {:?}",
            app.config.storage.trading_config_path
        );
    } else {
        let symbols: Vec<&str> = pairs.iter().map(|p| p.symbol.as_str()).collect();
        info!("Monitoring pairs: {}", symbols.join(", "));
    }

    if cli.test_notification {
        match monitor.send_test_notification().await {
            Ok(()) => info!("Test notification sent"),
            Err(e) => warn!("Test notification failed: {}", e),
        }
    }

    if cli.no_autostart {
        info!("Autostart disabled; monitoring is idle.");
    } else {
        monitor.start().await;
    }

    if cli.summary_interval > 0 {
        let monitor = monitor.clone();
        let period = Duration::from_secs(cli.summary_interval);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;
            loop {
                interval.tick().await;
                if !monitor.session_status().active {
                    continue;
                }
                match monitor.price_summary().await {
                    Ok(rows) => {
                        for row in rows {
                            match row.price {
                                Some(price) => info!(
                                    "{}: {} ({:?}) upper={:?} lower={:?}",
                                    row.symbol,
                                    price,
                                    row.mode,
                                    row.upper,
                                    row.lower
                                ),
                                None => info!("{}: no price yet", row.symbol),
                            }
                        }
                    }
                    Err(e) => warn!("Failed to build price summary: {:#}", e),
                }
            }
        });
    }

    info!("Server running. Press Ctrl+C to shutdown.");
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Stopping monitor...");
    monitor.stop().await;

    Ok(())
}
