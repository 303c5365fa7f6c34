pub mod bridge;
pub mod config;
pub mod error;
pub mod mqtt;
pub mod radio;
pub mod status;
pub mod telemetry;

#[cfg(test)]
mod testing;

use crate::bridge::{Bridge, Initializing};
use crate::config::{ConfigProvider, StationConfig};
use crate::mqtt::mqtt_handler::RumqttTransport;
use crate::radio::LoggingRadio;
use color_eyre::{eyre::eyre, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

const FIRMWARE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let config = StationConfig::load_or_default().await?;
    let timing = config.timing.clone();
    let config: Arc<dyn ConfigProvider> = Arc::new(config);

    info!("Starting groundlink {}", FIRMWARE_VERSION);
    let bridge = Bridge::<Initializing>::create(
        config,
        &timing,
        Box::new(RumqttTransport::new(timing.poll_timeout())),
        Box::new(LoggingRadio),
        FIRMWARE_VERSION,
    )
    .start();

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl-C received, shutting down");
                signal_token.cancel();
            }
            Err(e) => error!("Unable to listen for shutdown signal: {}", e),
        }
    });

    // The bridge loop blocks, keep it off the runtime workers
    let result = tokio::task::spawn_blocking(move || bridge.run_until_shutdown(shutdown))
        .await
        .map_err(|e| eyre!("Bridge task failed: {}", e))?;
    match result {
        Ok(_stopped) => {
            info!("Bridge stopped");
            Ok(())
        }
        Err(e) => {
            // Non-zero exit lets the service supervisor restart the station
            error!("Bridge terminated: {}", e);
            Err(e.into())
        }
    }
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    let level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|level| level.parse::<Level>().ok())
        .unwrap_or(Level::INFO);

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();
}
