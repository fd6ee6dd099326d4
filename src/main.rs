//! Access log DDoS detector
//!
//! This is the main entry point. It loads the configuration, wires the
//! scanner and runs it until SIGINT or SIGTERM.

use std::time::Duration;

use anyhow::{Context, Result};
use dotenv::dotenv;
use log::{error, info};
use tokio_util::sync::CancellationToken;

use ddos_log_detector::config;
use ddos_log_detector::core::monitoring;
use ddos_log_detector::scanner::Scanner;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    env_logger::init();

    info!("Starting the log detector...");

    let settings = config::load_settings().context("failed to load configuration")?;
    let scanner = Scanner::from_settings(&settings).context("invalid configuration")?;

    if let Some(addr) = &settings.metrics_addr {
        monitoring::install_exporter(addr)?;
    }

    let cancel = CancellationToken::new();
    tokio::spawn(shutdown_on_signal(cancel.clone()));

    scanner
        .run(Duration::from_secs(settings.read_interval_secs), cancel)
        .await;

    info!("Log detector stopped");
    Ok(())
}

async fn shutdown_on_signal(cancel: CancellationToken) {
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!("Failed to listen for SIGINT: {}", e);
                return;
            }
        }
        _ = terminate => {}
    }

    cancel.cancel();
}
