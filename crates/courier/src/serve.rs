// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `courier serve` command implementation.
//!
//! Opens the SQLite store, builds the HTTP sender, and runs the dispatch
//! loop until SIGINT or SIGTERM. In-flight sends are finished and recorded
//! before the process exits.

use std::sync::Arc;

use courier_config::{render_errors, validate_for_serve, CourierConfig};
use courier_core::{CourierError, DispatchStore, HealthStatus, PluginAdapter};
use courier_dispatch::shutdown;
use courier_dispatch::{DispatchLoop, DispatchSettings};
use courier_sender::HttpSender;
use courier_storage::SqliteStore;
use tracing::{info, warn};

/// Runs the `courier serve` command.
pub async fn run_serve(config: CourierConfig) -> Result<(), CourierError> {
    init_tracing(&config.worker.log_level);

    if let Err(errors) = validate_for_serve(&config) {
        render_errors(&errors);
        return Err(CourierError::Config(
            "configuration is not valid for serve".to_string(),
        ));
    }

    info!(worker = %config.worker.name, "starting courier serve");

    let store = Arc::new(SqliteStore::new(config.storage.clone()));
    store.initialize().await?;
    report_health(store.as_ref()).await;

    let sender = Arc::new(HttpSender::new(&config.sender)?);
    info!(
        base_url = %config.sender.base_url,
        timeout_secs = sender.timeout().as_secs(),
        "sender ready"
    );

    let cancel = shutdown::install_signal_handler();
    let settings = DispatchSettings::from_config(&config.dispatch, &config.sender);
    let dispatch = DispatchLoop::new(store.clone(), sender.clone(), settings);

    // Closes the store once the last cycle has finished.
    dispatch.run(cancel).await?;
    sender.shutdown().await?;

    info!("courier serve stopped");
    Ok(())
}

async fn report_health(adapter: &dyn PluginAdapter) {
    match adapter.health_check().await {
        Ok(HealthStatus::Healthy) => info!(adapter = adapter.name(), "adapter healthy"),
        Ok(status) => warn!(adapter = adapter.name(), ?status, "adapter not fully healthy"),
        Err(e) => warn!(adapter = adapter.name(), error = %e, "adapter health check failed"),
    }
}

/// `RUST_LOG` overrides the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("courier={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
