//! Process signal handling and shutdown orchestration.

use std::process::ExitCode;
use std::time::Duration;

use tracing::info;

use crate::services::ServiceManager;

/// Waits for Ctrl-C or SIGTERM, then drains all services.
///
/// Returns the process exit code: success only when every service stopped
/// cleanly within the shutdown timeout.
pub async fn handle_shutdown_signals(
    manager: ServiceManager,
    shutdown_timeout_secs: u64,
) -> ExitCode {
    wait_for_signal().await;
    info!("shutdown signal received, draining services");

    let clean = manager
        .shutdown(Duration::from_secs(shutdown_timeout_secs))
        .await;
    if clean {
        info!("all services stopped cleanly");
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};
    let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
