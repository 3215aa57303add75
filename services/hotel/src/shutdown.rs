//! Termination signals as a cancellation token

use anyhow::{Context, Result};
use tokio::signal::unix::{signal, SignalKind};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Cancel `token` on the first SIGTERM or SIGINT
pub fn watch_signals(token: CancellationToken) -> Result<JoinHandle<()>> {
    let mut terminate =
        signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
    let mut interrupt =
        signal(SignalKind::interrupt()).context("Failed to install SIGINT handler")?;

    Ok(tokio::spawn(async move {
        tokio::select! {
            _ = terminate.recv() => warn!("Received SIGTERM, shutting down"),
            _ = interrupt.recv() => warn!("Received SIGINT, shutting down"),
            _ = token.cancelled() => return,
        }
        token.cancel();
    }))
}
