use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal as unix_signal};

#[cfg(unix)]
async fn wait_for_stop_signal() -> Option<()> {
    let mut sigterm_stream = unix_signal(SignalKind::terminate()).ok()?;
    tokio::select! {
        _ = sigterm_stream.recv() => {
            info!("SIGTERM received, cancelling the run.");
            Some(())
        }
        Ok(()) = tokio::signal::ctrl_c() => {
            info!("Ctrl+C received, cancelling the run.");
            Some(())
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_stop_signal() -> Option<()> {
    tokio::signal::ctrl_c().await.ok()?;
    info!("Ctrl+C received, cancelling the run.");
    Some(())
}

/// Cancels `token` on the first stop signal. Returns early if the token is
/// cancelled by someone else first.
pub async fn cancel_on_stop_signals(token: CancellationToken) {
    tokio::select! {
        received = wait_for_stop_signal() => match received {
            Some(()) => token.cancel(),
            None => warn!("Could not install stop signal handlers"),
        },
        _ = token.cancelled() => {}
    }
}
