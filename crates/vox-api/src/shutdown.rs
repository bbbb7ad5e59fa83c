//! Shutdown signals for the server.

use std::future::Future;
use std::io;

/// Resolves once `signal` fires. A listener that fails to install is logged
/// and never resolves, so the other signals still stop the server.
async fn signal_or_pending<F>(signal: F, name: &str)
where
    F: Future<Output = io::Result<()>>,
{
    match signal.await {
        Ok(()) => tracing::info!(signal = name, "shutdown requested"),
        Err(e) => {
            tracing::error!(signal = name, error = %e, "failed to listen for signal");
            std::future::pending::<()>().await;
        }
    }
}

/// Resolves when either signal fires.
pub async fn wait_for_shutdown<A, B>(interrupt: A, terminate: B)
where
    A: Future<Output = io::Result<()>>,
    B: Future<Output = io::Result<()>>,
{
    tokio::select! {
        _ = signal_or_pending(interrupt, "SIGINT") => {},
        _ = signal_or_pending(terminate, "SIGTERM") => {},
    }
}

/// Ctrl-C, plus SIGTERM on unix.
pub async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        signal(SignalKind::terminate())?.recv().await;
        Ok::<(), io::Error>(())
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<io::Result<()>>();

    wait_for_shutdown(tokio::signal::ctrl_c(), terminate).await;
}
