use anyhow::Result;
use tracing::{info, warn};

/// Resolves once the process is asked to stop (SIGTERM / SIGINT / Ctrl+C).
pub async fn wait_for_shutdown() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        tokio::select! {
            _ = sigterm.recv() => info!("shutdown: SIGTERM received"),
            _ = sigint.recv()  => info!("shutdown: SIGINT received"),
        }
        Ok(())
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("shutdown: Ctrl+C received");
        Ok(())
    }
}

/// Infallible wrapper suitable for `axum::serve(..).with_graceful_shutdown(..)`.
///
/// If signal handlers cannot be installed the future never resolves, so the
/// server keeps running instead of stopping immediately.
pub async fn shutdown_signal() {
    if let Err(e) = wait_for_shutdown().await {
        warn!(error = %e, "shutdown: failed to install signal handlers");
        std::future::pending::<()>().await;
    }
}
