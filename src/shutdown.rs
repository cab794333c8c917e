use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Cancels `cancel` on Ctrl+C or SIGTERM. The task ends on its own once the
/// token is cancelled by anyone else.
pub fn spawn_signal_handler(cancel: &CancellationToken) -> tokio::task::JoinHandle<()> {
    let cancel = cancel.clone();
    tokio::spawn(async move {
        #[cfg(unix)]
        let mut term_signal = match signal(SignalKind::terminate()) {
            Ok(signal) => Some(signal),
            Err(err) => {
                warn!("Failed to register SIGTERM handler: {}", err);
                None
            }
        };

        #[cfg(unix)]
        let terminated = async {
            if let Some(signal) = term_signal.as_mut() {
                signal.recv().await;
            } else {
                std::future::pending::<()>().await;
            }
        };
        #[cfg(not(unix))]
        let terminated = std::future::pending::<()>();

        tokio::select! {
            () = cancel.cancelled() => {}
            interrupted = tokio::signal::ctrl_c() => {
                if let Err(err) = interrupted {
                    warn!("Failed to listen for Ctrl+C: {}", err);
                    return;
                }
                info!("Interrupt received, stopping attack gracefully...");
                cancel.cancel();
            }
            () = terminated => {
                info!("SIGTERM received, stopping attack gracefully...");
                cancel.cancel();
            }
        }
    })
}
