//! OS signal handling.
//!
//! The first termination signal starts the graceful stop; a second one at
//! any point during shutdown forces the process down immediately.

use tokio::signal;

/// Resolve when a termination signal arrives (Ctrl+C, plus SIGTERM on Unix).
pub async fn termination_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal as unix_signal, SignalKind};

        let mut terminate =
            unix_signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");

        tokio::select! {
            result = signal::ctrl_c() => {
                result.expect("failed to install Ctrl+C handler");
            }
            _ = terminate.recv() => {}
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    }
}

/// Arm the forced-exit escape hatch: the next termination signal terminates
/// the process with exit code 1 without waiting for drain to finish.
pub fn arm_forced_exit() {
    tokio::spawn(async {
        termination_signal().await;
        tracing::error!("terminating on repeated shutdown signal");
        std::process::exit(1);
    });
}
