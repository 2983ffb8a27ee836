//! Shutdown coordination.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::broadcast;

/// Coordinator for graceful shutdown.
///
/// Provides a broadcast channel that all long-running tasks subscribe to,
/// guarded by a single-attempt latch: no matter how many times `trigger` is
/// called, or from how many tasks at once, the stop signal fires exactly
/// once.
pub struct Shutdown {
    /// Broadcast channel sender.
    tx: broadcast::Sender<()>,
    /// Set once the first trigger happens.
    triggered: AtomicBool,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            tx,
            triggered: AtomicBool::new(false),
        }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Fire the stop signal.
    ///
    /// Returns `false` if shutdown was already underway; the signal is not
    /// re-sent in that case.
    pub fn trigger(&self) -> bool {
        if self.triggered.swap(true, Ordering::SeqCst) {
            return false;
        }
        let _ = self.tx.send(());
        true
    }

    /// True once `trigger` has been called at least once.
    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    /// Number of active subscribers (tasks still running).
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_signal_reaches_every_subscriber() {
        let shutdown = Shutdown::new();
        let mut receivers: Vec<_> = (0..4).map(|_| shutdown.subscribe()).collect();

        assert!(shutdown.trigger());
        for rx in &mut receivers {
            rx.recv().await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_trigger_is_single_attempt() {
        let shutdown = Shutdown::new();
        let mut rx = shutdown.subscribe();

        assert!(shutdown.trigger());
        assert!(!shutdown.trigger());
        assert!(shutdown.is_triggered());

        rx.recv().await.unwrap();
        // Exactly one signal was ever sent.
        assert!(rx.try_recv().is_err());
    }
}
