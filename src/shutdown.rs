use anyhow::Result;
use tokio::sync::watch;
use tracing::info;

use crate::observability::lifecycle_metrics;

/// Graceful shutdown coordinator. Background tasks hold a receiver and stop
/// once it reads `true`.
#[derive(Debug)]
pub struct ShutdownCoordinator {
    sender: watch::Sender<bool>,
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        let (sender, _receiver) = watch::channel(false);
        Self { sender }
    }

    /// Receiver handed to a background task
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.sender.subscribe()
    }

    /// Signal every subscriber to stop
    pub fn trigger(&self) {
        info!("Initiating graceful shutdown");
        self.sender.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.sender.borrow()
    }

    /// Wait for Ctrl-C, then signal shutdown
    pub async fn wait_for_signal(&self) -> Result<()> {
        info!("Shutdown coordinator ready - will shutdown gracefully on Ctrl-C");
        tokio::signal::ctrl_c().await?;
        self.trigger();
        Ok(())
    }

    /// Final bookkeeping once background tasks have stopped
    pub fn finish(&self) {
        lifecycle_metrics().log_stats();
        info!("Graceful shutdown completed successfully");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_see_trigger() {
        let coordinator = ShutdownCoordinator::new();
        let mut receiver = coordinator.subscribe();
        assert!(!*receiver.borrow());

        coordinator.trigger();
        receiver.changed().await.unwrap();
        assert!(*receiver.borrow());
        assert!(coordinator.is_triggered());
    }
}
