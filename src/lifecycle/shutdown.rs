//! Shutdown coordination.
//!
//! One `Shutdown` fans a single stop notification out to every server
//! and background task holding a receiver.

use tokio::sync::broadcast;

/// Broadcasts a one-shot stop notification.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Receiver that yields once `trigger` is called.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Notify all current subscribers. Calling it with no subscribers is a no-op.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Servers still waiting on this coordinator.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve when `receiver` is notified or its sender is gone.
pub async fn wait(mut receiver: broadcast::Receiver<()>) {
    let _ = receiver.recv().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_trigger_reaches_every_subscriber() {
        let shutdown = Shutdown::new();
        let first = tokio::spawn(wait(shutdown.subscribe()));
        let second = tokio::spawn(wait(shutdown.subscribe()));
        assert_eq!(shutdown.receiver_count(), 2);

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(1), async {
            first.await.unwrap();
            second.await.unwrap();
        })
        .await
        .expect("subscribers were not notified");
    }

    #[tokio::test]
    async fn test_dropped_coordinator_releases_waiters() {
        let shutdown = Shutdown::new();
        let receiver = shutdown.subscribe();
        drop(shutdown);
        tokio::time::timeout(Duration::from_secs(1), wait(receiver))
            .await
            .expect("waiter stayed blocked");
    }
}
