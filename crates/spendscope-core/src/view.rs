//! Last-request-wins loading for views
//!
//! A view (dashboard, insights) may start a new load while an older one is
//! still in flight. Each load takes a ticket; when it completes its result is
//! applied only if no newer load has started since. Older results are dropped.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

/// Identifies one load started by a [`ViewLoader`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

#[derive(Debug, Default)]
pub struct ViewLoader {
    latest: AtomicU64,
}

impl ViewLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a load, superseding every earlier ticket
    pub fn begin(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Whether `ticket` belongs to the most recent load
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// Pass `result` through only if `ticket` is still current
    pub fn apply<T>(&self, ticket: Ticket, result: T) -> Option<T> {
        if self.is_current(ticket) {
            Some(result)
        } else {
            debug!(ticket = ticket.0, "Discarding stale view result");
            None
        }
    }

    /// Run `load` under a fresh ticket; `None` if superseded before it finished
    pub async fn load<F, T>(&self, load: F) -> Option<T>
    where
        F: Future<Output = T>,
    {
        let ticket = self.begin();
        let result = load.await;
        self.apply(ticket, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::oneshot;

    #[test]
    fn test_newer_ticket_supersedes_older() {
        let loader = ViewLoader::new();
        let first = loader.begin();
        assert!(loader.is_current(first));

        let second = loader.begin();
        assert!(second > first);
        assert!(!loader.is_current(first));
        assert_eq!(loader.apply(first, "stale"), None);
        assert_eq!(loader.apply(second, "fresh"), Some("fresh"));
    }

    #[test]
    fn test_results_out_of_order() {
        let loader = ViewLoader::new();
        let a = loader.begin();
        let b = loader.begin();
        // b finishes first and is applied; a arrives late and is dropped
        assert_eq!(loader.apply(b, 2), Some(2));
        assert_eq!(loader.apply(a, 1), None);
    }

    #[tokio::test]
    async fn test_slow_load_discarded_after_newer_load() {
        let loader = Arc::new(ViewLoader::new());
        let (release_tx, release_rx) = oneshot::channel::<()>();

        let slow = {
            let loader = loader.clone();
            tokio::spawn(async move {
                loader
                    .load(async move {
                        let _ = release_rx.await;
                        "old period"
                    })
                    .await
            })
        };
        // Let the slow load take its ticket first
        tokio::time::sleep(Duration::from_millis(20)).await;

        let fast = loader.load(async { "new period" }).await;
        assert_eq!(fast, Some("new period"));

        release_tx.send(()).unwrap();
        assert_eq!(slow.await.unwrap(), None);
    }
}
