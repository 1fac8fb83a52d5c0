//! Best-effort broadcast of configuration updates.
//!
//! Each subscriber owns a channel holding at most one pending event.
//! Publishing never blocks: a send to a full channel is dropped. A
//! subscription lives until its cancellation future completes; the one
//! monitor task spawned per subscription then removes the sender, closing
//! the channel exactly once.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::debug;

/// A configuration replacement event carrying the displaced and the newly
/// published value.
#[derive(Debug)]
pub struct ConfigUpdate<T> {
    pub old: Arc<T>,
    pub new: Arc<T>,
}

impl<T> Clone for ConfigUpdate<T> {
    fn clone(&self) -> Self {
        Self {
            old: Arc::clone(&self.old),
            new: Arc::clone(&self.new),
        }
    }
}

struct Registry<T> {
    subscribers: Mutex<HashMap<u64, mpsc::Sender<ConfigUpdate<T>>>>,
    next_id: AtomicU64,
}

/// Multi-subscriber, non-blocking broadcast of configuration updates.
///
/// The subscriber set has its own lock, independent of any configuration
/// state, because subscription and cancellation run concurrently with
/// publishing.
pub struct ChangeNotifier<T> {
    registry: Arc<Registry<T>>,
}

impl<T> Clone for ChangeNotifier<T> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<T: Send + Sync + 'static> ChangeNotifier<T> {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Registry {
                subscribers: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Register a subscriber bounded by `cancel`.
    ///
    /// The returned channel buffers exactly one event. When `cancel`
    /// completes the subscription is removed and the channel closes; no
    /// further delivery is attempted.
    pub fn subscribe(
        &self,
        cancel: impl Future<Output = ()> + Send + 'static,
    ) -> mpsc::Receiver<ConfigUpdate<T>> {
        let (tx, rx) = mpsc::channel(1);
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        self.registry.subscribers.lock().unwrap().insert(id, tx);

        let registry = Arc::clone(&self.registry);
        tokio::spawn(async move {
            cancel.await;
            registry.subscribers.lock().unwrap().remove(&id);
            debug!(id, "config subscriber cancelled");
        });

        rx
    }

    /// Deliver `update` to every active subscriber without blocking.
    ///
    /// Subscribers that still hold an unconsumed event are skipped; the
    /// broadcast is best-effort, not a durable log.
    pub fn publish(&self, update: ConfigUpdate<T>) {
        let subscribers = self.registry.subscribers.lock().unwrap();
        for tx in subscribers.values() {
            let _ = tx.try_send(update.clone());
        }
    }

    /// Number of currently active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.registry.subscribers.lock().unwrap().len()
    }
}

impl<T: Send + Sync + 'static> Default for ChangeNotifier<T> {
    fn default() -> Self {
        Self::new()
    }
}
