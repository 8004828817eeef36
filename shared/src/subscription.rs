//! Live collection snapshots.
//!
//! Writers publish the new state of a collection (e.g. an event's guest list)
//! to a [`SubscriptionHub`]; each [`Subscription`] receives those snapshots in
//! publish order for its key. There is no ordering across keys. Dropping a
//! subscription unregisters it, so a subscription lives exactly as long as
//! the view consuming it.
//!
//! Every subscriber has a bounded buffer. One that falls a full buffer
//! behind is disconnected: its stream ends once drained and the client is
//! expected to subscribe again, which starts it from a fresh snapshot.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};

use dashmap::DashMap;
use futures::Stream;
use log::{debug, warn};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Mutex;

/// Snapshots a subscriber may have queued before it is disconnected
pub const DEFAULT_BUFFER_SIZE: usize = 16;

struct Subscriber<T> {
    id: u64,
    tx: mpsc::Sender<T>,
}

struct HubInner<T> {
    buffer_size: usize,
    next_id: AtomicU64,
    subscribers: DashMap<String, Vec<Subscriber<T>>>,
    /// Serialises read-then-publish per key
    refresh_gates: DashMap<String, Arc<Mutex<()>>>,
}

impl<T> HubInner<T> {
    fn forget_if_idle(&self, key: &str) {
        if self.subscribers.remove_if(key, |_, subs| subs.is_empty()).is_some() {
            self.refresh_gates
                .remove_if(key, |_, gate| Arc::strong_count(gate) == 1);
        }
    }
}

pub struct SubscriptionHub<T> {
    inner: Arc<HubInner<T>>,
}

impl<T> Clone for SubscriptionHub<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for SubscriptionHub<T> {
    fn default() -> Self {
        Self::with_buffer_size(DEFAULT_BUFFER_SIZE)
    }
}

impl<T> SubscriptionHub<T> {
    pub fn with_buffer_size(buffer_size: usize) -> Self {
        Self {
            inner: Arc::new(HubInner {
                buffer_size: buffer_size.max(1),
                next_id: AtomicU64::new(0),
                subscribers: DashMap::new(),
                refresh_gates: DashMap::new(),
            }),
        }
    }
}

impl<T: Clone> SubscriptionHub<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, key: &str) -> Subscription<T> {
        let (tx, rx) = mpsc::channel(self.inner.buffer_size);
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .subscribers
            .entry(key.to_string())
            .or_default()
            .push(Subscriber { id, tx });
        debug!("Subscription {} opened on '{}'", id, key);

        Subscription {
            id,
            key: key.to_string(),
            rx,
            hub: Arc::downgrade(&self.inner),
        }
    }

    /// Delivers `snapshot` to every live subscriber of `key`
    pub fn publish(&self, key: &str, snapshot: T) {
        let Some(mut subs) = self.inner.subscribers.get_mut(key) else {
            return;
        };
        let buffer_size = self.inner.buffer_size;
        subs.retain(|s| match s.tx.try_send(snapshot.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(
                    "Subscription {} on '{}' is {} snapshots behind, disconnecting",
                    s.id, key, buffer_size
                );
                false
            }
            Err(TrySendError::Closed(_)) => false,
        });
        let idle = subs.is_empty();
        drop(subs);

        if idle {
            self.inner.forget_if_idle(key);
        }
    }

    /// Reads the current state of `key` with `load` and publishes it.
    ///
    /// Refreshes of one key run one at a time, so subscribers see snapshots
    /// in the order they were read even when concurrent writers finish out
    /// of order. Nothing is read while the key has no subscribers.
    pub async fn refresh<F, Fut, E>(&self, key: &str, load: F) -> Result<(), E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if self.subscriber_count(key) == 0 {
            return Ok(());
        }

        let gate = Arc::clone(&*self.inner.refresh_gates.entry(key.to_string()).or_default());
        let _turn = gate.lock().await;
        let snapshot = load().await?;
        self.publish(key, snapshot);
        Ok(())
    }

    pub fn subscriber_count(&self, key: &str) -> usize {
        self.inner.subscribers.get(key).map_or(0, |subs| subs.len())
    }
}

/// Receiving end of one subscription
pub struct Subscription<T> {
    id: u64,
    key: String,
    rx: mpsc::Receiver<T>,
    hub: Weak<HubInner<T>>,
}

impl<T> Subscription<T> {
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Next snapshot, or `None` once the hub is gone or this subscriber was
    /// disconnected
    pub async fn next(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Explicit stop; equivalent to dropping the subscription
    pub fn unsubscribe(self) {}
}

impl<T> Stream for Subscription<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.rx.poll_recv(cx)
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        let Some(hub) = self.hub.upgrade() else {
            return;
        };
        if let Some(mut subs) = hub.subscribers.get_mut(&self.key) {
            subs.retain(|s| s.id != self.id);
        }
        hub.forget_if_idle(&self.key);
        debug!("Subscription {} closed on '{}'", self.id, self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn delivers_in_publish_order() {
        let hub = SubscriptionHub::new();
        let mut sub = hub.subscribe("event-1/guests");

        hub.publish("event-1/guests", 1);
        hub.publish("event-1/guests", 2);
        hub.publish("event-2/guests", 99);
        hub.publish("event-1/guests", 3);

        assert_eq!(sub.next().await, Some(1));
        assert_eq!(sub.next().await, Some(2));
        assert_eq!(sub.next().await, Some(3));
    }

    #[tokio::test]
    async fn drop_unregisters() {
        let hub: SubscriptionHub<u32> = SubscriptionHub::new();
        let a = hub.subscribe("k");
        let b = hub.subscribe("k");
        assert_eq!(hub.subscriber_count("k"), 2);

        drop(a);
        assert_eq!(hub.subscriber_count("k"), 1);
        b.unsubscribe();
        assert_eq!(hub.subscriber_count("k"), 0);

        // Publishing with nobody listening is fine
        hub.publish("k", 7);
    }

    #[tokio::test]
    async fn ends_when_hub_is_gone() {
        let hub: SubscriptionHub<u32> = SubscriptionHub::new();
        let mut sub = hub.subscribe("k");
        drop(hub);
        assert_eq!(sub.next().await, None);
    }

    #[tokio::test]
    async fn stalled_subscriber_is_disconnected() {
        let hub: SubscriptionHub<u32> = SubscriptionHub::with_buffer_size(2);
        let mut stalled = hub.subscribe("k");
        let mut reader = hub.subscribe("k");

        hub.publish("k", 1);
        assert_eq!(reader.next().await, Some(1));
        hub.publish("k", 2);
        assert_eq!(reader.next().await, Some(2));
        // stalled has 1 and 2 queued; a third does not fit
        hub.publish("k", 3);

        assert_eq!(hub.subscriber_count("k"), 1);
        assert_eq!(reader.next().await, Some(3));

        // the queued snapshots still drain, then the stream ends
        assert_eq!(stalled.next().await, Some(1));
        assert_eq!(stalled.next().await, Some(2));
        assert_eq!(stalled.next().await, None);
    }

    #[tokio::test]
    async fn refresh_publishes_in_read_order() {
        let hub: SubscriptionHub<u32> = SubscriptionHub::new();
        let mut sub = hub.subscribe("k");

        let slow = hub.refresh("k", || async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok::<_, ()>(1)
        });
        let fast = hub.refresh("k", || async { Ok::<_, ()>(2) });
        let (a, b) = tokio::join!(slow, fast);
        assert!(a.is_ok() && b.is_ok());

        assert_eq!(sub.next().await, Some(1));
        assert_eq!(sub.next().await, Some(2));
    }

    #[tokio::test]
    async fn refresh_without_subscribers_skips_the_read() {
        let hub: SubscriptionHub<u32> = SubscriptionHub::new();
        let result = hub
            .refresh("k", || async { Err::<u32, _>("should not be called") })
            .await;
        assert!(result.is_ok());
    }
}
