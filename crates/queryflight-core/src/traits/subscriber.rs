//! Subscriber seam for long-lived result fan-out

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::types::Fetched;

/// Long-lived listener notified on every successful settle for a key
///
/// A subscriber persists across request cycles and receives each
/// successfully settled result for its key, whether or not it initiated
/// the request. Failed settles are never broadcast. Returning an error
/// from `notify` never aborts fan-out to the remaining subscribers.
#[async_trait]
pub trait Subscribe<V, M = ()>: Send + Sync {
    /// Deliver one settled result for `key`
    async fn notify(&self, update: Fetched<V, M>, key: &str) -> Result<()>;
}

/// Shared handle to a registered subscriber
///
/// The `Arc` address is the subscriber's identity within a notify set;
/// registering the same handle twice is a no-op.
pub type SubscriberHandle<V, M = ()> = Arc<dyn Subscribe<V, M>>;

/// Identity-keyed set of subscribers attached to one entry
///
/// Iteration always goes through `snapshot`, so a notified subscriber that
/// re-enters the coordinator cannot disturb the set being drained.
pub struct NotifySet<V, M = ()> {
    members: Vec<SubscriberHandle<V, M>>,
}

impl<V, M> NotifySet<V, M> {
    /// Create an empty set
    pub fn new() -> Self {
        Self {
            members: Vec::new(),
        }
    }

    /// Add a subscriber; returns false if the handle is already present
    pub fn add(&mut self, subscriber: SubscriberHandle<V, M>) -> bool {
        if self.members.iter().any(|s| Arc::ptr_eq(s, &subscriber)) {
            return false;
        }
        self.members.push(subscriber);
        true
    }

    /// Remove a subscriber by handle identity; returns true if it was present
    pub fn remove(&mut self, subscriber: &SubscriberHandle<V, M>) -> bool {
        let before = self.members.len();
        self.members.retain(|s| !Arc::ptr_eq(s, subscriber));
        self.members.len() != before
    }

    /// Clone the current membership for lock-free iteration
    pub fn snapshot(&self) -> Vec<SubscriberHandle<V, M>> {
        self.members.clone()
    }

    /// Move the whole set out, leaving this one empty
    ///
    /// Used when a stale entry is replaced: subscribers migrate to the new
    /// generation so they keep receiving updates.
    pub fn take(&mut self) -> Self {
        Self {
            members: std::mem::take(&mut self.members),
        }
    }

    /// Number of subscribers
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// True when no subscribers remain
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl<V, M> Default for NotifySet<V, M> {
    fn default() -> Self {
        Self::new()
    }
}

/// Subscriber that forwards updates into an unbounded channel
///
/// The receiving half is handed to the consumer; once it is dropped,
/// deliveries become no-ops rather than errors, since a disappearing
/// consumer is ordinary lifecycle, not a fault.
pub struct ChannelSubscriber<V, M = ()> {
    tx: mpsc::UnboundedSender<(String, Fetched<V, M>)>,
}

impl<V, M> ChannelSubscriber<V, M>
where
    V: Clone + Send + Sync + 'static,
    M: Clone + Send + Sync + 'static,
{
    /// Create a subscriber handle and the receiver of its updates
    #[allow(clippy::type_complexity)]
    pub fn new() -> (
        SubscriberHandle<V, M>,
        mpsc::UnboundedReceiver<(String, Fetched<V, M>)>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }
}

#[async_trait]
impl<V, M> Subscribe<V, M> for ChannelSubscriber<V, M>
where
    V: Clone + Send + Sync + 'static,
    M: Clone + Send + Sync + 'static,
{
    async fn notify(&self, update: Fetched<V, M>, key: &str) -> Result<()> {
        let _ = self.tx.send((key.to_string(), update));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Silent;

    #[async_trait]
    impl Subscribe<i32> for Silent {
        async fn notify(&self, _update: Fetched<i32>, _key: &str) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_add_is_identity_deduped() {
        let mut set: NotifySet<i32> = NotifySet::new();
        let a: SubscriberHandle<i32> = Arc::new(Silent);
        let b: SubscriberHandle<i32> = Arc::new(Silent);

        assert!(set.add(a.clone()));
        assert!(!set.add(a.clone()));
        assert!(set.add(b));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_remove_by_identity() {
        let mut set: NotifySet<i32> = NotifySet::new();
        let a: SubscriberHandle<i32> = Arc::new(Silent);
        let b: SubscriberHandle<i32> = Arc::new(Silent);
        set.add(a.clone());

        assert!(!set.remove(&b));
        assert!(set.remove(&a));
        assert!(set.is_empty());
    }

    #[test]
    fn test_take_empties_the_source() {
        let mut set: NotifySet<i32> = NotifySet::new();
        set.add(Arc::new(Silent));

        let moved = set.take();
        assert_eq!(moved.len(), 1);
        assert!(set.is_empty());
    }

    #[tokio::test]
    async fn test_channel_subscriber_delivers() {
        let (sub, mut rx) = ChannelSubscriber::<i32>::new();
        sub.notify(Fetched::new(7), "key1").await.unwrap();

        let (key, update) = rx.recv().await.unwrap();
        assert_eq!(key, "key1");
        assert_eq!(update.value, 7);
    }

    #[tokio::test]
    async fn test_channel_subscriber_tolerates_dropped_receiver() {
        let (sub, rx) = ChannelSubscriber::<i32>::new();
        drop(rx);
        assert!(sub.notify(Fetched::new(7), "key1").await.is_ok());
    }
}
