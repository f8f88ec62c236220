//! Per-key entry state

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::time::Instant;

use crate::error::Result;
use crate::traits::NotifySet;
use crate::types::Fetched;

/// Lifecycle stage of a cache entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Producer invoked, not yet settled
    Pending,
    /// Producer settled successfully; result usable until expiry
    Active,
    /// Explicitly invalidated or producer failed; never reused for coalescing
    Inactive,
}

/// How long an entry outlives the caller that opened it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    /// Torn down when the opening caller unsubscribes
    Inner,
    /// Survives as long as it is referenced
    #[default]
    Outer,
}

/// Channel slot for one caller parked on a pending operation
pub type Waiter<V, M = ()> = oneshot::Sender<Result<Fetched<V, M>>>;

/// Shared handle to one entry generation
///
/// The store and the driver task settling the producer each hold their own
/// handle, so an entry evicted or replaced mid-flight still serves the
/// waiters parked on it.
pub type EntryCell<V, M = ()> = Arc<Mutex<QueryEntry<V, M>>>;

/// State for one generation of a cached operation
///
/// Plain data plus invariant helpers; all orchestration lives in the
/// coordinator. The waiting queue is FIFO and drained exactly once, in
/// full, when the producer settles. Subscribers persist across entry
/// generations; waiters are one-shot.
pub struct QueryEntry<V, M = ()> {
    /// Cache key this entry belongs to
    pub key: String,
    /// Current lifecycle stage
    pub stage: Stage,
    /// Absolute point after which the entry is stale
    pub expires_at: Instant,
    /// Freshness window applied when the producer settles
    pub stale_time: Duration,
    /// Entry lifetime scope
    pub scope: Scope,
    /// Settled producer output; `Some` only in `Active` stage
    pub result: Option<Fetched<V, M>>,
    /// Callers parked on the in-flight producer, in join order
    pub waiters: Vec<Waiter<V, M>>,
    /// Long-lived listeners notified on every successful settle
    pub subscribers: NotifySet<V, M>,
}

impl<V, M> QueryEntry<V, M> {
    /// Create a fresh `Pending` entry for `key`
    pub fn new(key: impl Into<String>, stale_time: Duration, scope: Scope) -> Self {
        Self {
            key: key.into(),
            stage: Stage::Pending,
            expires_at: Instant::now() + stale_time,
            stale_time,
            scope,
            result: None,
            waiters: Vec::new(),
            subscribers: NotifySet::new(),
        }
    }

    /// Wrap into the shared handle used by store and driver
    pub fn into_cell(self) -> EntryCell<V, M> {
        Arc::new(Mutex::new(self))
    }

    /// True once the freshness window has passed
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Instant::now()
    }

    /// Lower the freshness window if a joining caller asked for less
    ///
    /// The minimum of all windows specified while the entry is pending
    /// wins; an entry is never fresher than any caller asked for.
    pub fn shrink_stale_time(&mut self, candidate: Duration) {
        if candidate < self.stale_time {
            self.stale_time = candidate;
        }
    }
}

impl<V, M> fmt::Debug for QueryEntry<V, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryEntry")
            .field("key", &self.key)
            .field("stage", &self.stage)
            .field("expires_at", &self.expires_at)
            .field("scope", &self.scope)
            .field("waiters", &self.waiters.len())
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_new_entry_is_pending() {
        let entry: QueryEntry<i32> = QueryEntry::new("key1", Duration::from_secs(60), Scope::Outer);
        assert_eq!(entry.stage, Stage::Pending);
        assert_eq!(entry.scope, Scope::Outer);
        assert!(entry.result.is_none());
        assert!(entry.waiters.is_empty());
        assert!(entry.subscribers.is_empty());
        assert!(!entry.is_expired());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_tracks_clock() {
        let entry: QueryEntry<i32> =
            QueryEntry::new("key1", Duration::from_millis(300), Scope::Outer);
        assert!(!entry.is_expired());

        tokio::time::advance(Duration::from_millis(301)).await;
        assert!(entry.is_expired());
    }

    #[tokio::test]
    async fn test_shrink_stale_time_takes_minimum() {
        let mut entry: QueryEntry<i32> =
            QueryEntry::new("key1", Duration::from_millis(500), Scope::Outer);

        entry.shrink_stale_time(Duration::from_millis(800));
        assert_eq!(entry.stale_time, Duration::from_millis(500));

        entry.shrink_stale_time(Duration::from_millis(100));
        assert_eq!(entry.stale_time, Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_default_scope_is_outer() {
        assert_eq!(Scope::default(), Scope::Outer);
    }
}
