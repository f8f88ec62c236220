//! Request coordinator

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::sync::oneshot;

use queryflight_core::{
    CacheConfig, CacheError, CacheMetrics, CacheStats, EntryCell, EvictionReason, Fetched,
    NoopMetrics, NotifySet, QueryEntry, ResolveOptions, Result, Scope, Stage, SubscriberHandle,
};
use queryflight_store::LruStore;

mod flight;

/// Coordinator state shared with in-flight driver tasks
pub(crate) struct Shared<V, M> {
    pub(crate) store: Mutex<LruStore<String, EntryCell<V, M>>>,
    pub(crate) counters: RwLock<Counters>,
}

/// Internal counter tracking, snapshotted into [`CacheStats`]
#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub(crate) hits: u64,
    pub(crate) misses: u64,
    pub(crate) coalesced: u64,
    pub(crate) refreshes: u64,
    pub(crate) failures: u64,
    pub(crate) evictions: u64,
    pub(crate) invalidations: u64,
}

/// What `resolve` decided under the store lock
enum Action<V, M> {
    /// A fresh settled result was cloned; no producer runs
    Serve(Fetched<V, M>),
    /// Joined the waiting queue of an in-flight operation
    Join(oneshot::Receiver<Result<Fetched<V, M>>>),
    /// Opened a new entry generation; this caller leads the producer run
    Lead {
        cell: EntryCell<V, M>,
        rx: oneshot::Receiver<Result<Fetched<V, M>>>,
        evicted: bool,
        replaced: bool,
    },
}

/// Asynchronous result cache with request coalescing
///
/// One instance owns one logical cache scope: a bounded LRU store of
/// per-key entries, each tracking one in-flight or settled producer run.
/// Cloning creates a new handle to the SAME underlying cache; pass handles
/// to call sites instead of relying on a process-wide singleton.
///
/// Generic over:
/// - `V`: the cached value type
/// - `M`: opaque metadata settled alongside the value (default `()`)
/// - `Met`: the metrics collector (default [`NoopMetrics`])
pub struct QueryCache<V, M = (), Met = NoopMetrics>
where
    Met: CacheMetrics,
{
    shared: Arc<Shared<V, M>>,
    metrics: Arc<Met>,
    config: CacheConfig,
}

// Constructors for the default metrics collector
impl<V, M> QueryCache<V, M, NoopMetrics>
where
    V: Clone + Send + Sync + 'static,
    M: Clone + Send + Sync + 'static,
{
    /// Create a cache with the default configuration and no metrics
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    /// Create with custom config
    pub fn with_config(config: CacheConfig) -> Self {
        Self::with_metrics(config, NoopMetrics)
    }
}

impl<V, M> Default for QueryCache<V, M, NoopMetrics>
where
    V: Clone + Send + Sync + 'static,
    M: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

// Full generic implementation
impl<V, M, Met> QueryCache<V, M, Met>
where
    V: Clone + Send + Sync + 'static,
    M: Clone + Send + Sync + 'static,
    Met: CacheMetrics,
{
    /// Create a cache with a custom metrics collector
    ///
    /// # Panics
    /// Panics if `config.capacity` is 0 (a usage defect, reported at the
    /// call boundary).
    pub fn with_metrics(config: CacheConfig, metrics: Met) -> Self {
        Self {
            shared: Arc::new(Shared {
                store: Mutex::new(LruStore::new(config.capacity)),
                counters: RwLock::new(Counters::default()),
            }),
            metrics: Arc::new(metrics),
            config,
        }
    }

    /// Resolve a keyed operation, coalescing with any in-flight run
    ///
    /// Exactly one of three things happens: the caller is served a clone of
    /// a fresh settled result, joins the waiting queue of the producer run
    /// already in flight for its key, or opens a new entry generation and
    /// leads a producer run whose result fans out to every joiner.
    ///
    /// Without a key the producer runs directly: no dedup, no storage.
    ///
    /// The returned future may be dropped to stop waiting (e.g. losing a
    /// race against a caller-side timeout); the shared producer run is
    /// never cancelled on behalf of one caller.
    pub async fn resolve<F, Fut>(
        &self,
        options: impl Into<ResolveOptions<V, M>>,
        producer: F,
    ) -> Result<Fetched<V, M>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Fetched<V, M>>> + Send + 'static,
    {
        let options = options.into();
        let Some(key) = options.key else {
            return producer().await;
        };
        let stale_time = options
            .stale_time
            .unwrap_or(self.config.default_stale_time);

        let action = {
            let mut store = self.shared.store.lock();
            let existing = store.get(key.as_str()).cloned();
            match existing {
                Some(cell) => {
                    let mut entry = cell.lock();
                    if let Some(sub) = options.subscriber.clone() {
                        entry.subscribers.add(sub);
                    }
                    if entry.stage == Stage::Pending {
                        entry.shrink_stale_time(stale_time);
                        let (tx, rx) = oneshot::channel();
                        entry.waiters.push(tx);
                        Action::Join(rx)
                    } else {
                        let fresh = entry.stage == Stage::Active
                            && !options.force_refresh
                            && !entry.is_expired();
                        let served = if fresh { entry.result.clone() } else { None };
                        match served {
                            Some(settled) => Action::Serve(settled),
                            None => {
                                // stale, invalidated or forced: open a new
                                // generation, migrating the subscriber set
                                let inherited = entry.subscribers.take();
                                drop(entry);
                                store.remove(key.as_str());
                                let (cell, rx, evicted) = Self::open_generation(
                                    &mut store,
                                    &key,
                                    stale_time,
                                    options.scope,
                                    inherited,
                                );
                                Action::Lead {
                                    cell,
                                    rx,
                                    evicted,
                                    replaced: true,
                                }
                            }
                        }
                    }
                }
                None => {
                    let mut subscribers = NotifySet::new();
                    if let Some(sub) = options.subscriber {
                        subscribers.add(sub);
                    }
                    let (cell, rx, evicted) = Self::open_generation(
                        &mut store,
                        &key,
                        stale_time,
                        options.scope,
                        subscribers,
                    );
                    Action::Lead {
                        cell,
                        rx,
                        evicted,
                        replaced: false,
                    }
                }
            }
        };

        match action {
            Action::Serve(settled) => {
                self.shared.counters.write().hits += 1;
                self.metrics.record_hit(&key);
                Ok(settled)
            }
            Action::Join(rx) => {
                self.shared.counters.write().coalesced += 1;
                self.metrics.record_coalesced(&key);
                match rx.await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(CacheError::Abandoned),
                }
            }
            Action::Lead {
                cell,
                rx,
                evicted,
                replaced,
            } => {
                {
                    let mut counters = self.shared.counters.write();
                    counters.misses += 1;
                    if replaced {
                        counters.refreshes += 1;
                    }
                    if evicted {
                        counters.evictions += 1;
                    }
                }
                self.metrics.record_miss(&key);
                if replaced {
                    self.metrics.record_eviction(EvictionReason::Replaced);
                }
                if evicted {
                    self.metrics.record_eviction(EvictionReason::Capacity);
                }
                self.metrics.record_size(self.shared.store.lock().len());

                flight::spawn(
                    self.shared.clone(),
                    self.metrics.clone(),
                    cell,
                    key,
                    producer(),
                );
                match rx.await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(CacheError::Abandoned),
                }
            }
        }
    }

    /// Open a `Pending` entry with this caller as the first waiter.
    fn open_generation(
        store: &mut LruStore<String, EntryCell<V, M>>,
        key: &str,
        stale_time: Duration,
        scope: Scope,
        subscribers: NotifySet<V, M>,
    ) -> (
        EntryCell<V, M>,
        oneshot::Receiver<Result<Fetched<V, M>>>,
        bool,
    ) {
        let mut entry = QueryEntry::new(key, stale_time, scope);
        entry.subscribers = subscribers;
        let (tx, rx) = oneshot::channel();
        entry.waiters.push(tx);
        let cell = entry.into_cell();
        let evicted = store.insert(key.to_string(), cell.clone()).is_some();
        (cell, rx, evicted)
    }

    /// Mark the entry for `key` as unusable for future coalescing
    ///
    /// The entry is not removed: its settled value stays inspectable via
    /// [`peek`](Self::peek) until replaced, and an in-flight `Pending`
    /// generation is net-unaffected (a successful settle re-activates it).
    /// No effect if the key is absent. Recency is untouched.
    pub fn invalidate(&self, key: &str) {
        let marked = {
            let store = self.shared.store.lock();
            match store.peek(key) {
                Some(cell) => {
                    cell.lock().stage = Stage::Inactive;
                    true
                }
                None => false,
            }
        };
        if marked {
            self.shared.counters.write().invalidations += 1;
        }
    }

    /// True if no entry exists for `key` or its freshness window has passed
    ///
    /// Side-effect-free: no recency promotion, no eviction.
    pub fn is_stale(&self, key: &str) -> bool {
        let store = self.shared.store.lock();
        match store.peek(key) {
            Some(cell) => cell.lock().is_expired(),
            None => true,
        }
    }

    /// Remove a subscriber from the entry for `key`
    ///
    /// This is the lifecycle-end hook of an opening call site: afterwards
    /// the entry is torn down if its scope is [`Scope::Inner`], or if the
    /// notify set became empty and the entry has already expired.
    pub fn unsubscribe(&self, key: &str, subscriber: &SubscriberHandle<V, M>) {
        let mut store = self.shared.store.lock();
        let Some(cell) = store.peek(key).cloned() else {
            return;
        };
        let teardown = {
            let mut entry = cell.lock();
            entry.subscribers.remove(subscriber);
            entry.scope == Scope::Inner || (entry.subscribers.is_empty() && entry.is_expired())
        };
        if teardown {
            store.remove(key);
            self.metrics.record_eviction(EvictionReason::Teardown);
            self.metrics.record_size(store.len());
        }
    }

    /// The currently settled value for `key`, regardless of stage
    ///
    /// Recency is untouched; an invalidated entry remains inspectable here
    /// until replaced.
    pub fn peek(&self, key: &str) -> Option<Fetched<V, M>> {
        let store = self.shared.store.lock();
        store.peek(key).and_then(|cell| cell.lock().result.clone())
    }

    /// The lifecycle stage of the entry for `key`, if one exists
    pub fn stage(&self, key: &str) -> Option<Stage> {
        let store = self.shared.store.lock();
        store.peek(key).map(|cell| cell.lock().stage)
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.shared.store.lock().clear();
        self.metrics.record_size(0);
    }

    /// Number of entries currently stored
    pub fn len(&self) -> usize {
        self.shared.store.lock().len()
    }

    /// True when no entries are stored
    pub fn is_empty(&self) -> bool {
        self.shared.store.lock().is_empty()
    }

    /// Snapshot the cache statistics
    pub fn stats(&self) -> CacheStats {
        // store and counter locks are taken one at a time, never nested
        let size = self.shared.store.lock().len();
        let counters = self.shared.counters.read();
        CacheStats {
            hits: counters.hits,
            misses: counters.misses,
            coalesced: counters.coalesced,
            refreshes: counters.refreshes,
            failures: counters.failures,
            evictions: counters.evictions,
            invalidations: counters.invalidations,
            size,
        }
    }
}

impl<V, M, Met> Clone for QueryCache<V, M, Met>
where
    Met: CacheMetrics,
{
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            metrics: self.metrics.clone(),
            config: self.config.clone(),
        }
    }
}
