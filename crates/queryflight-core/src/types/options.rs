//! Per-call resolve options and builder

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::traits::Subscribe;
use crate::types::Scope;

/// Options for a single `resolve` call
///
/// Omitting `key` bypasses caching entirely: the producer runs directly,
/// with no deduplication, no storage and no notification.
pub struct ResolveOptions<V, M = ()> {
    /// Cache key grouping requests that coalesce together
    pub key: Option<String>,
    /// Freshness window; falls back to the coordinator default when `None`
    pub stale_time: Option<Duration>,
    /// Entry lifetime scope
    pub scope: Scope,
    /// Start a fresh producer invocation even if a usable entry exists
    pub force_refresh: bool,
    /// Long-lived subscriber to register for this call site
    pub subscriber: Option<Arc<dyn Subscribe<V, M>>>,
}

impl<V, M> Default for ResolveOptions<V, M> {
    fn default() -> Self {
        Self {
            key: None,
            stale_time: None,
            scope: Scope::default(),
            force_refresh: false,
            subscriber: None,
        }
    }
}

impl<V, M> fmt::Debug for ResolveOptions<V, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolveOptions")
            .field("key", &self.key)
            .field("stale_time", &self.stale_time)
            .field("scope", &self.scope)
            .field("force_refresh", &self.force_refresh)
            .field("subscriber", &self.subscriber.is_some())
            .finish()
    }
}

impl<V, M> From<&str> for ResolveOptions<V, M> {
    fn from(key: &str) -> Self {
        ResolveOpts::new().key(key).into()
    }
}

impl<V, M> From<String> for ResolveOptions<V, M> {
    fn from(key: String) -> Self {
        ResolveOpts::new().key(key).into()
    }
}

/// Builder for `ResolveOptions` with fluent API
pub struct ResolveOpts<V, M = ()>(ResolveOptions<V, M>);

impl<V, M> ResolveOpts<V, M> {
    /// Create new options builder
    pub fn new() -> Self {
        Self(ResolveOptions::default())
    }

    /// Set the cache key
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.0.key = Some(key.into());
        self
    }

    /// Set the freshness window
    pub fn stale_time(mut self, window: Duration) -> Self {
        self.0.stale_time = Some(window);
        self
    }

    /// Set the freshness window in milliseconds
    pub fn stale_ms(self, millis: u64) -> Self {
        self.stale_time(Duration::from_millis(millis))
    }

    /// Set the entry lifetime scope
    pub fn scope(mut self, scope: Scope) -> Self {
        self.0.scope = scope;
        self
    }

    /// Tear the entry down with this call site instead of outliving it
    pub fn inner_scope(self) -> Self {
        self.scope(Scope::Inner)
    }

    /// Force a fresh producer invocation
    pub fn force_refresh(mut self) -> Self {
        self.0.force_refresh = true;
        self
    }

    /// Register a long-lived subscriber for this call site
    pub fn subscriber(mut self, subscriber: Arc<dyn Subscribe<V, M>>) -> Self {
        self.0.subscriber = Some(subscriber);
        self
    }

    /// Build the options
    pub fn build(self) -> ResolveOptions<V, M> {
        self.0
    }
}

impl<V, M> Default for ResolveOpts<V, M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, M> From<ResolveOpts<V, M>> for ResolveOptions<V, M> {
    fn from(opts: ResolveOpts<V, M>) -> Self {
        opts.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_default() {
        let opts: ResolveOptions<i32> = ResolveOpts::new().build();
        assert!(opts.key.is_none());
        assert!(opts.stale_time.is_none());
        assert_eq!(opts.scope, Scope::Outer);
        assert!(!opts.force_refresh);
        assert!(opts.subscriber.is_none());
    }

    #[test]
    fn test_builder_fluent() {
        let opts: ResolveOptions<i32> = ResolveOpts::new()
            .key("users")
            .stale_ms(1_500)
            .inner_scope()
            .force_refresh()
            .build();

        assert_eq!(opts.key.as_deref(), Some("users"));
        assert_eq!(opts.stale_time, Some(Duration::from_millis(1_500)));
        assert_eq!(opts.scope, Scope::Inner);
        assert!(opts.force_refresh);
    }

    #[test]
    fn test_from_key() {
        let opts: ResolveOptions<i32> = "users".into();
        assert_eq!(opts.key.as_deref(), Some("users"));
        assert_eq!(opts.scope, Scope::Outer);
    }
}
