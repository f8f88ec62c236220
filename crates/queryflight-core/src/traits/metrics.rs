//! Metrics trait for cache observability

use std::time::Duration;

/// Reason an entry left the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EvictionReason {
    /// Capacity limit reached
    Capacity,
    /// Replaced by a fresh generation on stale or forced refresh
    Replaced,
    /// Scope-driven or empty-and-expired cleanup
    Teardown,
}

impl EvictionReason {
    /// Get reason as string label
    pub fn as_str(&self) -> &'static str {
        match self {
            EvictionReason::Capacity => "capacity",
            EvictionReason::Replaced => "replaced",
            EvictionReason::Teardown => "teardown",
        }
    }
}

/// Trait for cache metrics/observability
///
/// Implement this to integrate with your metrics system (Prometheus, StatsD, etc.)
pub trait CacheMetrics: Send + Sync + 'static {
    /// Record a resolve served from a fresh entry
    fn record_hit(&self, key: &str);

    /// Record a resolve that started a producer run
    fn record_miss(&self, key: &str);

    /// Record a resolve that joined an in-flight run
    fn record_coalesced(&self, key: &str);

    /// Record a producer settle and its duration
    fn record_settle(&self, key: &str, success: bool, duration: Duration);

    /// Record an entry leaving the store
    fn record_eviction(&self, reason: EvictionReason);

    /// Record the current entry count
    fn record_size(&self, size: usize);
}

/// No-op metrics implementation (default)
///
/// Zero overhead when metrics are not needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl CacheMetrics for NoopMetrics {
    #[inline]
    fn record_hit(&self, _key: &str) {}

    #[inline]
    fn record_miss(&self, _key: &str) {}

    #[inline]
    fn record_coalesced(&self, _key: &str) {}

    #[inline]
    fn record_settle(&self, _key: &str, _success: bool, _duration: Duration) {}

    #[inline]
    fn record_eviction(&self, _reason: EvictionReason) {}

    #[inline]
    fn record_size(&self, _size: usize) {}
}

/// Metrics adapter using the `metrics` crate
///
/// Integrates with Prometheus, StatsD, and other exporters via the `metrics`
/// ecosystem.
///
/// # Example
/// ```ignore
/// use queryflight_core::MetricsCrateAdapter;
///
/// // Set up a metrics recorder (e.g., prometheus_exporter)
/// // metrics::set_global_recorder(recorder);
///
/// let metrics = MetricsCrateAdapter::new("queryflight");
/// // Emits: queryflight_hits_total, queryflight_misses_total, etc.
/// ```
#[cfg(feature = "metrics")]
#[derive(Debug, Clone)]
pub struct MetricsCrateAdapter {
    prefix: String,
}

#[cfg(feature = "metrics")]
impl MetricsCrateAdapter {
    /// Create a new adapter with the given metric name prefix
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn metric_name(&self, name: &str) -> String {
        format!("{}_{}", self.prefix, name)
    }
}

#[cfg(feature = "metrics")]
impl CacheMetrics for MetricsCrateAdapter {
    fn record_hit(&self, _key: &str) {
        metrics::counter!(self.metric_name("hits_total")).increment(1);
    }

    fn record_miss(&self, _key: &str) {
        metrics::counter!(self.metric_name("misses_total")).increment(1);
    }

    fn record_coalesced(&self, _key: &str) {
        metrics::counter!(self.metric_name("coalesced_total")).increment(1);
    }

    fn record_settle(&self, _key: &str, success: bool, duration: Duration) {
        metrics::histogram!(
            self.metric_name("settle_duration_seconds"),
            "outcome" => if success { "ok" } else { "err" }
        )
        .record(duration.as_secs_f64());
    }

    fn record_eviction(&self, reason: EvictionReason) {
        metrics::counter!(
            self.metric_name("evictions_total"),
            "reason" => reason.as_str()
        )
        .increment(1);
    }

    fn record_size(&self, size: usize) {
        metrics::gauge!(self.metric_name("entries")).set(size as f64);
    }
}

/// Metrics adapter that logs events via `tracing`
#[cfg(feature = "tracing")]
#[derive(Debug, Clone, Default)]
pub struct TracingMetrics;

#[cfg(feature = "tracing")]
impl TracingMetrics {
    /// Create new tracing metrics adapter
    pub fn new() -> Self {
        Self
    }
}

#[cfg(feature = "tracing")]
impl CacheMetrics for TracingMetrics {
    fn record_hit(&self, key: &str) {
        tracing::debug!(target: "queryflight", event = "hit", key = %key, "Cache Hit");
    }

    fn record_miss(&self, key: &str) {
        tracing::debug!(target: "queryflight", event = "miss", key = %key, "Cache Miss");
    }

    fn record_coalesced(&self, key: &str) {
        tracing::debug!(
            target: "queryflight",
            event = "coalesced",
            key = %key,
            "Joined In-Flight Operation"
        );
    }

    fn record_settle(&self, key: &str, success: bool, duration: Duration) {
        tracing::trace!(
            target: "queryflight",
            event = "settle",
            key = %key,
            success = success,
            duration_ms = duration.as_millis(),
            "Producer Settled"
        );
    }

    fn record_eviction(&self, reason: EvictionReason) {
        tracing::debug!(
            target: "queryflight",
            event = "eviction",
            reason = reason.as_str(),
            "Cache Eviction"
        );
    }

    fn record_size(&self, size: usize) {
        tracing::trace!(target: "queryflight", event = "size", size = size, "Cache Size Update");
    }
}
