//! Core traits for cache coordination

mod metrics;
mod subscriber;

pub use metrics::{CacheMetrics, EvictionReason, NoopMetrics};
pub use subscriber::{ChannelSubscriber, NotifySet, Subscribe, SubscriberHandle};

#[cfg(feature = "metrics")]
pub use metrics::MetricsCrateAdapter;

#[cfg(feature = "tracing")]
pub use metrics::TracingMetrics;
