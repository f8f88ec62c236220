//! Coordinator configuration

use std::time::Duration;

/// Configuration for a `QueryCache` instance
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries held by the store
    pub capacity: usize,
    /// Freshness window applied when a call does not specify one
    pub default_stale_time: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 24,
            default_stale_time: Duration::from_secs(300),
        }
    }
}

impl CacheConfig {
    /// Create config with a specific capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Default::default()
        }
    }

    /// Create config with a specific default freshness window
    pub fn with_stale_time(window: Duration) -> Self {
        Self {
            default_stale_time: window,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.capacity, 24);
        assert_eq!(config.default_stale_time, Duration::from_secs(300));
    }

    #[test]
    fn test_with_capacity() {
        let config = CacheConfig::with_capacity(2);
        assert_eq!(config.capacity, 2);
        assert_eq!(config.default_stale_time, Duration::from_secs(300));
    }

    #[test]
    fn test_with_stale_time() {
        let config = CacheConfig::with_stale_time(Duration::from_millis(300));
        assert_eq!(config.capacity, 24);
        assert_eq!(config.default_stale_time, Duration::from_millis(300));
    }
}
