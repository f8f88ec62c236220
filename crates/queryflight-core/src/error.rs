//! Error types for cache operations

use thiserror::Error;

/// Main error type for all cache operations
///
/// `Clone` on purpose: a single producer failure is fanned out to every
/// waiter that joined the in-flight operation.
#[derive(Error, Debug, Clone)]
pub enum CacheError {
    /// The producer future failed
    #[error("producer error: {0}")]
    Producer(String),

    /// The in-flight operation disappeared without settling
    #[error("in-flight operation abandoned")]
    Abandoned,

    /// The caller issued a newer request before this one settled
    #[error("request superseded: issued {issued}, latest {latest}")]
    Superseded { issued: u64, latest: u64 },
}

impl CacheError {
    /// Wrap a producer-side failure
    pub fn producer(reason: impl std::fmt::Display) -> Self {
        CacheError::Producer(reason.to_string())
    }

    /// True for the silent-discard signal of out-of-date requests
    ///
    /// Superseded results are neither success nor failure from the end
    /// user's point of view; callers filter them out before any error
    /// reporting hook runs.
    pub fn is_superseded(&self) -> bool {
        matches!(self, CacheError::Superseded { .. })
    }
}

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CacheError::Producer("connection reset".to_string());
        assert_eq!(err.to_string(), "producer error: connection reset");

        let err = CacheError::Abandoned;
        assert_eq!(err.to_string(), "in-flight operation abandoned");

        let err = CacheError::Superseded {
            issued: 1,
            latest: 2,
        };
        assert_eq!(err.to_string(), "request superseded: issued 1, latest 2");
    }

    #[test]
    fn test_error_clone() {
        let err = CacheError::producer("boom");
        let cloned = err.clone();
        assert_eq!(err.to_string(), cloned.to_string());
    }

    #[test]
    fn test_is_superseded() {
        assert!(CacheError::Superseded { issued: 3, latest: 5 }.is_superseded());
        assert!(!CacheError::Abandoned.is_superseded());
        assert!(!CacheError::producer("x").is_superseded());
    }
}
