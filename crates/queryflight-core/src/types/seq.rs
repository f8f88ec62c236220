//! Caller-side request sequencing

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{CacheError, Result};

/// Monotonic request ids for discarding out-of-date settles
///
/// Sequencing authority belongs to the requester, not the cache: a caller
/// that may re-issue a logical request before the previous one settles
/// takes an id per invocation and checks it after the await. A stale id
/// means a newer request superseded this one and its result is discarded
/// silently.
///
/// ```
/// use queryflight_core::RequestSeq;
///
/// let seq = RequestSeq::new();
/// let first = seq.issue();
/// let second = seq.issue();
/// assert!(!seq.is_current(first));
/// assert!(seq.is_current(second));
/// ```
#[derive(Debug, Default)]
pub struct RequestSeq {
    latest: AtomicU64,
}

impl RequestSeq {
    /// Create a new sequence starting at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next request id, superseding all earlier ones
    pub fn issue(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// The most recently issued id
    pub fn latest(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    /// True while no newer id has been issued
    pub fn is_current(&self, id: u64) -> bool {
        self.latest() == id
    }

    /// Invalidate every outstanding id without issuing a new one
    pub fn supersede(&self) {
        self.latest.fetch_add(1, Ordering::SeqCst);
    }

    /// Check an id, reporting the discard context on mismatch
    pub fn check(&self, id: u64) -> Result<()> {
        let latest = self.latest();
        if latest == id {
            Ok(())
        } else {
            Err(CacheError::Superseded { issued: id, latest })
        }
    }
}
