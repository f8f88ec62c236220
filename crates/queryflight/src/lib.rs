//! queryflight: Asynchronous result cache with request coalescing
//!
//! # Features
//!
//! - **Request coalescing**: at most one producer invocation in flight per
//!   key; every concurrent caller receives the same settled result
//! - **Recency-bounded storage**: fixed-capacity LRU store with O(1)
//!   promote and evict
//! - **Staleness tracking**: a fresh producer run is triggered only when
//!   the cached result has aged out, was invalidated, or a refresh is forced
//! - **Subscriber fan-out**: long-lived listeners notified on every
//!   successful settle for their key
//! - **Metrics integration** via the `metrics` or `tracing` features
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use queryflight::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let cache: QueryCache<String> = QueryCache::new();
//!
//!     let user = cache
//!         .resolve("user:42", || async {
//!             // stand-in for the real network call
//!             Ok(Fetched::new("Ada Lovelace".to_string()))
//!         })
//!         .await?;
//!
//!     println!("Got: {}", user.value);
//!     Ok(())
//! }
//! ```

mod coordinator;

// Re-export core
pub use queryflight_core::*;

// Re-export storage
pub use queryflight_store::LruStore;

// Export coordinator
pub use coordinator::QueryCache;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        CacheConfig, CacheError, CacheStats, ChannelSubscriber, Fetched, QueryCache, RequestSeq,
        ResolveOpts, ResolveOptions, Result, Scope, Stage, Subscribe, SubscriberHandle,
    };
}
