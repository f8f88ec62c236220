//! queryflight-store: Bounded LRU storage for queryflight
//!
//! A single data structure lives here: [`LruStore`], the fixed-capacity
//! recency-ordered map the coordinator keeps its entries in. Thread safety
//! is deliberately not this crate's concern; the coordinator owns the store
//! behind its own lock.

mod lru;

pub use lru::{Entries, LruStore};
