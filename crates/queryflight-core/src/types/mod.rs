//! Core types for cache coordination

mod config;
mod entry;
mod fetched;
mod options;
mod seq;
mod stats;

pub use config::CacheConfig;
pub use entry::{EntryCell, QueryEntry, Scope, Stage, Waiter};
pub use fetched::Fetched;
pub use options::{ResolveOptions, ResolveOpts};
pub use seq::RequestSeq;
pub use stats::CacheStats;
