//! queryflight-core: Core traits and types for the queryflight cache
//!
//! This crate provides the foundational types and traits used throughout
//! the queryflight ecosystem.

mod error;
mod traits;
mod types;

pub use error::{CacheError, Result};
pub use traits::*;
pub use types::*;
