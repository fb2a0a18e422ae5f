//! Loaders behind the three aggregation caches. Each one gathers a domain's
//! payload from its upstream sources; the cache decides when they run.

pub mod github;
pub mod rss;
pub mod youtube;

/// Upstream requests issued concurrently per batch.
pub const BATCH_SIZE: usize = 5;
