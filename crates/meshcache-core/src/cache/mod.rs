//! Local cache storage for a group.
//!
//! The only policy implemented is size-accounted LRU. The cache itself is
//! not thread-safe: the owning [`Group`](crate::group::Group) serializes
//! access behind its mutex, so the hot path pays one lock, not two.

mod lru;

#[cfg(test)]
mod tests;

pub use lru::{CacheStats, EvictionCallback, Lru};
