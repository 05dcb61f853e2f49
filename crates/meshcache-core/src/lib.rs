//! # `MeshCache` Core
//!
//! Engine for a distributed, in-memory, read-through key/value cache.
//!
//! A cluster of peer nodes partitions the key space with a consistent-hash
//! ring. Any node answers any key: from its local LRU, from the peer that
//! owns the key, or, on the owning node itself, from a user-supplied loader.
//! Concurrent loads of the same key collapse into one, so a slow backing
//! store sees each key at most once at a time, cluster-wide.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use meshcache_core::{FnLoader, Group};
//! use std::sync::Arc;
//!
//! let loader = Arc::new(FnLoader::new(|key: String| async move {
//!     slow_db_lookup(&key).await
//! }));
//! let group = Group::new("scores", 2 << 10, loader)?;
//!
//! // Same process, any call site:
//! let view = meshcache_core::group::lookup("scores").unwrap().get("Tom").await?;
//! ```
//!
//! The HTTP transport between peers lives in the `meshcache-server` crate;
//! this crate only defines the [`peers::PeerPicker`] and
//! [`peers::PeerGetter`] seams it plugs into.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod config;
pub mod error;
pub mod group;
pub mod peers;
pub mod ring;
pub mod singleflight;
pub mod view;

pub use cache::{CacheStats, Lru};
pub use config::NodeConfig;
pub use error::{Error, Result};
pub use group::{FnLoader, Group, GroupBuilder, GroupStats, Loader, Registry};
pub use peers::{PeerGetter, PeerPicker};
pub use ring::{HashRing, DEFAULT_REPLICAS};
pub use singleflight::SingleFlight;
pub use view::ByteView;
