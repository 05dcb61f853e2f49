//! The group: a named cache and its lookup pipeline.
//!
//! A read of key `k` walks three tiers. The local LRU answers hits under the
//! group mutex. Misses funnel through the single-flight coalescer, where the
//! winning caller asks the peer picker for `k`'s owner: a remote owner is
//! queried over the peer transport, and on self-ownership or peer failure
//! the user-supplied loader computes the value. Either way the result lands
//! in the local LRU before it is returned, and every concurrent caller of
//! `k` shares that one result.

use crate::cache::Lru;
use crate::error::{Error, Result};
use crate::peers::PeerPicker;
use crate::singleflight::SingleFlight;
use crate::view::ByteView;
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

/// The user-supplied source of truth behind a group.
///
/// Invoked only on a cache miss that this node must answer itself, at most
/// once per key at a time.
#[async_trait]
pub trait Loader: Send + Sync {
    /// Computes the value for `key`.
    ///
    /// # Errors
    ///
    /// `NotFound` when the key does not exist; any other error is surfaced
    /// verbatim to every waiting caller and never cached.
    async fn load(&self, key: &str) -> Result<Vec<u8>>;
}

/// Adapter implementing [`Loader`] for a plain async closure.
pub struct FnLoader<F> {
    f: F,
}

impl<F> FnLoader<F> {
    /// Wraps a closure as a loader.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut> Loader for FnLoader<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<u8>>> + Send,
{
    async fn load(&self, key: &str) -> Result<Vec<u8>> {
        (self.f)(key.to_owned()).await
    }
}

/// Point-in-time counters for one group.
#[derive(Debug, Clone, Serialize)]
pub struct GroupStats {
    /// Group name.
    pub name: String,
    /// Resident cache entries.
    pub entries: usize,
    /// Accounted cache bytes.
    pub used_bytes: u64,
    /// Configured cache ceiling (0 = unbounded).
    pub max_bytes: u64,
    /// Local cache hits.
    pub hits: u64,
    /// Local cache misses.
    pub misses: u64,
    /// Entries evicted so far.
    pub evictions: u64,
    /// Coalesced loads that went through the flight.
    pub loads: u64,
    /// Loads answered by this node's loader.
    pub local_loads: u64,
    /// Loads answered by a remote peer.
    pub peer_loads: u64,
    /// Peer fetches that failed and fell back to the loader.
    pub peer_errors: u64,
}

struct GroupInner {
    name: String,
    cache: Mutex<Lru>,
    loader: Arc<dyn Loader>,
    peers: OnceLock<Arc<dyn PeerPicker>>,
    flight: SingleFlight,
    cache_remote: bool,
    loads: AtomicU64,
    local_loads: AtomicU64,
    peer_loads: AtomicU64,
    peer_errors: AtomicU64,
}

/// A named cache with a peer-aware read pipeline.
///
/// Cheap to clone; clones share the same cache, loader and flight.
#[derive(Clone)]
pub struct Group {
    inner: Arc<GroupInner>,
}

/// Configures and constructs a [`Group`].
pub struct GroupBuilder {
    name: String,
    max_bytes: u64,
    loader: Arc<dyn Loader>,
    cache_remote: bool,
}

impl GroupBuilder {
    /// Cache ceiling in bytes. 0 disables eviction. Defaults to 0.
    #[must_use]
    pub fn max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Whether values fetched from a remote owner are also cached locally
    /// (passive replication). Defaults to true.
    #[must_use]
    pub fn cache_remote(mut self, cache_remote: bool) -> Self {
        self.cache_remote = cache_remote;
        self
    }

    /// Builds the group without registering it anywhere.
    #[must_use]
    pub fn build(self) -> Group {
        Group {
            inner: Arc::new(GroupInner {
                name: self.name,
                cache: Mutex::new(Lru::new(self.max_bytes)),
                loader: self.loader,
                peers: OnceLock::new(),
                flight: SingleFlight::new(),
                cache_remote: self.cache_remote,
                loads: AtomicU64::new(0),
                local_loads: AtomicU64::new(0),
                peer_loads: AtomicU64::new(0),
                peer_errors: AtomicU64::new(0),
            }),
        }
    }
}

impl Group {
    /// Starts building a group with the given name and loader.
    pub fn builder(name: impl Into<String>, loader: Arc<dyn Loader>) -> GroupBuilder {
        GroupBuilder {
            name: name.into(),
            max_bytes: 0,
            loader,
            cache_remote: true,
        }
    }

    /// Builds a group and registers it in the process-wide registry.
    ///
    /// # Errors
    ///
    /// `Config` when a group with this name already exists.
    pub fn new(name: impl Into<String>, max_bytes: u64, loader: Arc<dyn Loader>) -> Result<Self> {
        let group = Self::builder(name, loader).max_bytes(max_bytes).build();
        global().add(group.clone())?;
        Ok(group)
    }

    /// Group name, as used in peer URLs and registries.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Attaches the peer picker. May be called at most once.
    ///
    /// # Errors
    ///
    /// `Config` on a second registration.
    pub fn register_peers(&self, peers: Arc<dyn PeerPicker>) -> Result<()> {
        self.inner.peers.set(peers).map_err(|_| {
            Error::Config(format!(
                "peers already registered for group '{}'",
                self.inner.name
            ))
        })
    }

    /// Resolves `key` through the cache, the owning peer, or the loader.
    ///
    /// # Errors
    ///
    /// `EmptyKey` for an empty key, `NotFound` when the loader declares the
    /// key nonexistent, `Loader` for loader failures. Peer failures are not
    /// surfaced; they fall back to the local loader.
    pub async fn get(&self, key: &str) -> Result<ByteView> {
        if key.is_empty() {
            return Err(Error::EmptyKey);
        }
        if let Some(view) = self.inner.cache.lock().get(key) {
            tracing::debug!(group = %self.inner.name, key, "cache hit");
            return Ok(view);
        }
        self.load(key).await
    }

    /// Point-in-time counters for monitoring.
    #[must_use]
    pub fn stats(&self) -> GroupStats {
        let (entries, used_bytes, max_bytes, cache_stats) = {
            let cache = self.inner.cache.lock();
            (
                cache.len(),
                cache.used_bytes(),
                cache.max_bytes(),
                cache.stats(),
            )
        };
        GroupStats {
            name: self.inner.name.clone(),
            entries,
            used_bytes,
            max_bytes,
            hits: cache_stats.hits,
            misses: cache_stats.misses,
            evictions: cache_stats.evictions,
            loads: self.inner.loads.load(Ordering::Relaxed),
            local_loads: self.inner.local_loads.load(Ordering::Relaxed),
            peer_loads: self.inner.peer_loads.load(Ordering::Relaxed),
            peer_errors: self.inner.peer_errors.load(Ordering::Relaxed),
        }
    }

    async fn load(&self, key: &str) -> Result<ByteView> {
        let inner = Arc::clone(&self.inner);
        let key_owned = key.to_owned();
        self.inner
            .flight
            .run(key, move || async move {
                inner.loads.fetch_add(1, Ordering::Relaxed);

                if let Some(picker) = inner.peers.get() {
                    if let Some(peer) = picker.pick_peer(&key_owned) {
                        match peer.get(&inner.name, &key_owned).await {
                            Ok(view) => {
                                inner.peer_loads.fetch_add(1, Ordering::Relaxed);
                                tracing::debug!(
                                    group = %inner.name,
                                    key = %key_owned,
                                    "loaded from peer"
                                );
                                if inner.cache_remote {
                                    inner.cache.lock().add(&key_owned, view.clone());
                                }
                                return Ok(view);
                            }
                            Err(err) => {
                                inner.peer_errors.fetch_add(1, Ordering::Relaxed);
                                tracing::warn!(
                                    group = %inner.name,
                                    key = %key_owned,
                                    error = %err,
                                    "peer fetch failed, falling back to local load"
                                );
                            }
                        }
                    }
                }

                let bytes = inner.loader.load(&key_owned).await?;
                let view = ByteView::from(bytes);
                inner.local_loads.fetch_add(1, Ordering::Relaxed);
                inner.cache.lock().add(&key_owned, view.clone());
                Ok(view)
            })
            .await
    }
}

impl std::fmt::Debug for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Group")
            .field("name", &self.inner.name)
            .finish_non_exhaustive()
    }
}

/// A name-to-group table.
///
/// The process-wide default lives behind [`global()`]; servers that host
/// several nodes in one process (tests, embedded setups) construct their own.
#[derive(Default)]
pub struct Registry {
    groups: RwLock<HashMap<String, Group>>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a group under its name.
    ///
    /// # Errors
    ///
    /// `Config` when the name is already taken.
    pub fn add(&self, group: Group) -> Result<()> {
        let mut groups = self.groups.write();
        let name = group.name().to_owned();
        if groups.contains_key(&name) {
            return Err(Error::Config(format!("group '{name}' already exists")));
        }
        groups.insert(name, group);
        Ok(())
    }

    /// Looks up a group by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Group> {
        self.groups.read().get(name).cloned()
    }

    /// Names of all registered groups.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.groups.read().keys().cloned().collect()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("groups", &self.groups.read().len())
            .finish()
    }
}

static GLOBAL: OnceLock<Registry> = OnceLock::new();

/// The process-wide registry used by [`Group::new`].
pub fn global() -> &'static Registry {
    GLOBAL.get_or_init(Registry::default)
}

/// Looks up a group in the process-wide registry.
#[must_use]
pub fn lookup(name: &str) -> Option<Group> {
    global().get(name)
}
