//! Peer pool: the ring and the per-peer client table.
//!
//! Both live behind one `RwLock` so membership changes swap them together.
//! `pick_peer` takes the read lock for the table lookup only; the returned
//! client is invoked after the lock is released. `set_peers` builds the new
//! ring and client table off-lock and swaps both in one write section, so a
//! concurrent `pick_peer` sees either the old membership or the new one,
//! never a half-built mix.

use crate::client::HttpClient;
use meshcache_core::ring::DEFAULT_REPLICAS;
use meshcache_core::{HashRing, PeerGetter, PeerPicker, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Tunables for an [`HttpPool`].
#[derive(Debug, Clone)]
pub struct PoolOptions {
    /// URL prefix for node-to-node fetches.
    pub base_path: String,
    /// Virtual nodes per real peer.
    pub replicas: usize,
    /// Deadline for one peer fetch.
    pub peer_timeout: Duration,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            base_path: "/_mesh".to_owned(),
            replicas: DEFAULT_REPLICAS,
            peer_timeout: Duration::from_secs(2),
        }
    }
}

struct PoolState {
    ring: HashRing,
    clients: HashMap<String, Arc<HttpClient>>,
}

/// Peer selector for one node: consistent-hash ring plus client stubs.
pub struct HttpPool {
    self_addr: String,
    options: PoolOptions,
    state: RwLock<PoolState>,
}

impl HttpPool {
    /// Creates a pool for the node at `self_addr` with default options.
    #[must_use]
    pub fn new(self_addr: impl Into<String>) -> Self {
        Self::with_options(self_addr, PoolOptions::default())
    }

    /// Creates a pool with explicit options.
    #[must_use]
    pub fn with_options(self_addr: impl Into<String>, options: PoolOptions) -> Self {
        Self {
            self_addr: self_addr.into(),
            state: RwLock::new(PoolState {
                ring: HashRing::new(options.replicas),
                clients: HashMap::new(),
            }),
            options,
        }
    }

    /// Replaces the cluster membership.
    ///
    /// The new ring and client table are swapped in atomically under the
    /// pool write lock.
    ///
    /// # Errors
    ///
    /// `Internal` if a client stub cannot be constructed.
    pub fn set_peers(&self, peers: &[String]) -> Result<()> {
        let mut ring = HashRing::new(self.options.replicas);
        ring.add(peers);
        let mut clients = HashMap::with_capacity(peers.len());
        for peer in peers {
            clients.insert(
                peer.clone(),
                Arc::new(HttpClient::new(
                    peer,
                    &self.options.base_path,
                    self.options.peer_timeout,
                )?),
            );
        }

        let mut state = self.state.write();
        state.ring = ring;
        state.clients = clients;
        tracing::info!(node = %self.self_addr, peers = peers.len(), "peer set replaced");
        Ok(())
    }

    /// Removes one peer from the ring and the client table.
    ///
    /// Returns true when the peer was known. Safe against concurrent
    /// `pick_peer` calls.
    pub fn remove_peer(&self, name: &str) -> bool {
        let mut state = self.state.write();
        let known = state.clients.remove(name).is_some();
        state.ring.remove(name);
        if known {
            tracing::info!(node = %self.self_addr, peer = name, "peer removed");
        }
        known
    }

    /// The ring owner of `key`, self included. `None` on an empty ring.
    #[must_use]
    pub fn owner(&self, key: &str) -> Option<String> {
        self.state.read().ring.get(key).map(str::to_owned)
    }

    /// Addresses currently in the client table, sorted.
    #[must_use]
    pub fn peers(&self) -> Vec<String> {
        let mut peers: Vec<String> = self.state.read().clients.keys().cloned().collect();
        peers.sort();
        peers
    }

    /// This node's own address.
    #[must_use]
    pub fn self_addr(&self) -> &str {
        &self.self_addr
    }

    /// URL prefix for node-to-node fetches.
    #[must_use]
    pub fn base_path(&self) -> &str {
        &self.options.base_path
    }
}

impl PeerPicker for HttpPool {
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerGetter>> {
        let state = self.state.read();
        let owner = state.ring.get(key)?;
        if owner == self.self_addr {
            tracing::debug!(node = %self.self_addr, key, "key owned by this node");
            return None;
        }
        let client = state.clients.get(owner)?;
        tracing::debug!(node = %self.self_addr, key, peer = owner, "picked peer");
        let client: Arc<dyn PeerGetter> = Arc::clone(client) as Arc<dyn PeerGetter>;
        Some(client)
    }
}

impl std::fmt::Debug for HttpPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpPool")
            .field("self_addr", &self.self_addr)
            .field("peers", &self.state.read().clients.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_peer_pool(self_addr: &str) -> (HttpPool, Vec<String>) {
        let peers: Vec<String> = ["8001", "8002", "8003"]
            .iter()
            .map(|p| format!("http://localhost:{p}"))
            .collect();
        let pool = HttpPool::new(self_addr);
        pool.set_peers(&peers).unwrap();
        (pool, peers)
    }

    #[test]
    fn test_owner_is_deterministic_across_pools() {
        let (a, _) = three_peer_pool("http://localhost:8001");
        let (b, _) = three_peer_pool("http://localhost:8002");

        for key in ["Tom", "Jack", "Sam", "k"] {
            assert_eq!(a.owner(key), b.owner(key), "disagreement on {key:?}");
        }
    }

    #[test]
    fn test_pick_peer_returns_none_for_self_owner() {
        let peers = vec!["http://localhost:8001".to_owned()];
        let pool = HttpPool::new("http://localhost:8001");
        pool.set_peers(&peers).unwrap();

        // The only peer on the ring is self.
        assert!(pool.pick_peer("any-key").is_none());
    }

    #[test]
    fn test_pick_peer_returns_none_on_empty_ring() {
        let pool = HttpPool::new("http://localhost:8001");
        assert!(pool.pick_peer("k").is_none());
    }

    #[test]
    fn test_pick_peer_finds_remote_owner() {
        // Self is not part of the peer set, so every key has a remote owner.
        let (pool, _) = three_peer_pool("http://localhost:9999");
        assert!(pool.pick_peer("Tom").is_some());
    }

    #[test]
    fn test_remove_peer_updates_ring_and_clients() {
        let (pool, peers) = three_peer_pool("http://localhost:9999");

        assert!(pool.remove_peer(&peers[1]));
        assert!(!pool.remove_peer(&peers[1]));

        assert_eq!(pool.peers(), vec![peers[0].clone(), peers[2].clone()]);
        for i in 0..128 {
            let owner = pool.owner(&format!("key{i}")).expect("ring not empty");
            assert_ne!(owner, peers[1]);
        }
    }

    #[test]
    fn test_set_peers_replaces_membership() {
        let (pool, _) = three_peer_pool("http://localhost:9999");
        let next = vec!["http://localhost:8010".to_owned()];
        pool.set_peers(&next).unwrap();

        assert_eq!(pool.peers(), next);
        assert_eq!(pool.owner("k"), Some(next[0].clone()));
    }
}
