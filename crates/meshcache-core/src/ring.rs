//! Consistent-hash ring with virtual nodes.
//!
//! Each real peer contributes `replicas` hash points, computed from the
//! preimage `"{i}{name}"` for `i` in `0..replicas`. The preimage layout is
//! part of the wire contract: every node must derive the same points for the
//! same peer, otherwise the cluster disagrees on key ownership.
//!
//! Lookup hashes the key and binary-searches the sorted point sequence for
//! the first point at or past the hash, wrapping to the first point when the
//! hash lands past the end. The default hash is CRC32/IEEE.

use std::collections::HashMap;

/// Pluggable ring hash. Must match on every node of the cluster.
pub type HashFn = fn(&[u8]) -> u32;

/// Default virtual-node multiplier per real peer.
pub const DEFAULT_REPLICAS: usize = 3;

/// Consistent-hash ring mapping keys to peer names.
#[derive(Clone)]
pub struct HashRing {
    replicas: usize,
    hash: HashFn,
    points: Vec<u32>,
    owners: HashMap<u32, String>,
}

impl HashRing {
    /// Creates an empty ring with `replicas` virtual nodes per peer and the
    /// CRC32/IEEE hash.
    #[must_use]
    pub fn new(replicas: usize) -> Self {
        Self::with_hasher(replicas, crc32fast::hash)
    }

    /// Creates an empty ring with a custom hash function.
    #[must_use]
    pub fn with_hasher(replicas: usize, hash: HashFn) -> Self {
        Self {
            replicas,
            hash,
            points: Vec::new(),
            owners: HashMap::new(),
        }
    }

    /// Adds real peers to the ring.
    ///
    /// Every name contributes `replicas` hash points; the point sequence is
    /// re-sorted once after all names are processed.
    pub fn add<S: AsRef<str>>(&mut self, names: &[S]) {
        for name in names {
            let name = name.as_ref();
            for i in 0..self.replicas {
                let point = (self.hash)(format!("{i}{name}").as_bytes());
                self.points.push(point);
                self.owners.insert(point, name.to_owned());
            }
        }
        self.points.sort_unstable();
    }

    /// Returns the peer owning `key`, or `None` on an empty ring.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        if self.points.is_empty() {
            return None;
        }
        let hash = (self.hash)(key.as_bytes());
        let idx = self.points.partition_point(|&p| p < hash);
        let point = if idx == self.points.len() {
            self.points[0]
        } else {
            self.points[idx]
        };
        self.owners.get(&point).map(String::as_str)
    }

    /// Removes a peer and the hash points it produced.
    pub fn remove(&mut self, name: &str) {
        for i in 0..self.replicas {
            let point = (self.hash)(format!("{i}{name}").as_bytes());
            if self.owners.remove(&point).is_some() {
                if let Ok(pos) = self.points.binary_search(&point) {
                    self.points.remove(pos);
                }
            }
        }
    }

    /// Number of hash points currently on the ring.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true when no peers are on the ring.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns true if `name` currently owns at least one hash point.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.owners.values().any(|owner| owner == name)
    }
}

impl Default for HashRing {
    fn default() -> Self {
        Self::new(DEFAULT_REPLICAS)
    }
}

impl std::fmt::Debug for HashRing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashRing")
            .field("replicas", &self.replicas)
            .field("points", &self.points.len())
            .finish_non_exhaustive()
    }
}
