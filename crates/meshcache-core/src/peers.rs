//! Capability traits for locating and querying remote peers.
//!
//! The engine never talks to the network itself. The server crate implements
//! [`PeerGetter`] over its HTTP client and [`PeerPicker`] over its pool, and
//! a group composes the two without knowing the transport.

use crate::error::Result;
use crate::view::ByteView;
use async_trait::async_trait;
use std::sync::Arc;

/// Fetches a value for `(group, key)` from one remote peer.
#[async_trait]
pub trait PeerGetter: Send + Sync {
    /// Performs one round-trip to the peer and returns the raw value.
    ///
    /// # Errors
    ///
    /// `PeerTransport` on network failure, timeout or a non-success reply;
    /// `Decode` when the reply cannot be unframed.
    async fn get(&self, group: &str, key: &str) -> Result<ByteView>;
}

/// Selects the peer that owns a key.
pub trait PeerPicker: Send + Sync {
    /// Returns the client for the key's owner, or `None` when this node is
    /// the owner itself or no peers are known.
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerGetter>>;
}
