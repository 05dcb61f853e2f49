//! Error types for `MeshCache`.
//!
//! A single error enum covers the whole engine so that flight waiters can
//! share one result and the server crate can map variants onto HTTP statuses.

use thiserror::Error;

/// Result type alias for `MeshCache` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving a key through the cluster.
///
/// The enum is `Clone` because a single load outcome is broadcast to every
/// coalesced waiter of the same key.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The caller passed an empty key.
    #[error("key must not be empty")]
    EmptyKey,

    /// No group with the given name is registered on this node.
    #[error("no such group '{0}'")]
    GroupNotFound(String),

    /// The loader declared the key nonexistent.
    #[error("key '{0}' not found")]
    NotFound(String),

    /// Network failure, timeout or non-success status from a peer.
    ///
    /// Soft: the group falls back to a local load.
    #[error("peer transport error: {0}")]
    PeerTransport(String),

    /// The peer replied, but the response frame could not be decoded.
    ///
    /// Soft: treated like a transport failure.
    #[error("malformed peer response: {0}")]
    Decode(String),

    /// The loader reported a failure other than a missing key.
    ///
    /// Surfaced verbatim to the caller and never cached.
    #[error("loader error: {0}")]
    Loader(String),

    /// Invalid setup: duplicate group name, double peer registration,
    /// rejected configuration value. Fatal at startup.
    #[error("configuration error: {0}")]
    Config(String),

    /// An in-flight load was torn down before publishing a result.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns true when the group should fall back to a local load
    /// instead of surfacing this error to the caller.
    #[must_use]
    pub const fn is_soft(&self) -> bool {
        matches!(self, Self::PeerTransport(_) | Self::Decode(_))
    }

    /// Returns true for errors caused by the request itself rather than
    /// by the cluster.
    #[must_use]
    pub const fn is_bad_request(&self) -> bool {
        matches!(self, Self::EmptyKey | Self::GroupNotFound(_))
    }
}
