//! Read-only views over cached values.

use bytes::Bytes;
use std::fmt;

/// An immutable view onto a cached value.
///
/// Values are loaded once and never mutated, so a view is just a refcounted
/// byte buffer. Cloning is cheap and every clone observes the same bytes,
/// which is what lets one load be shared by many waiters and by the local
/// cache at the same time.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ByteView {
    bytes: Bytes,
}

impl ByteView {
    /// Number of bytes in the value. This is the size the LRU accounts for.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true for a zero-length value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Raw byte accessor.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Copies the value into an owned vector, e.g. for wire framing.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }
}

impl From<Vec<u8>> for ByteView {
    fn from(v: Vec<u8>) -> Self {
        Self {
            bytes: Bytes::from(v),
        }
    }
}

impl From<&[u8]> for ByteView {
    fn from(v: &[u8]) -> Self {
        Self {
            bytes: Bytes::copy_from_slice(v),
        }
    }
}

impl From<&str> for ByteView {
    fn from(v: &str) -> Self {
        Self {
            bytes: Bytes::copy_from_slice(v.as_bytes()),
        }
    }
}

impl From<Bytes> for ByteView {
    fn from(bytes: Bytes) -> Self {
        Self { bytes }
    }
}

impl AsRef<[u8]> for ByteView {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Display for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.bytes))
    }
}

impl fmt::Debug for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByteView({} bytes)", self.bytes.len())
    }
}
