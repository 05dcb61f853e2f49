//! Wire messages exchanged between nodes.
//!
//! Values travel as a bincode frame with a single `value` field, so fields
//! (version, TTL) can be added later without breaking the wire. Failure
//! notices travel as JSON because the sentinel endpoint is also an admin
//! surface people poke with curl.

use chrono::{DateTime, Utc};
use meshcache_core::{ByteView, Error, Result};
use serde::{Deserialize, Serialize};

/// Framed value payload of a peer fetch response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueFrame {
    /// Raw value bytes. Content-agnostic.
    pub value: Vec<u8>,
}

/// Encodes a value view into a response frame.
pub fn encode_value(view: &ByteView) -> Result<Vec<u8>> {
    bincode::serialize(&ValueFrame {
        value: view.to_vec(),
    })
    .map_err(|e| Error::Internal(format!("value frame encode: {e}")))
}

/// Decodes a peer response frame back into a value view.
pub fn decode_value(bytes: &[u8]) -> Result<ByteView> {
    let frame: ValueFrame =
        bincode::deserialize(bytes).map_err(|e| Error::Decode(e.to_string()))?;
    Ok(ByteView::from(frame.value))
}

/// Body of a `PUT /sentinel` failure notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureNotice {
    /// When the sentinel declared the peer dead.
    pub detected_time: DateTime<Utc>,
    /// Identity of the reporting sentinel.
    pub sentinel_name: String,
    /// The peer that was declared dead.
    pub peer_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_frame_roundtrip() {
        let view = ByteView::from("630");
        let encoded = encode_value(&view).unwrap();
        let decoded = decode_value(&encoded).unwrap();
        assert_eq!(decoded, view);
    }

    #[test]
    fn test_garbage_frame_is_a_decode_error() {
        let err = decode_value(&[0xff; 3]).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
        assert!(err.is_soft());
    }

    #[test]
    fn test_failure_notice_json_field_names() {
        let notice = FailureNotice {
            detected_time: Utc::now(),
            sentinel_name: "http://localhost:10000".to_owned(),
            peer_name: "http://localhost:8002".to_owned(),
        };
        let json = serde_json::to_string(&notice).unwrap();
        assert!(json.contains("\"detected_time\""));
        assert!(json.contains("\"sentinel_name\""));
        assert!(json.contains("\"peer_name\""));

        let back: FailureNotice = serde_json::from_str(&json).unwrap();
        assert_eq!(back.peer_name, notice.peer_name);
    }
}
