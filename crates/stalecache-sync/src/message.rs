//! Invalidation wire message.

use serde::{Deserialize, Serialize};
use stalecache_core::{CacheError, Result};

/// Operation carried by an [`InvalidationMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Remove one key.
    Invalidate,
    /// Remove every key of a cache.
    InvalidateAll,
    /// Any command this version does not know; receivers ignore it.
    #[serde(other)]
    Unknown,
}

/// Event published on the bus for every local invalidation.
///
/// Encoded as JSON with the field names `Sender`, `Command`, `CacheName` and
/// `Key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InvalidationMessage {
    /// Instance id of the publishing propagator.
    pub sender: String,
    /// Operation to apply.
    pub command: Command,
    /// Target cache.
    pub cache_name: String,
    /// Target key, only present for [`Command::Invalidate`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl InvalidationMessage {
    /// Creates a single-key invalidation.
    pub fn invalidate(
        sender: impl Into<String>,
        cache_name: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            sender: sender.into(),
            command: Command::Invalidate,
            cache_name: cache_name.into(),
            key: Some(key.into()),
        }
    }

    /// Creates a whole-cache invalidation.
    pub fn invalidate_all(sender: impl Into<String>, cache_name: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            command: Command::InvalidateAll,
            cache_name: cache_name.into(),
            key: None,
        }
    }

    /// Encodes the message for the bus.
    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| CacheError::Serialize {
            codec: "json",
            message: e.to_string(),
        })
    }

    /// Decodes a message received from the bus.
    pub fn decode(payload: &[u8]) -> Result<Self> {
        serde_json::from_slice(payload).map_err(|e| CacheError::Deserialize {
            codec: "json",
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalidate_wire_format() {
        let msg = InvalidationMessage::invalidate("node-a", "orders", "42");
        let json: serde_json::Value = serde_json::from_slice(&msg.encode().unwrap()).unwrap();

        assert_eq!(json["Sender"], "node-a");
        assert_eq!(json["Command"], "Invalidate");
        assert_eq!(json["CacheName"], "orders");
        assert_eq!(json["Key"], "42");
    }

    #[test]
    fn test_invalidate_all_omits_key() {
        let msg = InvalidationMessage::invalidate_all("node-a", "orders");
        let json: serde_json::Value = serde_json::from_slice(&msg.encode().unwrap()).unwrap();

        assert_eq!(json["Command"], "InvalidateAll");
        assert!(json.get("Key").is_none());
    }

    #[test]
    fn test_decode_round_trip() {
        let msg = InvalidationMessage::invalidate("node-a", "orders", "42");
        let decoded = InvalidationMessage::decode(&msg.encode().unwrap()).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_unknown_command_decodes() {
        let payload = br#"{"Sender":"x","Command":"Flush","CacheName":"orders"}"#;
        let msg = InvalidationMessage::decode(payload).unwrap();

        assert_eq!(msg.command, Command::Unknown);
        assert_eq!(msg.key, None);
    }

    #[test]
    fn test_garbage_payload_is_an_error() {
        let err = InvalidationMessage::decode(b"\x00\x01").unwrap_err();
        assert!(matches!(err, CacheError::Deserialize { codec: "json", .. }));
    }
}
