//! Value codecs.
//!
//! Two interchangeable codecs are provided. They are not bit-compatible with
//! each other: a payload written by one cannot be read by the other.
//!
//! - [`MessagePackSerializer`]: compact binary, keeps full fidelity for every
//!   serde shape.
//! - [`JsonSerializer`]: human-readable, weaker fidelity for some shapes
//!   (non-string map keys, byte arrays, sub-second timestamps depending on
//!   their serde impl).

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

/// Turns values into opaque byte payloads and back.
pub trait Serializer: Send + Sync {
    /// Encodes a value.
    fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>>;

    /// Decodes a payload into an owned value.
    fn deserialize<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T>;

    /// Returns the codec name, used in errors and logs.
    fn name(&self) -> &'static str;
}

/// MessagePack codec backed by `rmp-serde`.
///
/// Structs are written as maps with field names so that optional fields and
/// `skip_serializing_if` round-trip.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessagePackSerializer;

impl Serializer for MessagePackSerializer {
    fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
        rmp_serde::to_vec_named(value).map_err(|e| CacheError::Serialize {
            codec: self.name(),
            message: e.to_string(),
        })
    }

    fn deserialize<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        rmp_serde::from_slice(bytes).map_err(|e| CacheError::Deserialize {
            codec: self.name(),
            message: e.to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "msgpack"
    }
}

/// JSON codec backed by `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| CacheError::Serialize {
            codec: self.name(),
            message: e.to_string(),
        })
    }

    fn deserialize<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        serde_json::from_slice(bytes).map_err(|e| CacheError::Deserialize {
            codec: self.name(),
            message: e.to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "json"
    }
}

/// Codec selected by configuration.
///
/// Deserializes from `"msgpack"` or `"json"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Codec {
    /// Compact binary encoding (default).
    #[default]
    #[serde(alias = "messagepack", alias = "binary")]
    Msgpack,
    /// JSON encoding.
    Json,
}

// `Codec` also derives `serde::Serialize`; the inherent methods keep
// `codec.serialize(..)` unambiguous when both traits are in scope.
impl Codec {
    /// Encodes a value with the selected codec.
    pub fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
        <Self as Serializer>::serialize(self, value)
    }

    /// Decodes a payload with the selected codec.
    pub fn deserialize<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        <Self as Serializer>::deserialize(self, bytes)
    }
}

impl Serializer for Codec {
    fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
        match self {
            Codec::Msgpack => MessagePackSerializer.serialize(value),
            Codec::Json => JsonSerializer.serialize(value),
        }
    }

    fn deserialize<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        match self {
            Codec::Msgpack => MessagePackSerializer.deserialize(bytes),
            Codec::Json => JsonSerializer.deserialize(bytes),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Codec::Msgpack => MessagePackSerializer.name(),
            Codec::Json => JsonSerializer.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Flag {
        name: String,
        enabled: bool,
    }

    #[test]
    fn test_decode_error_names_codec() {
        let err = JsonSerializer.deserialize::<Flag>(b"not json").unwrap_err();
        assert!(matches!(err, CacheError::Deserialize { codec: "json", .. }));

        let err = MessagePackSerializer
            .deserialize::<Flag>(&[0xc1])
            .unwrap_err();
        assert!(matches!(err, CacheError::Deserialize { codec: "msgpack", .. }));
    }

    #[test]
    fn test_codecs_are_not_bit_compatible() {
        let flag = Flag {
            name: "beta".to_string(),
            enabled: true,
        };
        let bytes = Codec::Msgpack.serialize(&flag).unwrap();
        assert!(Codec::Json.deserialize::<Flag>(&bytes).is_err());
    }

    #[test]
    fn test_json_rejects_non_string_map_keys() {
        use std::collections::HashMap;

        let mut by_id: HashMap<(u8, u8), u8> = HashMap::new();
        by_id.insert((1, 2), 3);

        assert!(JsonSerializer.serialize(&by_id).is_err());
        assert!(MessagePackSerializer.serialize(&by_id).is_ok());
    }

    #[test]
    fn test_codec_from_config_string() {
        let codec: Codec = serde_json::from_str("\"json\"").unwrap();
        assert_eq!(codec, Codec::Json);

        let codec: Codec = serde_json::from_str("\"binary\"").unwrap();
        assert_eq!(codec, Codec::Msgpack);

        assert_eq!(Codec::default().name(), "msgpack");
    }
}
