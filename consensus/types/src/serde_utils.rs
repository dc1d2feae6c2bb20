//! Serde helpers for `0x`-prefixed hex encodings.

/// Encode `bytes` as a `0x`-prefixed, lower-case hex string.
pub fn hex_encode<T: AsRef<[u8]>>(bytes: T) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Decode a `0x`-prefixed hex string into bytes.
pub fn hex_decode(string: &str) -> Result<Vec<u8>, String> {
    let stripped = string
        .strip_prefix("0x")
        .ok_or_else(|| format!("missing 0x prefix: {}", string))?;
    hex::decode(stripped).map_err(|e| format!("invalid hex: {:?}", e))
}

/// Serde for `Vec<u8>` as `0x`-prefixed hex.
pub mod hex_vec {
    use super::{hex_decode, hex_encode};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex_encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let string = String::deserialize(deserializer)?;
        hex_decode(&string).map_err(D::Error::custom)
    }
}

/// Serde for `[u8; 4]` as `0x`-prefixed hex, as used by fork versions.
pub mod bytes_4_hex {
    use super::{hex_decode, hex_encode};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8; 4], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex_encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 4], D::Error> {
        let string = String::deserialize(deserializer)?;
        let bytes = hex_decode(&string).map_err(D::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| D::Error::custom("fork version is not 4 bytes"))
    }
}
