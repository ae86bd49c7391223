//! Serde helpers for the JSON-RPC encodings used by the Engine API.
//!
//! Quantities are `0x`-prefixed, big-endian hex without leading zeros; byte strings are
//! `0x`-prefixed hex of any length.

/// Parses a `0x`-prefixed hex string, returning the remainder.
fn strip_prefix(hex: &str) -> Result<&str, String> {
    hex.strip_prefix("0x")
        .ok_or_else(|| format!("Hex string did not start with `0x`: {}", hex))
}

/// Serializes a `u64` as a hex quantity, e.g. `1 == "0x1"`.
pub mod u64_hex_be {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(num: &u64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("0x{:x}", num))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: String = Deserialize::deserialize(deserializer)?;
        let stripped = super::strip_prefix(&s).map_err(D::Error::custom)?;
        if stripped.is_empty() {
            return Err(D::Error::custom("empty hex quantity"));
        }
        u64::from_str_radix(stripped, 16)
            .map_err(|e| D::Error::custom(format!("Failed to parse hex as u64: {:?}", e)))
    }
}

/// Serializes a byte vector as a `0x`-prefixed hex string.
pub mod hex_bytes {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: String = Deserialize::deserialize(deserializer)?;
        let stripped = super::strip_prefix(&s).map_err(D::Error::custom)?;
        hex::decode(stripped)
            .map_err(|e| D::Error::custom(format!("Failed to parse hex as bytes: {:?}", e)))
    }
}

/// Serializes a list of byte vectors as a list of hex strings.
pub mod list_of_hex_bytes {
    use serde::de::Error;
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(list: &[Vec<u8>], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(list.len()))?;
        for bytes in list {
            seq.serialize_element(&format!("0x{}", hex::encode(bytes)))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let strings: Vec<String> = Deserialize::deserialize(deserializer)?;
        strings
            .iter()
            .map(|s| {
                let stripped = super::strip_prefix(s).map_err(D::Error::custom)?;
                hex::decode(stripped).map_err(|e| {
                    D::Error::custom(format!("Failed to parse hex as bytes: {:?}", e))
                })
            })
            .collect()
    }
}
