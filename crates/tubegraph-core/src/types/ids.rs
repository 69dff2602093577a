/// Module containing the fixed-size identifier used for every entity and edge.
/// Uses base62 encoding [0-9a-zA-Z] for human-readable string representation while
/// keeping a fixed memory layout that is cheap to hash, copy and compare.

use std::fmt;
use std::str::FromStr;
use rand::{rng, Rng};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use crate::constants::{BASE62_CHARS, ID16_LENGTH};

/// Fixed-size 16-byte identifier.
///
/// Memory Layout:
/// - [u8; 16] - Fixed array of base62 characters
///
/// Ordering is byte-wise, which for base62 strings is the same as string
/// ordering. Views rely on this to break sort ties deterministically.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ID16([u8; ID16_LENGTH]);

impl ID16 {
    /// Get the underlying bytes
    pub fn as_bytes(&self) -> &[u8; ID16_LENGTH] {
        &self.0
    }

    /// Generate a random 16-character base62 ID
    pub fn random() -> Self {
        let mut rng = rng();
        let mut bytes = [0u8; ID16_LENGTH];

        for byte in bytes.iter_mut() {
            *byte = BASE62_CHARS[rng.random_range(0..BASE62_CHARS.len())];
        }

        ID16(bytes)
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &str {
        // Construction guarantees every byte is a base62 ASCII character
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl fmt::Display for ID16 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ID16 {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != ID16_LENGTH {
            return Err("ID16 must be exactly 16 characters");
        }
        if !s.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err("ID16 must only contain base62 characters");
        }

        let mut bytes = [0u8; ID16_LENGTH];
        bytes.copy_from_slice(s.as_bytes());
        Ok(ID16(bytes))
    }
}

impl Serialize for ID16 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ID16 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IdVisitor;

        impl<'de> Visitor<'de> for IdVisitor {
            type Value = ID16;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a 16 character base62 identifier")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<ID16, E> {
                value.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_str(IdVisitor)
    }
}

impl From<ID16> for serde_json::Value {
    fn from(id: ID16) -> Self {
        serde_json::Value::String(id.to_string())
    }
}
