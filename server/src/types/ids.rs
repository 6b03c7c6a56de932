//! Object identifiers for users and resources.
//!
//! Every stored document is keyed by an `ObjectId`: 12 bytes laid out as a
//! 4-byte big-endian creation timestamp (seconds), 5 bytes of per-process
//! randomness and a 3-byte big-endian counter. On the wire it is always 24
//! lowercase hex characters.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Length of an object id in bytes.
pub const OBJECT_ID_LEN: usize = 12;

/// Counter values wrap at 24 bits.
const COUNTER_MASK: u32 = 0x00FF_FFFF;

static COUNTER: AtomicU32 = AtomicU32::new(0);
static PROCESS_UNIQUE: OnceLock<[u8; 5]> = OnceLock::new();

/// Error returned when a string is not a well-formed object id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid object id '{0}': expected 24 hex characters")]
pub struct InvalidObjectId(pub String);

/// A unique identifier for a stored document.
///
/// # Invariants
///
/// - The ID is exactly 12 bytes.
/// - IDs generated by one process are strictly increasing until the counter wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId([u8; OBJECT_ID_LEN]);

impl ObjectId {
    /// Generate a fresh id stamped with the current time.
    #[must_use]
    pub fn new() -> Self {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let seconds = chrono::Utc::now().timestamp().max(0) as u32;
        Self::from_parts(seconds, *PROCESS_UNIQUE.get_or_init(rand::random), next_count())
    }

    fn from_parts(seconds: u32, unique: [u8; 5], count: u32) -> Self {
        let mut bytes = [0u8; OBJECT_ID_LEN];
        bytes[..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..9].copy_from_slice(&unique);
        bytes[9..].copy_from_slice(&count.to_be_bytes()[1..]);
        Self(bytes)
    }

    /// Parse a 24-character hex string.
    ///
    /// # Errors
    ///
    /// Returns `InvalidObjectId` if the input has the wrong length or
    /// contains non-hex characters.
    pub fn parse_str(s: &str) -> Result<Self, InvalidObjectId> {
        let mut bytes = [0u8; OBJECT_ID_LEN];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| InvalidObjectId(s.to_string()))?;
        Ok(Self(bytes))
    }

    /// Seconds since Unix epoch at which this id was generated.
    #[must_use]
    pub const fn timestamp(&self) -> u32 {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }

    /// Get the underlying byte array.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; OBJECT_ID_LEN] {
        &self.0
    }

    /// Lowercase hex rendering.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

fn next_count() -> u32 {
    COUNTER.fetch_add(1, Ordering::Relaxed) & COUNTER_MASK
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = InvalidObjectId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl From<[u8; OBJECT_ID_LEN]> for ObjectId {
    fn from(bytes: [u8; OBJECT_ID_LEN]) -> Self {
        Self(bytes)
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse_str(&s).map_err(serde::de::Error::custom)
    }
}
