//! Domain primitives: Identity, Timestamp, DaySlot, Digest32.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Seconds in one day slot.
pub const SECONDS_PER_DAY: u64 = 86_400;

/// Longest identity accepted from callers.
pub const MAX_IDENTITY_LEN: usize = 128;

/// Account or actor identity (holder, agent, administrator).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Identity(pub String);

impl Identity {
    /// Create an Identity without validation.
    pub fn new(id: impl Into<String>) -> Self {
        Identity(id.into())
    }

    /// Get the identity as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityParseError {
    #[error("identity must not be empty")]
    Empty,
    #[error("identity longer than {MAX_IDENTITY_LEN} characters")]
    TooLong,
    #[error("identity contains whitespace or control characters")]
    InvalidCharacter,
}

impl FromStr for Identity {
    type Err = IdentityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(IdentityParseError::Empty);
        }
        if trimmed.len() > MAX_IDENTITY_LEN {
            return Err(IdentityParseError::TooLong);
        }
        if trimmed
            .chars()
            .any(|c| c.is_whitespace() || c.is_control())
        {
            return Err(IdentityParseError::InvalidCharacter);
        }
        Ok(Identity(trimmed.to_string()))
    }
}

/// Time in whole seconds since Unix epoch.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub fn new(secs: u64) -> Self {
        Timestamp(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// Current wall-clock time. Pre-epoch clocks read as zero.
    pub fn now() -> Self {
        Timestamp(chrono::Utc::now().timestamp().max(0) as u64)
    }

    /// The day bucket this timestamp falls into.
    pub fn day_slot(&self) -> DaySlot {
        DaySlot(self.0 / SECONDS_PER_DAY)
    }

    pub fn saturating_add_secs(&self, secs: u64) -> Self {
        Timestamp(self.0.saturating_add(secs))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `floor(timestamp / 86400)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DaySlot(pub u64);

impl DaySlot {
    pub fn new(slot: u64) -> Self {
        DaySlot(slot)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for DaySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 256-bit digest, serialized as lowercase hex.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Digest32(pub [u8; 32]);

impl Digest32 {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DigestParseError {
    #[error("digest is not valid hex: {0}")]
    Hex(String),
    #[error("digest must be 32 bytes, got {0}")]
    Length(usize),
}

impl FromStr for Digest32 {
    type Err = DigestParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|e| DigestParseError::Hex(e.to_string()))?;
        let array: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| DigestParseError::Length(bytes.len()))?;
        Ok(Digest32(array))
    }
}

impl fmt::Display for Digest32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for Digest32 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest32 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Digest32::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter writing `u128` as a base-10 string.
///
/// Tagged enums buffer their fields through serde's internal content type,
/// which has no 128-bit integers, and JSON clients lose precision past 2^53.
pub mod amount_str {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_parse_trims() {
        let id = Identity::from_str("  0.0.1234 ").unwrap();
        assert_eq!(id.as_str(), "0.0.1234");
    }

    #[test]
    fn test_identity_parse_rejects_bad_input() {
        assert_eq!(Identity::from_str("   "), Err(IdentityParseError::Empty));
        assert_eq!(
            Identity::from_str("a b"),
            Err(IdentityParseError::InvalidCharacter)
        );
        let long = "x".repeat(MAX_IDENTITY_LEN + 1);
        assert_eq!(Identity::from_str(&long), Err(IdentityParseError::TooLong));
    }

    #[test]
    fn test_day_slot_boundaries() {
        assert_eq!(Timestamp::new(0).day_slot(), DaySlot(0));
        assert_eq!(Timestamp::new(86_399).day_slot(), DaySlot(0));
        assert_eq!(Timestamp::new(86_400).day_slot(), DaySlot(1));
        assert_eq!(Timestamp::new(172_800).day_slot(), DaySlot(2));
    }

    #[test]
    fn test_digest_hex_serialization() {
        let digest = Digest32([0xab; 32]);
        let json = serde_json::to_string(&digest).unwrap();
        assert_eq!(json, format!("\"{}\"", "ab".repeat(32)));
        let back: Digest32 = serde_json::from_str(&json).unwrap();
        assert_eq!(back, digest);
    }

    #[test]
    fn test_digest_parse_accepts_prefix_and_rejects_length() {
        let with_prefix = format!("0x{}", "01".repeat(32));
        assert_eq!(Digest32::from_str(&with_prefix).unwrap(), Digest32([1; 32]));
        assert_eq!(
            Digest32::from_str("abcd"),
            Err(DigestParseError::Length(2))
        );
    }
}
