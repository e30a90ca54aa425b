// crates/auditproof-core/src/types.rs
//
// Fixed-width primitives shared across the workspace: 20-byte account
// addresses and 32-byte words (hashes, ids, ABI-style uint256 values).
// Both travel as `0x`-prefixed lowercase hex strings on the wire.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::AuditProofError;

/// A 20-byte account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The null address.
    pub const ZERO: Address = Address([0u8; 20]);

    /// Parse a `0x`-prefixed, 40-hex-digit address. Case-insensitive.
    pub fn parse(s: &str) -> Result<Self, AuditProofError> {
        let bytes = decode_prefixed_hex(s.trim(), 20)
            .ok_or_else(|| AuditProofError::Validation(format!("Invalid address format: {}", s)))?;
        let mut out = [0u8; 20];
        out.copy_from_slice(&bytes);
        Ok(Address(out))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Left-pad the address into a 32-byte word (ABI `address` encoding).
    pub fn to_word(&self) -> Bytes32 {
        let mut word = [0u8; 32];
        word[12..].copy_from_slice(&self.0);
        Bytes32(word)
    }

    /// Lowercase hex form, used as the case-insensitive store key.
    pub fn to_key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = AuditProofError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::parse(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// A 32-byte word: hashes, credential/proof ids, and uint256 public inputs.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Bytes32(pub [u8; 32]);

/// Transaction hashes are plain 32-byte words.
pub type TxHash = Bytes32;

impl Bytes32 {
    pub const ZERO: Bytes32 = Bytes32([0u8; 32]);

    /// Parse a `0x`-prefixed, 64-hex-digit word.
    pub fn parse(s: &str) -> Result<Self, AuditProofError> {
        let bytes = decode_prefixed_hex(s.trim(), 32)
            .ok_or_else(|| AuditProofError::Validation(format!("Invalid bytes32 value: {}", s)))?;
        let mut out = [0u8; 32];
        out.copy_from_slice(&bytes);
        Ok(Bytes32(out))
    }

    /// Big-endian encoding of a small unsigned integer as a uint256 word.
    pub fn from_u64(value: u64) -> Self {
        let mut word = [0u8; 32];
        word[24..].copy_from_slice(&value.to_be_bytes());
        Bytes32(word)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Bytes32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Bytes32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bytes32({})", self)
    }
}

impl FromStr for Bytes32 {
    type Err = AuditProofError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Bytes32::parse(s)
    }
}

impl From<[u8; 32]> for Bytes32 {
    fn from(bytes: [u8; 32]) -> Self {
        Bytes32(bytes)
    }
}

impl Serialize for Bytes32 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Bytes32 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Bytes32::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Decode `0x` + exactly `len` bytes of hex.
fn decode_prefixed_hex(s: &str, len: usize) -> Option<Vec<u8>> {
    let body = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))?;
    if body.len() != len * 2 {
        return None;
    }
    hex::decode(body).ok()
}

/// Serde adapter for variable-length byte fields carried as `0x` hex.
pub mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        let body = s.strip_prefix("0x").unwrap_or(&s);
        hex::decode(body).map_err(serde::de::Error::custom)
    }
}
