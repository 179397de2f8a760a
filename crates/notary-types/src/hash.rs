use std::fmt;
use std::str::FromStr;

use crate::error::TypeError;

/// SHA-256 fingerprint of a document's content.
///
/// Rendered as 64 lowercase hex characters without a prefix, which is also
/// the exact string the registry contract stores. Identical content always
/// produces the same `DocumentHash` on every machine.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentHash([u8; 32]);

serde_via_str!(DocumentHash);

impl DocumentHash {
    /// Length of the hex rendering.
    pub const HEX_LEN: usize = 64;

    /// Wrap a pre-computed 32-byte digest.
    pub const fn from_digest(digest: [u8; 32]) -> Self {
        Self(digest)
    }

    /// The raw 32-byte digest.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex-encoded string representation (no prefix).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from a hex string. A leading `0x` is accepted.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        crate::decode_fixed(s).map(Self)
    }
}

impl fmt::Debug for DocumentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentHash({})", self.short_hex())
    }
}

impl fmt::Display for DocumentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for DocumentHash {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<[u8; 32]> for DocumentHash {
    fn from(digest: [u8; 32]) -> Self {
        Self(digest)
    }
}
