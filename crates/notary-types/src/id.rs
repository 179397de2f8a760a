use std::fmt;
use std::str::FromStr;

use crate::error::TypeError;

/// Identifier the registry assigns to a document at registration time.
///
/// Opaque to Notary: it is read out of the `DocumentRegistered` event and
/// handed back to the registry on lookups, never derived locally.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId([u8; 32]);

/// Reference to a submitted ledger transaction.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TxHash([u8; 32]);

serde_via_str!(DocumentId);
serde_via_str!(TxHash);

impl DocumentId {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// `0x`-prefixed hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        crate::decode_fixed(s).map(Self)
    }
}

impl TxHash {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// `0x`-prefixed hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        crate::decode_fixed(s).map(Self)
    }
}

impl fmt::Debug for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentId(0x{})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for DocumentId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash(0x{})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for TxHash {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_id_display_is_prefixed() {
        let id = DocumentId::from_bytes([0xab; 32]);
        let text = id.to_string();
        assert!(text.starts_with("0xabab"));
        assert_eq!(text.len(), 66);
    }

    #[test]
    fn document_id_parses_with_or_without_prefix() {
        let id = DocumentId::from_bytes([7; 32]);
        assert_eq!(DocumentId::from_hex(&id.to_hex()).unwrap(), id);
        assert_eq!(DocumentId::from_hex(&id.to_hex()[2..]).unwrap(), id);
    }

    #[test]
    fn tx_hash_serde_roundtrip() {
        let tx = TxHash::from_bytes([0x11; 32]);
        let json = serde_json::to_string(&tx).unwrap();
        assert_eq!(json, format!("\"{}\"", tx.to_hex()));
        let parsed: TxHash = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, tx);
    }

    #[test]
    fn debug_formats() {
        assert_eq!(
            format!("{:?}", DocumentId::from_bytes([1; 32])),
            "DocumentId(0x01010101)"
        );
        assert_eq!(
            format!("{:?}", TxHash::from_bytes([2; 32])),
            "TxHash(0x02020202)"
        );
    }
}
