//! Foundation types for Notary.
//!
//! Notary anchors document content hashes to an external registry contract
//! and later re-derives them to prove a file existed, unmodified, at a point
//! in time. Every other Notary crate depends on `notary-types`.
//!
//! # Key Types
//!
//! - [`DocumentHash`]: SHA-256 content fingerprint (64 lowercase hex chars)
//! - [`DocumentId`]: Ledger-assigned 32-byte document identifier
//! - [`Address`]: 20-byte ledger identity (`0x` + 40 hex chars)
//! - [`TxHash`]: Transaction reference returned on submission
//! - [`Document`] / [`DocumentRecord`]: Registered document fields
//! - [`TransactionReceipt`]: Confirmation record with emitted logs

/// Implements `Serialize`/`Deserialize` through `Display`/`FromStr`, so hex
/// identifiers appear as plain strings in JSON.
macro_rules! serde_via_str {
    ($ty:ty) => {
        impl serde::Serialize for $ty {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

pub mod address;
pub mod document;
pub mod error;
pub mod hash;
pub mod id;
pub mod receipt;

pub use address::Address;
pub use document::{Document, DocumentRecord};
pub use error::TypeError;
pub use hash::DocumentHash;
pub use id::{DocumentId, TxHash};
pub use receipt::{LogEntry, ReceiptStatus, TransactionReceipt};

/// Decode a hex string of exactly `N` bytes. A leading `0x` is tolerated.
pub(crate) fn decode_fixed<const N: usize>(s: &str) -> Result<[u8; N], TypeError> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
    if bytes.len() != N {
        return Err(TypeError::InvalidLength {
            expected: N,
            actual: bytes.len(),
        });
    }
    let mut arr = [0u8; N];
    arr.copy_from_slice(&bytes);
    Ok(arr)
}
