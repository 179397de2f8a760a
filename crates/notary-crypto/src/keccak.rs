//! Keccak-256 helpers for the contract ABI.
//!
//! Function selectors are the first four bytes of the Keccak-256 hash of the
//! canonical signature; event topics are the full hash.

use sha3::{Digest, Keccak256};

/// Keccak-256 (the pre-standard variant used by EVM ledgers, not SHA3-256).
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// Four-byte selector for a canonical function signature such as
/// `"getDocument(bytes32)"`.
pub fn function_selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Topic hash for a canonical event signature.
pub fn event_topic(signature: &str) -> [u8; 32] {
    keccak256(signature.as_bytes())
}
