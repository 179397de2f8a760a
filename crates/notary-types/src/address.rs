use std::fmt;
use std::str::FromStr;

use crate::error::TypeError;

/// A 20-byte ledger identity.
///
/// Owners of registered documents and the signing identity that submits
/// registrations are both addresses. The textual form is fixed: `0x`
/// followed by exactly 40 hex characters (either case). Anything else is
/// rejected before it can reach the ledger.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 20]);

serde_via_str!(Address);

impl Address {
    /// Length of the textual form, prefix included.
    pub const TEXT_LEN: usize = 42;

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// The zero address.
    pub const fn zero() -> Self {
        Self([0u8; 20])
    }

    /// Returns `true` for the zero address.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// The raw 20 bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Short form (`0x` and the first 8 hex characters).
    pub fn short(&self) -> String {
        format!("0x{}", hex::encode(&self.0[..4]))
    }

    /// Parse the strict textual form.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let invalid = || TypeError::InvalidAddress(s.to_string());
        let body = s.strip_prefix("0x").ok_or_else(invalid)?;
        if body.len() != 40 {
            return Err(invalid());
        }
        let bytes = hex::decode(body).map_err(|_| invalid())?;
        let mut arr = [0u8; 20];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.short())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
