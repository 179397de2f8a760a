use std::time::Duration;

use notary_types::{DocumentId, TxHash};

use crate::abi::AbiError;

/// Errors produced by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("ledger unavailable: {0}")]
    Unavailable(String),

    #[error("transaction reverted: {reason}")]
    TransactionReverted {
        tx_hash: Option<TxHash>,
        reason: String,
    },

    #[error("transaction {tx_hash} not confirmed after {waited:?}; ledger state unknown")]
    ConfirmationTimeout { tx_hash: TxHash, waited: Duration },

    #[error("no DocumentRegistered event in receipt of {tx_hash}")]
    EventNotFound { tx_hash: TxHash },

    #[error("malformed DocumentRegistered event in receipt of {tx_hash}: {reason}")]
    MalformedEvent { tx_hash: TxHash, reason: String },

    #[error("document not found: {0}")]
    NotFound(DocumentId),

    #[error("nonce {nonce} rejected: {reason}")]
    NonceRejected { nonce: u64, reason: String },

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("abi error: {0}")]
    Abi(#[from] AbiError),

    #[error("invalid ledger response: {0}")]
    InvalidResponse(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;
