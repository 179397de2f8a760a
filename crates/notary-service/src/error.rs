use std::fmt;

use notary_crypto::HasherError;
use notary_ledger::LedgerError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable classification carried by every failed workflow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InputError,
    LedgerUnavailable,
    TransactionReverted,
    EventNotFound,
    ConfirmationTimeout,
    NotFound,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InputError => "input_error",
            Self::LedgerUnavailable => "ledger_unavailable",
            Self::TransactionReverted => "transaction_reverted",
            Self::EventNotFound => "event_not_found",
            Self::ConfirmationTimeout => "confirmation_timeout",
            Self::NotFound => "not_found",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("staging error: {0}")]
    Io(#[from] std::io::Error),

    #[error("hashing failed: {0}")]
    Hasher(#[from] HasherError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Serializable `{ kind, message }` form of a failure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) | Self::InvalidAddress(_) => ErrorKind::InputError,
            Self::Io(_) | Self::Hasher(_) => ErrorKind::Internal,
            Self::Ledger(e) => match e {
                LedgerError::Unavailable(_) => ErrorKind::LedgerUnavailable,
                LedgerError::TransactionReverted { .. } => ErrorKind::TransactionReverted,
                LedgerError::ConfirmationTimeout { .. } => ErrorKind::ConfirmationTimeout,
                LedgerError::EventNotFound { .. } | LedgerError::MalformedEvent { .. } => {
                    ErrorKind::EventNotFound
                }
                LedgerError::NotFound(_) => ErrorKind::NotFound,
                LedgerError::NonceRejected { .. }
                | LedgerError::Rpc { .. }
                | LedgerError::Abi(_)
                | LedgerError::InvalidResponse(_)
                | LedgerError::Config(_)
                | LedgerError::Internal(_) => ErrorKind::Internal,
            },
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use notary_types::{DocumentId, TxHash};

    use super::*;

    #[test]
    fn kinds_serialize_snake_case() {
        let json = serde_json::to_string(&ErrorKind::ConfirmationTimeout).unwrap();
        assert_eq!(json, "\"confirmation_timeout\"");
        assert_eq!(ErrorKind::LedgerUnavailable.to_string(), "ledger_unavailable");
    }

    #[test]
    fn ledger_errors_classified() {
        let tx = TxHash::from_bytes([1; 32]);
        let cases = [
            (LedgerError::Unavailable("down".into()), ErrorKind::LedgerUnavailable),
            (
                LedgerError::TransactionReverted {
                    tx_hash: Some(tx),
                    reason: "dup".into(),
                },
                ErrorKind::TransactionReverted,
            ),
            (
                LedgerError::ConfirmationTimeout {
                    tx_hash: tx,
                    waited: Duration::from_secs(1),
                },
                ErrorKind::ConfirmationTimeout,
            ),
            (LedgerError::EventNotFound { tx_hash: tx }, ErrorKind::EventNotFound),
            (
                LedgerError::MalformedEvent {
                    tx_hash: tx,
                    reason: "short".into(),
                },
                ErrorKind::EventNotFound,
            ),
            (
                LedgerError::NotFound(DocumentId::from_bytes([2; 32])),
                ErrorKind::NotFound,
            ),
            (LedgerError::InvalidResponse("x".into()), ErrorKind::Internal),
        ];
        for (err, kind) in cases {
            assert_eq!(ServiceError::from(err).kind(), kind);
        }
    }

    #[test]
    fn report_carries_message() {
        let report = ServiceError::InvalidAddress("0x12".into()).report();
        assert_eq!(report.kind, ErrorKind::InputError);
        assert_eq!(report.message, "invalid address: 0x12");
    }
}
