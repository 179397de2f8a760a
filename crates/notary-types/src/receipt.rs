use std::fmt;

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::id::TxHash;

/// Final execution status of a confirmed transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReceiptStatus {
    /// The call executed and its effects were applied.
    Success,
    /// The call reverted; no state changed and no events were kept.
    Reverted,
}

impl fmt::Display for ReceiptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Reverted => write!(f, "reverted"),
        }
    }
}

/// One event record emitted during transaction execution.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Contract that emitted the event.
    pub address: Address,
    /// `topics[0]` is the event signature hash; indexed parameters follow.
    pub topics: Vec<[u8; 32]>,
    /// ABI-encoded non-indexed parameters.
    pub data: Vec<u8>,
    pub log_index: u64,
}

impl fmt::Debug for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let topics: Vec<String> = self
            .topics
            .iter()
            .map(|t| format!("0x{}", hex::encode(t)))
            .collect();
        f.debug_struct("LogEntry")
            .field("address", &self.address.to_string())
            .field("topics", &topics)
            .field("data", &format!("0x{}", hex::encode(&self.data)))
            .field("log_index", &self.log_index)
            .finish()
    }
}

/// Record returned once a transaction is included in a block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub tx_hash: TxHash,
    pub block_number: u64,
    pub from: Address,
    pub to: Option<Address>,
    pub status: ReceiptStatus,
    pub logs: Vec<LogEntry>,
}

impl TransactionReceipt {
    /// Returns `true` if the transaction executed successfully.
    pub fn is_success(&self) -> bool {
        self.status == ReceiptStatus::Success
    }

    /// Logs whose first topic equals `topic`, in emission order.
    pub fn logs_with_topic<'a>(
        &'a self,
        topic: &'a [u8; 32],
    ) -> impl Iterator<Item = &'a LogEntry> + 'a {
        self.logs
            .iter()
            .filter(move |log| log.topics.first() == Some(topic))
    }
}
