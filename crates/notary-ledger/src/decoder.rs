//! Receipt decoding: recover the registry-assigned document id from the
//! events of a confirmed registration.
//!
//! The decoder is bound to one [`EventSchema`]. If the contract's event
//! shape changes, its topic changes too, no log matches, and decoding fails
//! with [`LedgerError::EventNotFound`] instead of yielding an empty id.

use notary_crypto::event_topic;
use notary_types::{
    Address, Document, DocumentHash, DocumentId, DocumentRecord, LogEntry, TransactionReceipt,
};

use crate::abi::{self, AbiError, ParamType, Token};
use crate::error::{LedgerError, LedgerResult};

/// Canonical signature of the registration event, version 1.
pub const DOCUMENT_REGISTERED_V1: &str =
    "DocumentRegistered(bytes32,string,address,uint256,string)";

/// A versioned event shape: signature string, its topic hash, and the
/// number of indexed parameters a matching log must carry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventSchema {
    signature: &'static str,
    topic: [u8; 32],
    indexed: usize,
}

impl EventSchema {
    pub fn new(signature: &'static str, indexed: usize) -> Self {
        Self {
            signature,
            topic: event_topic(signature),
            indexed,
        }
    }

    /// `DocumentRegistered(bytes32 indexed documentId, string documentHash,
    /// address indexed owner, uint256 timestamp, string fileName)`.
    pub fn document_registered_v1() -> Self {
        Self::new(DOCUMENT_REGISTERED_V1, 2)
    }

    pub fn signature(&self) -> &str {
        self.signature
    }

    pub fn topic(&self) -> &[u8; 32] {
        &self.topic
    }

    /// Returns `true` if the log's first topic is this schema's topic.
    pub fn matches(&self, log: &LogEntry) -> bool {
        log.topics.first() == Some(&self.topic)
    }
}

/// Decoded `DocumentRegistered` event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentRegistered {
    pub document_id: DocumentId,
    pub document_hash: DocumentHash,
    pub owner: Address,
    pub timestamp: u64,
    pub file_name: String,
}

impl DocumentRegistered {
    /// Encode as the log the registry contract emits.
    pub fn to_log(&self, contract: Address, log_index: u64) -> LogEntry {
        let mut owner_topic = [0u8; 32];
        owner_topic[12..].copy_from_slice(self.owner.as_bytes());
        LogEntry {
            address: contract,
            topics: vec![
                *EventSchema::document_registered_v1().topic(),
                *self.document_id.as_bytes(),
                owner_topic,
            ],
            data: abi::encode(&[
                Token::String(self.document_hash.to_hex()),
                Token::Uint(self.timestamp),
                Token::String(self.file_name.clone()),
            ]),
            log_index,
        }
    }

    /// Decode from a log already known to carry the v1 topic.
    pub fn from_log(log: &LogEntry) -> Result<Self, AbiError> {
        let [_, id_topic, owner_topic] = log.topics.as_slice() else {
            return Err(AbiError::InvalidValue(format!(
                "expected 3 topics, found {}",
                log.topics.len()
            )));
        };
        let mut owner = [0u8; 20];
        owner.copy_from_slice(&owner_topic[12..]);

        let mut data = abi::decode(
            &[ParamType::String, ParamType::Uint, ParamType::String],
            &log.data,
        )?
        .into_iter();
        let mut next = || {
            data.next()
                .ok_or_else(|| AbiError::InvalidValue("missing event field".into()))
        };
        let hash_hex = next()?.into_string()?;
        let timestamp = next()?.into_uint()?;
        let file_name = next()?.into_string()?;
        let document_hash = DocumentHash::from_hex(&hash_hex)
            .map_err(|e| AbiError::InvalidValue(format!("event document hash: {e}")))?;

        Ok(Self {
            document_id: DocumentId::from_bytes(*id_topic),
            document_hash,
            owner: Address::from_bytes(owner),
            timestamp,
            file_name,
        })
    }

    pub fn into_document(self) -> Document {
        Document::new(
            self.document_id,
            DocumentRecord {
                document_hash: self.document_hash,
                file_name: self.file_name,
                owner: self.owner,
                timestamp: self.timestamp,
            },
        )
    }
}

/// Extracts registration events from confirmed receipts.
#[derive(Clone, Debug)]
pub struct ReceiptDecoder {
    schema: EventSchema,
    contract: Option<Address>,
}

impl Default for ReceiptDecoder {
    fn default() -> Self {
        Self::new(EventSchema::document_registered_v1())
    }
}

impl ReceiptDecoder {
    pub fn new(schema: EventSchema) -> Self {
        Self {
            schema,
            contract: None,
        }
    }

    /// Only consider logs emitted by `contract`.
    pub fn for_contract(mut self, contract: Address) -> Self {
        self.contract = Some(contract);
        self
    }

    pub fn schema(&self) -> &EventSchema {
        &self.schema
    }

    /// Decode the first matching event in the receipt.
    pub fn decode_event(&self, receipt: &TransactionReceipt) -> LedgerResult<DocumentRegistered> {
        if !receipt.is_success() {
            return Err(LedgerError::TransactionReverted {
                tx_hash: Some(receipt.tx_hash),
                reason: "cannot decode events of a reverted transaction".into(),
            });
        }

        let log = receipt
            .logs
            .iter()
            .filter(|log| self.contract.map_or(true, |c| log.address == c))
            .find(|log| self.schema.matches(log))
            .ok_or(LedgerError::EventNotFound {
                tx_hash: receipt.tx_hash,
            })?;

        if log.topics.len() != self.schema.indexed + 1 {
            return Err(LedgerError::MalformedEvent {
                tx_hash: receipt.tx_hash,
                reason: format!(
                    "{} expects {} topics, log has {}",
                    self.schema.signature,
                    self.schema.indexed + 1,
                    log.topics.len()
                ),
            });
        }

        DocumentRegistered::from_log(log).map_err(|e| LedgerError::MalformedEvent {
            tx_hash: receipt.tx_hash,
            reason: e.to_string(),
        })
    }

    /// Decode just the document id.
    pub fn decode(&self, receipt: &TransactionReceipt) -> LedgerResult<DocumentId> {
        self.decode_event(receipt).map(|event| event.document_id)
    }
}
