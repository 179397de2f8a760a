use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::hash::DocumentHash;
use crate::id::DocumentId;

/// The stored fields of a registered document, as the registry reports them
/// for a hash lookup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    pub document_hash: DocumentHash,
    /// Name supplied at registration. Descriptive only; not hashed.
    pub file_name: String,
    pub owner: Address,
    /// Ledger-assigned registration time, seconds since the UNIX epoch.
    pub timestamp: u64,
}

/// A registered document together with its ledger-assigned identifier.
///
/// Documents are immutable once registered; there is no update path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub document_id: DocumentId,
    #[serde(flatten)]
    pub record: DocumentRecord,
}

impl Document {
    pub fn new(document_id: DocumentId, record: DocumentRecord) -> Self {
        Self {
            document_id,
            record,
        }
    }

    pub fn document_hash(&self) -> &DocumentHash {
        &self.record.document_hash
    }

    pub fn file_name(&self) -> &str {
        &self.record.file_name
    }

    pub fn owner(&self) -> &Address {
        &self.record.owner
    }

    pub fn timestamp(&self) -> u64 {
        self.record.timestamp
    }
}
