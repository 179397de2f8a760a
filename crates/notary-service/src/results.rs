use notary_types::{Address, Document, DocumentHash, DocumentId, DocumentRecord, TxHash};
use serde::{Deserialize, Serialize};

pub const REGISTERED_MESSAGE: &str =
    "Document uploaded and registered on blockchain successfully!";
pub const VERIFIED_MESSAGE: &str = "Document is authentic and verified on blockchain!";
pub const NOT_FOUND_MESSAGE: &str = "Document not found on blockchain. It may not be authentic.";

/// One entry of an owner listing.
pub type DocumentSummary = Document;

/// Outcome of a completed registration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResult {
    pub success: bool,
    pub document_id: DocumentId,
    pub document_hash: DocumentHash,
    pub file_name: String,
    pub transaction_hash: TxHash,
    pub block_number: u64,
    pub timestamp: u64,
    pub message: String,
}

/// Outcome of a verification. Not finding the hash is a successful
/// verification with `is_valid == false`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResult {
    pub success: bool,
    pub is_valid: bool,
    pub document_hash: DocumentHash,
    /// Name of the file being checked.
    pub file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<Address>,
    pub message: String,
}

impl VerifyResult {
    pub fn matched(file_name: impl Into<String>, record: DocumentRecord) -> Self {
        Self {
            success: true,
            is_valid: true,
            document_hash: record.document_hash,
            file_name: file_name.into(),
            original_file_name: Some(record.file_name),
            timestamp: Some(record.timestamp),
            owner: Some(record.owner),
            message: VERIFIED_MESSAGE.to_string(),
        }
    }

    pub fn unmatched(file_name: impl Into<String>, document_hash: DocumentHash) -> Self {
        Self {
            success: true,
            is_valid: false,
            document_hash,
            file_name: file_name.into(),
            original_file_name: None,
            timestamp: None,
            owner: None,
            message: NOT_FOUND_MESSAGE.to_string(),
        }
    }
}

/// Response body of an owner listing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentList {
    pub documents: Vec<DocumentSummary>,
}
