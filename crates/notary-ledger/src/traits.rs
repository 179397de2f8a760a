use async_trait::async_trait;
use notary_types::{
    Address, Document, DocumentHash, DocumentId, DocumentRecord, TransactionReceipt, TxHash,
};

use crate::error::LedgerResult;

/// A signed `registerDocument` call ready for submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistrationTx {
    pub from: Address,
    pub nonce: u64,
    pub document_hash: DocumentHash,
    pub file_name: String,
}

/// Read boundary for registry queries and receipt polling.
#[async_trait]
pub trait LedgerReader: Send + Sync {
    /// `verifyDocumentByHash`: the stored record for `hash`, if any.
    async fn verify_document_by_hash(
        &self,
        hash: &DocumentHash,
    ) -> LedgerResult<Option<DocumentRecord>>;

    /// `getUserDocuments`: ids registered by `owner`, in registration order.
    async fn get_user_documents(&self, owner: &Address) -> LedgerResult<Vec<DocumentId>>;

    /// `getDocument`: full fields for `id`, if it exists.
    async fn get_document(&self, id: &DocumentId) -> LedgerResult<Option<Document>>;

    /// Receipt for `tx_hash`, or `None` while the transaction is pending.
    async fn transaction_receipt(&self, tx_hash: &TxHash)
        -> LedgerResult<Option<TransactionReceipt>>;

    /// Height of the latest block.
    async fn block_number(&self) -> LedgerResult<u64>;
}

/// Write boundary for registration submissions.
#[async_trait]
pub trait LedgerWriter: Send + Sync {
    /// Next nonce the ledger will accept from `account`, counting pending
    /// transactions.
    async fn next_nonce(&self, account: &Address) -> LedgerResult<u64>;

    /// Submit a registration; returns once the ledger has accepted it.
    async fn send_registration(&self, tx: &RegistrationTx) -> LedgerResult<TxHash>;
}

/// A full ledger backend.
pub trait Ledger: LedgerReader + LedgerWriter {}

impl<T: LedgerReader + LedgerWriter> Ledger for T {}
