use std::sync::Arc;

use notary_crypto::ContentHasher;
use notary_ledger::{
    ConfirmationConfig, Ledger, LedgerClient, LedgerConfig, LedgerError, ReceiptDecoder,
};
use notary_types::{Address, DocumentHash};
use tokio::io::AsyncRead;
use tracing::{debug, error, info};

use crate::error::{ServiceError, ServiceResult};
use crate::results::{DocumentSummary, RegisterResult, VerifyResult, REGISTERED_MESSAGE};
use crate::staging::{StagedUpload, StagingArea};

/// Composes the content hasher and the ledger client into the register,
/// verify, and list workflows.
pub struct NotaryService {
    client: LedgerClient,
    contract: Address,
    staging: StagingArea,
}

impl NotaryService {
    pub fn new(client: LedgerClient, contract: Address) -> Self {
        Self {
            client,
            contract,
            staging: StagingArea::default(),
        }
    }

    /// Connect the configured ledger backend and bind the receipt decoder to
    /// the resolved contract.
    pub fn from_config(
        ledger: &LedgerConfig,
        confirmation: &ConfirmationConfig,
    ) -> ServiceResult<Self> {
        let contract = ledger.resolve_contract_address()?;
        let backend = ledger.connect()?;
        Ok(Self::with_ledger(
            backend,
            contract,
            ledger.signer,
            confirmation,
        ))
    }

    pub fn with_ledger(
        ledger: Arc<dyn Ledger>,
        contract: Address,
        signer: Address,
        confirmation: &ConfirmationConfig,
    ) -> Self {
        let client = LedgerClient::new(ledger, signer, confirmation.policy())
            .with_decoder(ReceiptDecoder::default().for_contract(contract));
        Self::new(client, contract)
    }

    pub fn with_staging(mut self, staging: StagingArea) -> Self {
        self.staging = staging;
        self
    }

    pub fn client(&self) -> &LedgerClient {
        &self.client
    }

    pub fn contract_address(&self) -> Address {
        self.contract
    }

    pub fn signer(&self) -> Address {
        self.client.signer()
    }

    pub fn staging(&self) -> &StagingArea {
        &self.staging
    }

    /// Hash `reader`, register the digest under `file_name`, wait for
    /// confirmation, and return the ledger-assigned id.
    ///
    /// A failure after submission leaves the transaction to the ledger; it
    /// may still be mined.
    pub async fn register<R: AsyncRead + Unpin>(
        &self,
        file_name: &str,
        reader: R,
    ) -> ServiceResult<RegisterResult> {
        if file_name.trim().is_empty() {
            return Err(ServiceError::InvalidInput("file name is empty".into()));
        }
        let (document_hash, size) = ContentHasher::hash_async(reader).await?;
        info!(file = file_name, hash = %document_hash, size, "registering document");
        self.register_hash(&document_hash, file_name).await
    }

    pub async fn register_staged(&self, upload: &StagedUpload) -> ServiceResult<RegisterResult> {
        self.register(upload.original_name(), upload.reader().await?)
            .await
    }

    async fn register_hash(
        &self,
        document_hash: &DocumentHash,
        file_name: &str,
    ) -> ServiceResult<RegisterResult> {
        let pending = self
            .client
            .submit_registration(document_hash, file_name)
            .await?;
        let receipt = self.client.await_confirmation(&pending).await?;
        let event = self.client.decode_registration(&receipt)?;
        let mismatch = if event.document_hash != *document_hash {
            Some(format!(
                "event hash {} differs from submitted hash {document_hash}",
                event.document_hash
            ))
        } else if event.owner != self.client.signer() {
            Some(format!(
                "event owner {} differs from signer {}",
                event.owner,
                self.client.signer()
            ))
        } else {
            None
        };
        if let Some(reason) = mismatch {
            error!(tx = %receipt.tx_hash, %reason, ?receipt, "registration event does not match submission");
            return Err(LedgerError::MalformedEvent {
                tx_hash: receipt.tx_hash,
                reason,
            }
            .into());
        }

        info!(id = %event.document_id, tx = %receipt.tx_hash, "document registered");
        Ok(RegisterResult {
            success: true,
            document_id: event.document_id,
            document_hash: *document_hash,
            file_name: file_name.to_string(),
            transaction_hash: receipt.tx_hash,
            block_number: receipt.block_number,
            timestamp: event.timestamp,
            message: REGISTERED_MESSAGE.to_string(),
        })
    }

    /// Hash `reader` and look the digest up. Never writes.
    pub async fn verify<R: AsyncRead + Unpin>(
        &self,
        file_name: &str,
        reader: R,
    ) -> ServiceResult<VerifyResult> {
        let (document_hash, _) = ContentHasher::hash_async(reader).await?;
        self.verify_hash(file_name, &document_hash).await
    }

    pub async fn verify_staged(&self, upload: &StagedUpload) -> ServiceResult<VerifyResult> {
        self.verify(upload.original_name(), upload.reader().await?)
            .await
    }

    pub async fn verify_hash(
        &self,
        file_name: &str,
        document_hash: &DocumentHash,
    ) -> ServiceResult<VerifyResult> {
        let result = match self.client.query_by_hash(document_hash).await? {
            Some(record) => VerifyResult::matched(file_name, record),
            None => VerifyResult::unmatched(file_name, *document_hash),
        };
        debug!(hash = %document_hash, valid = result.is_valid, "verified document");
        Ok(result)
    }

    /// Every document registered by `owner`, in ledger order. The owner is
    /// validated before the ledger is touched; one failed lookup fails the
    /// whole listing.
    pub async fn list_by_owner(&self, owner: &str) -> ServiceResult<Vec<DocumentSummary>> {
        let owner =
            Address::parse(owner).map_err(|_| ServiceError::InvalidAddress(owner.to_string()))?;
        let ids = self.client.query_by_owner(&owner).await?;
        let mut documents = Vec::with_capacity(ids.len());
        for id in &ids {
            documents.push(self.client.query_by_id(id).await?);
        }
        debug!(owner = %owner, count = documents.len(), "listed documents");
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use notary_ledger::{InMemoryLedger, LedgerWriter, DEFAULT_SIGNER};

    use super::*;
    use crate::error::ErrorKind;

    fn service() -> (Arc<InMemoryLedger>, NotaryService) {
        let ledger = Arc::new(InMemoryLedger::default());
        let confirmation = ConfirmationConfig {
            timeout_secs: 2,
            poll_interval_ms: 5,
            confirmations: 1,
        };
        let service = NotaryService::with_ledger(
            ledger.clone(),
            ledger.contract_address(),
            DEFAULT_SIGNER,
            &confirmation,
        );
        (ledger, service)
    }

    #[tokio::test]
    async fn hello_example() {
        let (_ledger, service) = service();
        let registered = service.register("hello.txt", &b"hello"[..]).await.unwrap();
        assert_eq!(
            registered.document_hash.to_hex(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert!(registered.success);

        let verified = service.verify("hello.txt", &b"hello"[..]).await.unwrap();
        assert!(verified.is_valid);
        assert_eq!(verified.original_file_name.as_deref(), Some("hello.txt"));
        assert_eq!(verified.owner, Some(DEFAULT_SIGNER));
        assert_eq!(verified.timestamp, Some(registered.timestamp));
    }

    #[tokio::test]
    async fn empty_name_rejected_before_ledger() {
        let (ledger, service) = service();
        let err = service.register("  ", &b"data"[..]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InputError);
        assert_eq!(ledger.document_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn verify_never_writes() {
        let (ledger, service) = service();
        let result = service.verify("ghost.txt", &b"ghost"[..]).await.unwrap();
        assert!(!result.is_valid);
        assert_eq!(result.document_hash, ContentHasher::hash(b"ghost"));
        assert_eq!(ledger.next_nonce(&DEFAULT_SIGNER).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn malformed_owner_is_input_error() {
        let (ledger, service) = service();
        ledger.set_reachable(false);
        for owner in [
            "",
            "0x123",
            "f39fd6e51aad88f6f4ce6ab8827279cfffb92266",
            "0xzz9fd6e51aad88f6f4ce6ab8827279cfffb92266",
        ] {
            let err = service.list_by_owner(owner).await.unwrap_err();
            assert!(matches!(err, ServiceError::InvalidAddress(_)), "{owner}");
        }
    }

    #[tokio::test]
    async fn duplicate_registration_is_reverted() {
        let (_ledger, service) = service();
        service.register("a.txt", &b"same"[..]).await.unwrap();
        let err = service.register("b.txt", &b"same"[..]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransactionReverted);
    }

    #[tokio::test]
    async fn staged_upload_round_trip() {
        let (_ledger, service) = service();
        let staged = service
            .staging()
            .stage("report.pdf", &b"%PDF-1.7"[..])
            .await
            .unwrap();
        let registered = service.register_staged(&staged).await.unwrap();
        assert_eq!(registered.file_name, "report.pdf");
        let verified = service.verify_staged(&staged).await.unwrap();
        assert!(verified.is_valid);
    }

    #[tokio::test]
    async fn timeout_surfaces_as_confirmation_timeout() {
        let ledger = Arc::new(InMemoryLedger::new(notary_ledger::MiningMode::Manual));
        let confirmation = ConfirmationConfig {
            timeout_secs: 0,
            poll_interval_ms: 5,
            confirmations: 1,
        };
        let service = NotaryService::with_ledger(
            ledger.clone(),
            ledger.contract_address(),
            DEFAULT_SIGNER,
            &confirmation,
        );
        let err = service.register("slow.txt", &b"slow"[..]).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Ledger(LedgerError::ConfirmationTimeout { waited, .. })
                if waited == Duration::ZERO
        ));
        assert_eq!(err.kind(), ErrorKind::ConfirmationTimeout);
    }
}
