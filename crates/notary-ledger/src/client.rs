//! The ledger client: one signing identity, a serialized write path, and
//! bounded confirmation waits.

use std::sync::Arc;
use std::time::{Duration, Instant};

use notary_types::{
    Address, Document, DocumentHash, DocumentId, DocumentRecord, TransactionReceipt, TxHash,
};
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::decoder::{DocumentRegistered, ReceiptDecoder};
use crate::error::{LedgerError, LedgerResult};
use crate::traits::{Ledger, RegistrationTx};

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// How long and how often to wait for a submitted transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConfirmationPolicy {
    pub timeout: Duration,
    pub poll_interval: Duration,
    /// Blocks at or above the inclusion block, counting it.
    pub confirmations: u64,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            poll_interval: Duration::from_millis(500),
            confirmations: 1,
        }
    }
}

impl ConfirmationPolicy {
    pub fn new(timeout: Duration, poll_interval: Duration, confirmations: u64) -> Self {
        Self {
            timeout,
            poll_interval: poll_interval.max(MIN_POLL_INTERVAL),
            confirmations: confirmations.max(1),
        }
    }
}

/// Handle for a submitted, not yet confirmed registration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingTransaction {
    pub tx_hash: TxHash,
    pub nonce: u64,
    pub document_hash: DocumentHash,
    pub submitted_at: Instant,
}

/// Client for the document registry.
///
/// Reads run concurrently. Submissions from the single signing identity
/// are serialized: the write lock is held from nonce lookup until the
/// ledger has accepted the transaction.
pub struct LedgerClient {
    ledger: Arc<dyn Ledger>,
    signer: Address,
    write_lock: Arc<Mutex<()>>,
    policy: ConfirmationPolicy,
    decoder: ReceiptDecoder,
}

impl LedgerClient {
    pub fn new(ledger: Arc<dyn Ledger>, signer: Address, policy: ConfirmationPolicy) -> Self {
        Self {
            ledger,
            signer,
            write_lock: Arc::new(Mutex::new(())),
            policy,
            decoder: ReceiptDecoder::default(),
        }
    }

    pub fn with_decoder(mut self, decoder: ReceiptDecoder) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn signer(&self) -> Address {
        self.signer
    }

    pub fn policy(&self) -> &ConfirmationPolicy {
        &self.policy
    }

    /// Submit a `registerDocument` transaction without waiting for it.
    ///
    /// Dropping the returned future while it waits for the write lock or the
    /// nonce sends nothing. Once submission has started it runs to completion
    /// on its own task.
    pub async fn submit_registration(
        &self,
        document_hash: &DocumentHash,
        file_name: &str,
    ) -> LedgerResult<PendingTransaction> {
        let guard = Arc::clone(&self.write_lock).lock_owned().await;
        let nonce = self.ledger.next_nonce(&self.signer).await?;
        let tx = RegistrationTx {
            from: self.signer,
            nonce,
            document_hash: *document_hash,
            file_name: file_name.to_string(),
        };

        let ledger = Arc::clone(&self.ledger);
        let submission = tokio::spawn(async move {
            let _guard = guard;
            ledger.send_registration(&tx).await
        });
        let tx_hash = submission
            .await
            .map_err(|e| LedgerError::Internal(format!("submission task failed: {e}")))??;

        info!(tx = %tx_hash, nonce, hash = %document_hash.short_hex(), "registration submitted");
        Ok(PendingTransaction {
            tx_hash,
            nonce,
            document_hash: *document_hash,
            submitted_at: Instant::now(),
        })
    }

    /// Wait until `pending` is included with the configured confirmation
    /// depth. A timeout says nothing about whether it will still be mined.
    pub async fn await_confirmation(
        &self,
        pending: &PendingTransaction,
    ) -> LedgerResult<TransactionReceipt> {
        match tokio::time::timeout(self.policy.timeout, self.poll_receipt(&pending.tx_hash)).await
        {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    tx = %pending.tx_hash,
                    nonce = pending.nonce,
                    timeout = ?self.policy.timeout,
                    "confirmation wait elapsed; ledger state unknown"
                );
                Err(LedgerError::ConfirmationTimeout {
                    tx_hash: pending.tx_hash,
                    waited: self.policy.timeout,
                })
            }
        }
    }

    async fn poll_receipt(&self, tx_hash: &TxHash) -> LedgerResult<TransactionReceipt> {
        let mut ticker = tokio::time::interval(self.policy.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let Some(receipt) = self.ledger.transaction_receipt(tx_hash).await? else {
                continue;
            };
            if !receipt.is_success() {
                error!(tx = %tx_hash, ?receipt, "registration transaction reverted");
                return Err(LedgerError::TransactionReverted {
                    tx_hash: Some(*tx_hash),
                    reason: format!(
                        "status {} in block {}",
                        receipt.status, receipt.block_number
                    ),
                });
            }
            let head = self.ledger.block_number().await?;
            let depth = head.saturating_sub(receipt.block_number) + 1;
            if depth >= self.policy.confirmations {
                debug!(tx = %tx_hash, block = receipt.block_number, depth, "confirmed");
                return Ok(receipt);
            }
            debug!(tx = %tx_hash, depth, wanted = self.policy.confirmations, "awaiting depth");
        }
    }

    /// Extract the registration event from a confirmed receipt.
    pub fn decode_registration(
        &self,
        receipt: &TransactionReceipt,
    ) -> LedgerResult<DocumentRegistered> {
        self.decoder.decode_event(receipt).inspect_err(|e| {
            error!(tx = %receipt.tx_hash, error = %e, ?receipt, "could not decode registration event");
        })
    }

    pub async fn query_by_hash(&self, hash: &DocumentHash) -> LedgerResult<Option<DocumentRecord>> {
        self.ledger.verify_document_by_hash(hash).await
    }

    pub async fn query_by_owner(&self, owner: &Address) -> LedgerResult<Vec<DocumentId>> {
        self.ledger.get_user_documents(owner).await
    }

    pub async fn query_by_id(&self, id: &DocumentId) -> LedgerResult<Document> {
        self.ledger
            .get_document(id)
            .await?
            .ok_or(LedgerError::NotFound(*id))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use notary_crypto::ContentHasher;

    use super::*;
    use crate::memory::{InMemoryLedger, MiningMode};
    use crate::traits::{LedgerReader, LedgerWriter};

    const SIGNER: Address = Address::from_bytes([0xf3; 20]);

    fn fast_policy() -> ConfirmationPolicy {
        ConfirmationPolicy::new(Duration::from_millis(300), Duration::from_millis(5), 1)
    }

    fn client(ledger: Arc<InMemoryLedger>, policy: ConfirmationPolicy) -> LedgerClient {
        LedgerClient::new(ledger, SIGNER, policy)
    }

    #[test]
    fn policy_clamps_degenerate_values() {
        let p = ConfirmationPolicy::new(Duration::from_secs(1), Duration::ZERO, 0);
        assert_eq!(p.poll_interval, MIN_POLL_INTERVAL);
        assert_eq!(p.confirmations, 1);
    }

    #[tokio::test]
    async fn submit_then_confirm_then_decode() {
        let ledger = Arc::new(InMemoryLedger::default());
        let client = client(ledger.clone(), fast_policy());
        let hash = ContentHasher::hash(b"hello");

        let pending = client.submit_registration(&hash, "hello.txt").await.unwrap();
        assert_eq!(pending.nonce, 0);
        let receipt = client.await_confirmation(&pending).await.unwrap();
        let event = client.decode_registration(&receipt).unwrap();
        assert_eq!(event.document_hash, hash);
        assert_eq!(event.owner, SIGNER);

        let doc = client.query_by_id(&event.document_id).await.unwrap();
        assert_eq!(doc.file_name(), "hello.txt");
    }

    #[tokio::test]
    async fn nonces_advance_per_submission() {
        let ledger = Arc::new(InMemoryLedger::default());
        let client = client(ledger, fast_policy());
        let a = client
            .submit_registration(&ContentHasher::hash(b"a"), "a")
            .await
            .unwrap();
        let b = client
            .submit_registration(&ContentHasher::hash(b"b"), "b")
            .await
            .unwrap();
        assert_eq!((a.nonce, b.nonce), (0, 1));
        assert_ne!(a.tx_hash, b.tx_hash);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_submissions_are_serialized() {
        let ledger = Arc::new(InMemoryLedger::new(MiningMode::Manual));
        let client = Arc::new(client(ledger.clone(), fast_policy()));

        let handles: Vec<_> = (0..16u8)
            .map(|i| {
                let client = Arc::clone(&client);
                tokio::spawn(async move {
                    client
                        .submit_registration(&ContentHasher::hash(&[i]), &format!("f{i}"))
                        .await
                })
            })
            .collect();

        let mut nonces = HashSet::new();
        for handle in handles {
            nonces.insert(handle.await.unwrap().unwrap().nonce);
        }
        assert_eq!(nonces, (0..16).collect::<HashSet<u64>>());
        assert_eq!(ledger.pending_count().unwrap(), 16);
    }

    #[tokio::test]
    async fn cancelled_before_submission_sends_nothing() {
        let ledger = Arc::new(InMemoryLedger::default());
        let client = Arc::new(client(ledger.clone(), fast_policy()));

        let held = Arc::clone(&client.write_lock).lock_owned().await;
        let waiter = {
            let client = Arc::clone(&client);
            tokio::spawn(async move {
                client
                    .submit_registration(&ContentHasher::hash(b"x"), "x")
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        waiter.abort();
        assert!(waiter.await.unwrap_err().is_cancelled());
        drop(held);

        assert_eq!(ledger.next_nonce(&SIGNER).await.unwrap(), 0);
        assert_eq!(ledger.document_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn waits_for_confirmation_depth() {
        let ledger = Arc::new(InMemoryLedger::new(MiningMode::Manual));
        let policy =
            ConfirmationPolicy::new(Duration::from_secs(2), Duration::from_millis(5), 3);
        let client = client(ledger.clone(), policy);
        let pending = client
            .submit_registration(&ContentHasher::hash(b"deep"), "deep")
            .await
            .unwrap();

        let miner = {
            let ledger = ledger.clone();
            tokio::spawn(async move {
                for _ in 0..3 {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    ledger.mine().unwrap();
                }
            })
        };
        let receipt = client.await_confirmation(&pending).await.unwrap();
        miner.await.unwrap();
        assert_eq!(receipt.block_number, 1);
        assert_eq!(ledger.block_number().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn unmined_transaction_times_out() {
        let ledger = Arc::new(InMemoryLedger::new(MiningMode::Manual));
        let policy =
            ConfirmationPolicy::new(Duration::from_millis(50), Duration::from_millis(5), 1);
        let client = client(ledger, policy);
        let pending = client
            .submit_registration(&ContentHasher::hash(b"stuck"), "stuck")
            .await
            .unwrap();
        let err = client.await_confirmation(&pending).await.unwrap_err();
        assert_eq!(
            err,
            LedgerError::ConfirmationTimeout {
                tx_hash: pending.tx_hash,
                waited: Duration::from_millis(50),
            }
        );
    }

    #[tokio::test]
    async fn reverted_transaction_is_reported() {
        let ledger = Arc::new(InMemoryLedger::default());
        let client = client(ledger, fast_policy());
        let hash = ContentHasher::hash(b"twice");
        let first = client.submit_registration(&hash, "one").await.unwrap();
        client.await_confirmation(&first).await.unwrap();

        let second = client.submit_registration(&hash, "two").await.unwrap();
        let err = client.await_confirmation(&second).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::TransactionReverted { tx_hash: Some(h), .. } if h == second.tx_hash
        ));
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let client = client(Arc::new(InMemoryLedger::default()), fast_policy());
        let id = DocumentId::from_bytes([5; 32]);
        assert_eq!(
            client.query_by_id(&id).await.unwrap_err(),
            LedgerError::NotFound(id)
        );
    }

    #[tokio::test]
    async fn unreachable_ledger_fails_submission() {
        let ledger = Arc::new(InMemoryLedger::default());
        ledger.set_reachable(false);
        let client = client(ledger, fast_policy());
        assert!(matches!(
            client
                .submit_registration(&ContentHasher::hash(b"z"), "z")
                .await,
            Err(LedgerError::Unavailable(_))
        ));
    }
}
