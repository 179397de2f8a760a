use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use notary_crypto::keccak256;
use notary_types::{
    Address, Document, DocumentHash, DocumentId, DocumentRecord, ReceiptStatus,
    TransactionReceipt, TxHash,
};
use tracing::{debug, warn};

use crate::config::DEFAULT_CONTRACT_ADDRESS;
use crate::contract::RegistryAbi;
use crate::decoder::DocumentRegistered;
use crate::error::{LedgerError, LedgerResult};
use crate::traits::{LedgerReader, LedgerWriter, RegistrationTx};

pub const REVERT_DOCUMENT_EXISTS: &str = "Document already exists";
pub const REVERT_EMPTY_HASH: &str = "Document hash cannot be empty";
pub const REVERT_EMPTY_FILE_NAME: &str = "File name cannot be empty";

/// When submitted transactions are included in a block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MiningMode {
    /// Every submission is mined into its own block immediately.
    #[default]
    Instant,
    /// Submissions stay pending until [`InMemoryLedger::mine`] is called.
    Manual,
}

/// In-memory registry ledger for tests, local demos, and running without a
/// node.
///
/// Emulates the registry contract behind the same ABI: calldata is decoded
/// at execution, receipts carry logs encoded exactly like the deployed
/// contract's `DocumentRegistered` event, and nonces are sequenced per
/// account.
pub struct InMemoryLedger {
    contract: Address,
    mining: MiningMode,
    inner: RwLock<LedgerState>,
    reachable: AtomicBool,
    emit_events: AtomicBool,
}

#[derive(Default)]
struct LedgerState {
    nonces: HashMap<Address, u64>,
    pending: Vec<PendingCall>,
    receipts: HashMap<TxHash, TransactionReceipt>,
    documents: HashMap<DocumentId, DocumentRecord>,
    by_hash: HashMap<DocumentHash, DocumentId>,
    by_owner: HashMap<Address, Vec<DocumentId>>,
    hidden: HashSet<DocumentId>,
    block_number: u64,
    block_timestamp: u64,
}

struct PendingCall {
    tx_hash: TxHash,
    from: Address,
    nonce: u64,
    calldata: Vec<u8>,
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new(MiningMode::Instant)
    }
}

impl InMemoryLedger {
    pub fn new(mining: MiningMode) -> Self {
        Self::with_contract(DEFAULT_CONTRACT_ADDRESS, mining)
    }

    pub fn with_contract(contract: Address, mining: MiningMode) -> Self {
        Self {
            contract,
            mining,
            inner: RwLock::new(LedgerState::default()),
            reachable: AtomicBool::new(true),
            emit_events: AtomicBool::new(true),
        }
    }

    pub fn contract_address(&self) -> Address {
        self.contract
    }

    pub fn mining_mode(&self) -> MiningMode {
        self.mining
    }

    /// Simulate the endpoint going away (`false`) or coming back (`true`).
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    /// When disabled, successful registrations emit no logs.
    pub fn set_emit_events(&self, emit: bool) {
        self.emit_events.store(emit, Ordering::SeqCst);
    }

    /// Make `getDocument` report `id` as missing while it stays listed
    /// under its owner and findable by hash.
    pub fn hide_document(&self, id: &DocumentId) -> LedgerResult<()> {
        self.write()?.hidden.insert(*id);
        Ok(())
    }

    /// Mine one block containing every pending transaction, in submission
    /// order. Mining with nothing pending still produces an empty block.
    pub fn mine(&self) -> LedgerResult<Vec<TxHash>> {
        let emit = self.emit_events.load(Ordering::SeqCst);
        let mut state = self.write()?;
        let pending = std::mem::take(&mut state.pending);

        state.block_number += 1;
        state.block_timestamp = unix_now().max(state.block_timestamp + 1);
        let (block_number, timestamp) = (state.block_number, state.block_timestamp);

        let mut mined = Vec::with_capacity(pending.len());
        for (index, call) in pending.into_iter().enumerate() {
            let receipt =
                self.execute(&mut state, call, block_number, timestamp, index as u64, emit);
            mined.push(receipt.tx_hash);
            state.receipts.insert(receipt.tx_hash, receipt);
        }
        debug!(block_number, txs = mined.len(), "mined block");
        Ok(mined)
    }

    pub fn pending_count(&self) -> LedgerResult<usize> {
        Ok(self.read()?.pending.len())
    }

    pub fn document_count(&self) -> LedgerResult<usize> {
        Ok(self.read()?.documents.len())
    }

    fn execute(
        &self,
        state: &mut LedgerState,
        call: PendingCall,
        block_number: u64,
        timestamp: u64,
        log_index: u64,
        emit: bool,
    ) -> TransactionReceipt {
        let mut receipt = TransactionReceipt {
            tx_hash: call.tx_hash,
            block_number,
            from: call.from,
            to: Some(self.contract),
            status: ReceiptStatus::Reverted,
            logs: Vec::new(),
        };

        let (hash_hex, file_name) = match RegistryAbi::decode_register_document(&call.calldata) {
            Ok(args) => args,
            Err(e) => {
                warn!(tx = %call.tx_hash, error = %e, "reverted: undecodable calldata");
                return receipt;
            }
        };
        let document_hash = match Self::check_registration(state, &hash_hex, &file_name) {
            Ok(hash) => hash,
            Err(reason) => {
                debug!(tx = %call.tx_hash, reason, "registration reverted");
                return receipt;
            }
        };

        let document_id = derive_document_id(&document_hash, &call.from, timestamp, call.nonce);
        state.documents.insert(
            document_id,
            DocumentRecord {
                document_hash,
                file_name: file_name.clone(),
                owner: call.from,
                timestamp,
            },
        );
        state.by_hash.insert(document_hash, document_id);
        state.by_owner.entry(call.from).or_default().push(document_id);

        receipt.status = ReceiptStatus::Success;
        if emit {
            let event = DocumentRegistered {
                document_id,
                document_hash,
                owner: call.from,
                timestamp,
                file_name,
            };
            receipt.logs.push(event.to_log(self.contract, log_index));
        }
        receipt
    }

    fn check_registration(
        state: &LedgerState,
        hash_hex: &str,
        file_name: &str,
    ) -> Result<DocumentHash, &'static str> {
        if hash_hex.is_empty() {
            return Err(REVERT_EMPTY_HASH);
        }
        if file_name.is_empty() {
            return Err(REVERT_EMPTY_FILE_NAME);
        }
        let hash = DocumentHash::from_hex(hash_hex).map_err(|_| "Invalid document hash")?;
        if state.by_hash.contains_key(&hash) {
            return Err(REVERT_DOCUMENT_EXISTS);
        }
        Ok(hash)
    }

    fn ensure_reachable(&self) -> LedgerResult<()> {
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(LedgerError::Unavailable(
                "in-memory ledger marked unreachable".into(),
            ))
        }
    }

    fn read(&self) -> LedgerResult<RwLockReadGuard<'_, LedgerState>> {
        self.inner
            .read()
            .map_err(|_| LedgerError::Internal("ledger state lock poisoned".into()))
    }

    fn write(&self) -> LedgerResult<RwLockWriteGuard<'_, LedgerState>> {
        self.inner
            .write()
            .map_err(|_| LedgerError::Internal("ledger state lock poisoned".into()))
    }
}

#[async_trait]
impl LedgerReader for InMemoryLedger {
    async fn verify_document_by_hash(
        &self,
        hash: &DocumentHash,
    ) -> LedgerResult<Option<DocumentRecord>> {
        self.ensure_reachable()?;
        let state = self.read()?;
        Ok(state
            .by_hash
            .get(hash)
            .and_then(|id| state.documents.get(id))
            .cloned())
    }

    async fn get_user_documents(&self, owner: &Address) -> LedgerResult<Vec<DocumentId>> {
        self.ensure_reachable()?;
        Ok(self.read()?.by_owner.get(owner).cloned().unwrap_or_default())
    }

    async fn get_document(&self, id: &DocumentId) -> LedgerResult<Option<Document>> {
        self.ensure_reachable()?;
        let state = self.read()?;
        if state.hidden.contains(id) {
            return Ok(None);
        }
        Ok(state
            .documents
            .get(id)
            .map(|record| Document::new(*id, record.clone())))
    }

    async fn transaction_receipt(
        &self,
        tx_hash: &TxHash,
    ) -> LedgerResult<Option<TransactionReceipt>> {
        self.ensure_reachable()?;
        Ok(self.read()?.receipts.get(tx_hash).cloned())
    }

    async fn block_number(&self) -> LedgerResult<u64> {
        self.ensure_reachable()?;
        Ok(self.read()?.block_number)
    }
}

#[async_trait]
impl LedgerWriter for InMemoryLedger {
    async fn next_nonce(&self, account: &Address) -> LedgerResult<u64> {
        self.ensure_reachable()?;
        Ok(self.read()?.nonces.get(account).copied().unwrap_or(0))
    }

    async fn send_registration(&self, tx: &RegistrationTx) -> LedgerResult<TxHash> {
        self.ensure_reachable()?;
        let calldata = RegistryAbi::encode_register_document(&tx.document_hash, &tx.file_name);
        let tx_hash = derive_tx_hash(&tx.from, tx.nonce, &calldata);
        {
            let mut state = self.write()?;
            let expected = state.nonces.get(&tx.from).copied().unwrap_or(0);
            if tx.nonce != expected {
                return Err(LedgerError::NonceRejected {
                    nonce: tx.nonce,
                    reason: format!("expected nonce {expected} for {}", tx.from),
                });
            }
            state.nonces.insert(tx.from, expected + 1);
            state.pending.push(PendingCall {
                tx_hash,
                from: tx.from,
                nonce: tx.nonce,
                calldata,
            });
        }
        debug!(tx = %tx_hash, nonce = tx.nonce, "accepted registration");

        if self.mining == MiningMode::Instant {
            self.mine()?;
        }
        Ok(tx_hash)
    }
}

fn derive_tx_hash(from: &Address, nonce: u64, calldata: &[u8]) -> TxHash {
    let mut preimage = Vec::with_capacity(20 + 8 + calldata.len());
    preimage.extend_from_slice(from.as_bytes());
    preimage.extend_from_slice(&nonce.to_be_bytes());
    preimage.extend_from_slice(calldata);
    TxHash::from_bytes(keccak256(&preimage))
}

fn derive_document_id(
    hash: &DocumentHash,
    owner: &Address,
    timestamp: u64,
    nonce: u64,
) -> DocumentId {
    let mut preimage = [0u8; 32 + 20 + 8 + 8];
    preimage[..32].copy_from_slice(hash.as_bytes());
    preimage[32..52].copy_from_slice(owner.as_bytes());
    preimage[52..60].copy_from_slice(&timestamp.to_be_bytes());
    preimage[60..].copy_from_slice(&nonce.to_be_bytes());
    DocumentId::from_bytes(keccak256(&preimage))
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use notary_crypto::ContentHasher;

    use super::*;
    use crate::decoder::ReceiptDecoder;

    fn alice() -> Address {
        Address::from_bytes([0xa1; 20])
    }

    fn tx(nonce: u64, content: &[u8], name: &str) -> RegistrationTx {
        RegistrationTx {
            from: alice(),
            nonce,
            document_hash: ContentHasher::hash(content),
            file_name: name.into(),
        }
    }

    #[tokio::test]
    async fn instant_registration_is_queryable() {
        let ledger = InMemoryLedger::default();
        let tx_hash = ledger
            .send_registration(&tx(0, b"hello", "hello.txt"))
            .await
            .unwrap();

        let receipt = ledger.transaction_receipt(&tx_hash).await.unwrap().unwrap();
        assert!(receipt.is_success());
        assert_eq!(receipt.block_number, 1);

        let id = ReceiptDecoder::default().decode(&receipt).unwrap();
        let doc = ledger.get_document(&id).await.unwrap().unwrap();
        assert_eq!(doc.file_name(), "hello.txt");
        assert_eq!(*doc.owner(), alice());

        let record = ledger
            .verify_document_by_hash(&ContentHasher::hash(b"hello"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.timestamp, doc.timestamp());
        assert_eq!(ledger.get_user_documents(&alice()).await.unwrap(), vec![id]);
    }

    #[tokio::test]
    async fn nonce_must_be_sequential() {
        let ledger = InMemoryLedger::default();
        assert_eq!(ledger.next_nonce(&alice()).await.unwrap(), 0);
        ledger.send_registration(&tx(0, b"a", "a")).await.unwrap();
        assert_eq!(ledger.next_nonce(&alice()).await.unwrap(), 1);

        let err = ledger.send_registration(&tx(0, b"b", "b")).await.unwrap_err();
        assert!(matches!(err, LedgerError::NonceRejected { nonce: 0, .. }));
        let err = ledger.send_registration(&tx(5, b"b", "b")).await.unwrap_err();
        assert!(matches!(err, LedgerError::NonceRejected { nonce: 5, .. }));
    }

    #[tokio::test]
    async fn duplicate_hash_reverts() {
        let ledger = InMemoryLedger::default();
        ledger.send_registration(&tx(0, b"same", "one")).await.unwrap();
        let second = ledger.send_registration(&tx(1, b"same", "two")).await.unwrap();

        let receipt = ledger.transaction_receipt(&second).await.unwrap().unwrap();
        assert_eq!(receipt.status, ReceiptStatus::Reverted);
        assert!(receipt.logs.is_empty());
        assert_eq!(ledger.document_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn empty_file_name_reverts() {
        let ledger = InMemoryLedger::default();
        let hash = ledger.send_registration(&tx(0, b"x", "")).await.unwrap();
        let receipt = ledger.transaction_receipt(&hash).await.unwrap().unwrap();
        assert!(!receipt.is_success());
        assert_eq!(ledger.document_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn manual_mining_keeps_transactions_pending() {
        let ledger = InMemoryLedger::new(MiningMode::Manual);
        let hash = ledger.send_registration(&tx(0, b"p", "p")).await.unwrap();
        assert_eq!(ledger.pending_count().unwrap(), 1);
        assert!(ledger.transaction_receipt(&hash).await.unwrap().is_none());
        assert_eq!(ledger.next_nonce(&alice()).await.unwrap(), 1);

        assert_eq!(ledger.mine().unwrap(), vec![hash]);
        assert_eq!(ledger.pending_count().unwrap(), 0);
        assert!(ledger.transaction_receipt(&hash).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn pending_duplicates_in_one_block_revert_the_later() {
        let ledger = InMemoryLedger::new(MiningMode::Manual);
        let first = ledger.send_registration(&tx(0, b"dup", "a")).await.unwrap();
        let second = ledger.send_registration(&tx(1, b"dup", "b")).await.unwrap();
        ledger.mine().unwrap();

        let r1 = ledger.transaction_receipt(&first).await.unwrap().unwrap();
        let r2 = ledger.transaction_receipt(&second).await.unwrap().unwrap();
        assert!(r1.is_success());
        assert!(!r2.is_success());
        assert_eq!(r1.block_number, r2.block_number);
    }

    #[tokio::test]
    async fn block_timestamps_strictly_increase() {
        let ledger = InMemoryLedger::default();
        let a = ledger.send_registration(&tx(0, b"1", "1")).await.unwrap();
        let b = ledger.send_registration(&tx(1, b"2", "2")).await.unwrap();
        let decoder = ReceiptDecoder::default();
        let ta = decoder
            .decode_event(&ledger.transaction_receipt(&a).await.unwrap().unwrap())
            .unwrap()
            .timestamp;
        let tb = decoder
            .decode_event(&ledger.transaction_receipt(&b).await.unwrap().unwrap())
            .unwrap()
            .timestamp;
        assert!(tb > ta);
    }

    #[tokio::test]
    async fn suppressed_events_leave_successful_receipt_without_logs() {
        let ledger = InMemoryLedger::default();
        ledger.set_emit_events(false);
        let hash = ledger.send_registration(&tx(0, b"q", "q")).await.unwrap();
        let receipt = ledger.transaction_receipt(&hash).await.unwrap().unwrap();
        assert!(receipt.is_success());
        assert!(receipt.logs.is_empty());
    }

    #[tokio::test]
    async fn unreachable_ledger_fails_every_call() {
        let ledger = InMemoryLedger::default();
        ledger.set_reachable(false);
        assert!(matches!(
            ledger.block_number().await,
            Err(LedgerError::Unavailable(_))
        ));
        assert!(matches!(
            ledger.next_nonce(&alice()).await,
            Err(LedgerError::Unavailable(_))
        ));
        ledger.set_reachable(true);
        assert_eq!(ledger.block_number().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn hidden_document_stays_listed() {
        let ledger = InMemoryLedger::default();
        ledger.send_registration(&tx(0, b"kept", "kept")).await.unwrap();
        let ids = ledger.get_user_documents(&alice()).await.unwrap();
        assert_eq!(ids.len(), 1);

        ledger.hide_document(&ids[0]).unwrap();
        assert!(ledger.get_document(&ids[0]).await.unwrap().is_none());
        assert_eq!(ledger.get_user_documents(&alice()).await.unwrap(), ids);
        assert!(ledger
            .verify_document_by_hash(&ContentHasher::hash(b"kept"))
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn unknown_lookups_are_none() {
        let ledger = InMemoryLedger::default();
        assert!(ledger
            .get_document(&DocumentId::from_bytes([7; 32]))
            .await
            .unwrap()
            .is_none());
        assert!(ledger
            .verify_document_by_hash(&ContentHasher::hash(b"nothing"))
            .await
            .unwrap()
            .is_none());
        assert!(ledger.get_user_documents(&alice()).await.unwrap().is_empty());
    }
}
