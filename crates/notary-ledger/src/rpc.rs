//! JSON-RPC ledger backend for EVM nodes.
//!
//! Reads go through `eth_call` against the registry contract. Writes use
//! `eth_sendTransaction`, so the signing key stays with the node; the
//! client only chooses the sending account and its nonce.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use notary_types::{
    Address, Document, DocumentHash, DocumentId, DocumentRecord, LogEntry, ReceiptStatus,
    TransactionReceipt, TxHash,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, trace};

use crate::contract::RegistryAbi;
use crate::error::{LedgerError, LedgerResult};
use crate::traits::{LedgerReader, LedgerWriter, RegistrationTx};

/// Ledger backed by a JSON-RPC endpoint.
pub struct JsonRpcLedger {
    http: reqwest::Client,
    url: String,
    contract: Address,
    next_id: AtomicU64,
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
    transaction_hash: TxHash,
    block_number: Option<String>,
    from: Address,
    to: Option<Address>,
    status: Option<String>,
    #[serde(default)]
    logs: Vec<RpcLog>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcLog {
    address: Address,
    topics: Vec<String>,
    data: String,
    log_index: Option<String>,
}

impl JsonRpcLedger {
    pub fn new(url: impl Into<String>, contract: Address, timeout: Duration) -> LedgerResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(timeout.min(Duration::from_secs(15)))
            .timeout(timeout)
            .build()
            .map_err(|e| LedgerError::Config(format!("http client: {e}")))?;
        Ok(Self {
            http,
            url: url.into(),
            contract,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn contract_address(&self) -> Address {
        self.contract
    }

    /// Issue one JSON-RPC call and return its `result`.
    async fn call(&self, method: &str, params: Value) -> LedgerResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        trace!(id, method, "rpc request");
        let request = RpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };

        let response = self
            .http
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| LedgerError::Unavailable(format!("{}: {e}", self.url)))?;
        let status = response.status();
        if status.is_server_error() {
            return Err(LedgerError::Unavailable(format!("{}: HTTP {status}", self.url)));
        }
        let body: RpcResponse = response
            .json()
            .await
            .map_err(|e| LedgerError::InvalidResponse(format!("{method}: {e}")))?;

        match (body.error, body.result) {
            (Some(err), _) => Err(classify_rpc_error(err)),
            (None, Some(result)) => Ok(result),
            (None, None) => Ok(Value::Null),
        }
    }

    async fn eth_call(&self, data: Vec<u8>) -> LedgerResult<Vec<u8>> {
        let result = self
            .call(
                "eth_call",
                json!([{ "to": self.contract, "data": encode_data(&data) }, "latest"]),
            )
            .await?;
        parse_data(expect_str(&result, "eth_call")?)
    }
}

#[async_trait]
impl LedgerReader for JsonRpcLedger {
    async fn verify_document_by_hash(
        &self,
        hash: &DocumentHash,
    ) -> LedgerResult<Option<DocumentRecord>> {
        let output = self
            .eth_call(RegistryAbi::encode_verify_document_by_hash(hash))
            .await?;
        Ok(RegistryAbi::decode_verify_document_by_hash(hash, &output)?)
    }

    async fn get_user_documents(&self, owner: &Address) -> LedgerResult<Vec<DocumentId>> {
        let output = self
            .eth_call(RegistryAbi::encode_get_user_documents(owner))
            .await?;
        Ok(RegistryAbi::decode_get_user_documents(&output)?)
    }

    async fn get_document(&self, id: &DocumentId) -> LedgerResult<Option<Document>> {
        match self.eth_call(RegistryAbi::encode_get_document(id)).await {
            Ok(output) => Ok(RegistryAbi::decode_get_document(id, &output)?),
            // Contracts that guard the lookup revert for unknown ids.
            Err(LedgerError::TransactionReverted { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn transaction_receipt(
        &self,
        tx_hash: &TxHash,
    ) -> LedgerResult<Option<TransactionReceipt>> {
        let result = self
            .call("eth_getTransactionReceipt", json!([tx_hash]))
            .await?;
        if result.is_null() {
            return Ok(None);
        }
        let raw: RpcReceipt = serde_json::from_value(result)
            .map_err(|e| LedgerError::InvalidResponse(format!("receipt: {e}")))?;
        convert_receipt(raw)
    }

    async fn block_number(&self) -> LedgerResult<u64> {
        let result = self.call("eth_blockNumber", json!([])).await?;
        parse_quantity(expect_str(&result, "eth_blockNumber")?)
    }
}

#[async_trait]
impl LedgerWriter for JsonRpcLedger {
    async fn next_nonce(&self, account: &Address) -> LedgerResult<u64> {
        let result = self
            .call("eth_getTransactionCount", json!([account, "pending"]))
            .await?;
        parse_quantity(expect_str(&result, "eth_getTransactionCount")?)
    }

    async fn send_registration(&self, tx: &RegistrationTx) -> LedgerResult<TxHash> {
        let data = RegistryAbi::encode_register_document(&tx.document_hash, &tx.file_name);
        let params = json!([{
            "from": tx.from,
            "to": self.contract,
            "data": encode_data(&data),
            "nonce": format!("{:#x}", tx.nonce),
        }]);
        let result = match self.call("eth_sendTransaction", params).await {
            Ok(result) => result,
            Err(LedgerError::Rpc { message, .. }) if message.to_lowercase().contains("nonce") => {
                return Err(LedgerError::NonceRejected {
                    nonce: tx.nonce,
                    reason: message,
                });
            }
            Err(e) => return Err(e),
        };
        let tx_hash: TxHash = expect_str(&result, "eth_sendTransaction")?
            .parse()
            .map_err(|e| LedgerError::InvalidResponse(format!("transaction hash: {e}")))?;
        debug!(tx = %tx_hash, nonce = tx.nonce, "submitted registration");
        Ok(tx_hash)
    }
}

fn classify_rpc_error(err: RpcErrorObject) -> LedgerError {
    if err.message.to_lowercase().contains("revert") {
        LedgerError::TransactionReverted {
            tx_hash: None,
            reason: err.message,
        }
    } else {
        LedgerError::Rpc {
            code: err.code,
            message: err.message,
        }
    }
}

fn convert_receipt(raw: RpcReceipt) -> LedgerResult<Option<TransactionReceipt>> {
    // Some nodes return a receipt shell before inclusion.
    let Some(block_number) = raw.block_number else {
        return Ok(None);
    };
    let status = match raw.status.as_deref().map(parse_quantity).transpose()? {
        Some(1) | None => ReceiptStatus::Success,
        Some(_) => ReceiptStatus::Reverted,
    };
    let logs = raw
        .logs
        .into_iter()
        .map(|log| -> LedgerResult<LogEntry> {
            Ok(LogEntry {
                address: log.address,
                topics: log
                    .topics
                    .iter()
                    .map(|t| parse_word(t))
                    .collect::<LedgerResult<_>>()?,
                data: parse_data(&log.data)?,
                log_index: log
                    .log_index
                    .as_deref()
                    .map(parse_quantity)
                    .transpose()?
                    .unwrap_or(0),
            })
        })
        .collect::<LedgerResult<Vec<_>>>()?;

    Ok(Some(TransactionReceipt {
        tx_hash: raw.transaction_hash,
        block_number: parse_quantity(&block_number)?,
        from: raw.from,
        to: raw.to,
        status,
        logs,
    }))
}

fn expect_str<'a>(value: &'a Value, method: &str) -> LedgerResult<&'a str> {
    value.as_str().ok_or_else(|| {
        LedgerError::InvalidResponse(format!("{method}: expected string, got {value}"))
    })
}

fn encode_data(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

fn parse_data(s: &str) -> LedgerResult<Vec<u8>> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(digits).map_err(|e| LedgerError::InvalidResponse(format!("hex data: {e}")))
}

fn parse_word(s: &str) -> LedgerResult<[u8; 32]> {
    parse_data(s)?
        .try_into()
        .map_err(|v: Vec<u8>| LedgerError::InvalidResponse(format!("topic of {} bytes", v.len())))
}

fn parse_quantity(s: &str) -> LedgerResult<u64> {
    let digits = s
        .strip_prefix("0x")
        .ok_or_else(|| LedgerError::InvalidResponse(format!("quantity without 0x: {s}")))?;
    if digits.is_empty() {
        return Ok(0);
    }
    u64::from_str_radix(digits, 16)
        .map_err(|e| LedgerError::InvalidResponse(format!("quantity {s}: {e}")))
}
