//! Ledger access for Notary.
//!
//! This crate is the write and read path to the document registry. It
//! provides:
//! - A minimal ABI codec and the registry contract binding
//! - `LedgerReader` / `LedgerWriter` capability traits, combined as `Ledger`
//! - `InMemoryLedger` for tests, demos, and running without a node
//! - `JsonRpcLedger` for EVM nodes
//! - `ReceiptDecoder` for the `DocumentRegistered` event
//! - `LedgerClient`: serialized submissions and bounded confirmation waits

pub mod abi;
pub mod client;
pub mod config;
pub mod contract;
pub mod decoder;
pub mod error;
pub mod memory;
pub mod rpc;
pub mod traits;

pub use client::{ConfirmationPolicy, LedgerClient, PendingTransaction};
pub use config::{
    ConfirmationConfig, DeploymentArtifact, LedgerBackend, LedgerConfig, DEFAULT_CONTRACT_ADDRESS,
    DEFAULT_SIGNER,
};
pub use contract::RegistryAbi;
pub use decoder::{DocumentRegistered, EventSchema, ReceiptDecoder};
pub use error::{LedgerError, LedgerResult};
pub use memory::{InMemoryLedger, MiningMode};
pub use rpc::JsonRpcLedger;
pub use traits::{Ledger, LedgerReader, LedgerWriter, RegistrationTx};
