use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notary_types::Address;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::client::ConfirmationPolicy;
use crate::error::{LedgerError, LedgerResult};
use crate::memory::{InMemoryLedger, MiningMode};
use crate::rpc::JsonRpcLedger;
use crate::traits::Ledger;

/// First account of a local development node.
pub const DEFAULT_SIGNER: Address = Address::from_bytes([
    0xf3, 0x9f, 0xd6, 0xe5, 0x1a, 0xad, 0x88, 0xf6, 0xf4, 0xce, 0x6a, 0xb8, 0x82, 0x72, 0x79,
    0xcf, 0xff, 0xb9, 0x22, 0x66,
]);

/// Address of the first contract that account deploys.
pub const DEFAULT_CONTRACT_ADDRESS: Address = Address::from_bytes([
    0x5f, 0xbd, 0xb2, 0x31, 0x56, 0x78, 0xaf, 0xec, 0xb3, 0x67, 0xf0, 0x32, 0xd9, 0x3f, 0x64,
    0x2f, 0x64, 0x18, 0x0a, 0xa3,
]);

pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerBackend {
    #[default]
    Rpc,
    Memory,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub backend: LedgerBackend,
    pub rpc_url: String,
    pub contract_address: Option<Address>,
    pub contract_address_file: Option<PathBuf>,
    pub signer: Address,
    pub request_timeout_secs: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            backend: LedgerBackend::Rpc,
            rpc_url: DEFAULT_RPC_URL.to_string(),
            contract_address: None,
            contract_address_file: Some(PathBuf::from("contract-address.json")),
            signer: DEFAULT_SIGNER,
            request_timeout_secs: 30,
        }
    }
}

/// Deployment artifact written by the contract deploy script.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentArtifact {
    pub address: Address,
    #[serde(default)]
    pub network: Option<String>,
}

impl DeploymentArtifact {
    pub fn load(path: &Path) -> LedgerResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| LedgerError::Config(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&text)
            .map_err(|e| LedgerError::Config(format!("{}: {e}", path.display())))
    }
}

impl LedgerConfig {
    /// An explicit address wins over the artifact file. The in-memory
    /// backend falls back to its built-in address when neither is usable.
    pub fn resolve_contract_address(&self) -> LedgerResult<Address> {
        if let Some(address) = self.contract_address {
            return Ok(address);
        }
        let from_file = self
            .contract_address_file
            .as_deref()
            .map(DeploymentArtifact::load);
        match (from_file, self.backend) {
            (Some(Ok(artifact)), _) => {
                info!(
                    address = %artifact.address,
                    network = artifact.network.as_deref().unwrap_or("unknown"),
                    "loaded contract address from deployment artifact"
                );
                Ok(artifact.address)
            }
            (_, LedgerBackend::Memory) => Ok(DEFAULT_CONTRACT_ADDRESS),
            (Some(Err(e)), LedgerBackend::Rpc) => Err(e),
            (None, LedgerBackend::Rpc) => Err(LedgerError::Config(
                "no contract_address or contract_address_file configured".into(),
            )),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Build the configured backend.
    pub fn connect(&self) -> LedgerResult<Arc<dyn Ledger>> {
        let contract = self.resolve_contract_address()?;
        match self.backend {
            LedgerBackend::Rpc => {
                info!(url = %self.rpc_url, %contract, "using JSON-RPC ledger");
                Ok(Arc::new(JsonRpcLedger::new(
                    self.rpc_url.clone(),
                    contract,
                    self.request_timeout(),
                )?))
            }
            LedgerBackend::Memory => {
                info!(%contract, "using in-memory ledger");
                Ok(Arc::new(InMemoryLedger::with_contract(
                    contract,
                    MiningMode::Instant,
                )))
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfirmationConfig {
    pub timeout_secs: u64,
    pub poll_interval_ms: u64,
    pub confirmations: u64,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        let policy = ConfirmationPolicy::default();
        Self {
            timeout_secs: policy.timeout.as_secs(),
            poll_interval_ms: policy.poll_interval.as_millis() as u64,
            confirmations: policy.confirmations,
        }
    }
}

impl ConfirmationConfig {
    pub fn policy(&self) -> ConfirmationPolicy {
        ConfirmationPolicy::new(
            Duration::from_secs(self.timeout_secs),
            Duration::from_millis(self.poll_interval_ms),
            self.confirmations,
        )
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn default_config() {
        let c = LedgerConfig::default();
        assert_eq!(c.backend, LedgerBackend::Rpc);
        assert_eq!(c.rpc_url, "http://127.0.0.1:8545");
        assert_eq!(c.signer.to_string(), "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266");
        assert_eq!(
            DEFAULT_CONTRACT_ADDRESS.to_string(),
            "0x5fbdb2315678afecb367f032d93f642f64180aa3"
        );
    }

    #[test]
    fn explicit_address_wins() {
        let c = LedgerConfig {
            contract_address: Some(Address::from_bytes([7; 20])),
            contract_address_file: Some("does-not-exist.json".into()),
            ..LedgerConfig::default()
        };
        assert_eq!(
            c.resolve_contract_address().unwrap(),
            Address::from_bytes([7; 20])
        );
    }

    #[test]
    fn address_from_artifact() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "address": "0x5FbDB2315678afecb367f032d93F642f64180aa3", "network": "localhost" }}"#
        )
        .unwrap();
        let c = LedgerConfig {
            contract_address_file: Some(file.path().to_path_buf()),
            ..LedgerConfig::default()
        };
        assert_eq!(c.resolve_contract_address().unwrap(), DEFAULT_CONTRACT_ADDRESS);
    }

    #[test]
    fn rpc_without_artifact_is_config_error() {
        let c = LedgerConfig {
            contract_address_file: Some("/nonexistent/contract-address.json".into()),
            ..LedgerConfig::default()
        };
        assert!(matches!(
            c.resolve_contract_address(),
            Err(LedgerError::Config(_))
        ));
    }

    #[test]
    fn memory_backend_falls_back_to_builtin_address() {
        let c = LedgerConfig {
            backend: LedgerBackend::Memory,
            contract_address_file: None,
            ..LedgerConfig::default()
        };
        assert_eq!(c.resolve_contract_address().unwrap(), DEFAULT_CONTRACT_ADDRESS);
        assert!(c.connect().is_ok());
    }

    #[test]
    fn parses_from_toml() {
        let c: LedgerConfig = toml::from_str(
            r#"
            backend = "memory"
            signer = "0x0101010101010101010101010101010101010101"
            "#,
        )
        .unwrap();
        assert_eq!(c.backend, LedgerBackend::Memory);
        assert_eq!(c.signer, Address::from_bytes([1; 20]));
        assert_eq!(c.request_timeout_secs, 30);
    }

    #[test]
    fn confirmation_defaults_match_policy() {
        let policy = ConfirmationConfig::default().policy();
        assert_eq!(policy, ConfirmationPolicy::default());
    }
}
