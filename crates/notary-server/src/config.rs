use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use notary_ledger::{ConfirmationConfig, LedgerConfig};
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub max_upload_bytes: usize,
    /// Directory for staged uploads; the system temp dir when unset.
    pub staging_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 3000)),
            max_upload_bytes: 25 * 1024 * 1024,
            staging_dir: None,
        }
    }
}

/// Complete configuration file: `[server]`, `[ledger]`, `[confirmation]`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotaryConfig {
    pub server: ServerConfig,
    pub ledger: LedgerConfig,
    pub confirmation: ConfirmationConfig,
}

impl NotaryConfig {
    pub fn from_toml_str(text: &str) -> ServerResult<Self> {
        toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }
}
