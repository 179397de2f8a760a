use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "notary",
    about = "Notary: anchor document hashes to a ledger and verify them later",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log at debug level (default: info for `serve`, warn otherwise)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the ledger JSON-RPC endpoint
    #[arg(long, global = true)]
    pub rpc_url: Option<String>,
}

impl Cli {
    /// Maximum tracing level for the stderr subscriber.
    pub fn log_level(&self) -> tracing::Level {
        match (&self.command, self.verbose) {
            (_, true) => tracing::Level::DEBUG,
            (Command::Serve(_), false) => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP server
    Serve(ServeArgs),
    /// Print the SHA-256 digest of a file
    Hash(HashArgs),
    /// Register a file on the ledger
    Register(RegisterArgs),
    /// Check whether a file is registered
    Verify(VerifyArgs),
    /// List documents registered by an address
    List(ListArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    #[arg(long)]
    pub bind: Option<SocketAddr>,
    /// Use the in-memory ledger instead of a node
    #[arg(long)]
    pub memory: bool,
}

#[derive(Args)]
pub struct HashArgs {
    pub file: PathBuf,
}

#[derive(Args)]
pub struct RegisterArgs {
    pub file: PathBuf,
    /// Name to record instead of the file's own name
    #[arg(short, long)]
    pub name: Option<String>,
}

#[derive(Args)]
pub struct VerifyArgs {
    pub file: PathBuf,
}

#[derive(Args)]
pub struct ListArgs {
    pub address: String,
}
