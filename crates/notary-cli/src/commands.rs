use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use colored::Colorize;
use notary_crypto::ContentHasher;
use notary_ledger::LedgerBackend;
use notary_server::{NotaryConfig, NotaryServer};
use notary_service::{DocumentList, NotaryService, ServiceError};
use serde::Serialize;
use serde_json::json;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let mut config = load_config(&cli)?;
    apply_overrides(&mut config, &cli);
    let format = cli.format;

    let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
    runtime.block_on(async move {
        let result = match cli.command {
            Command::Serve(_) => cmd_serve(&config).await,
            Command::Hash(args) => cmd_hash(args, format).await,
            Command::Register(args) => cmd_register(args, &config, format).await,
            Command::Verify(args) => cmd_verify(args, &config, format).await,
            Command::List(args) => cmd_list(args, &config, format).await,
        };
        if let (Err(e), OutputFormat::Json) = (&result, format) {
            if let Some(service_err) = e.downcast_ref::<ServiceError>() {
                print_json(&json!({ "success": false, "error": service_err.report() }))?;
            }
        }
        result
    })
}

fn load_config(cli: &Cli) -> anyhow::Result<NotaryConfig> {
    match &cli.config {
        Some(path) => NotaryConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => Ok(NotaryConfig::default()),
    }
}

fn apply_overrides(config: &mut NotaryConfig, cli: &Cli) {
    if let Some(url) = &cli.rpc_url {
        config.ledger.rpc_url = url.clone();
    }
    if let Command::Serve(args) = &cli.command {
        if let Some(bind) = args.bind {
            config.server.bind_addr = bind;
        }
        if args.memory {
            config.ledger.backend = LedgerBackend::Memory;
        }
    }
}

fn connect(config: &NotaryConfig) -> anyhow::Result<NotaryService> {
    NotaryService::from_config(&config.ledger, &config.confirmation)
        .context("connecting to the ledger")
}

async fn cmd_serve(config: &NotaryConfig) -> anyhow::Result<()> {
    let server = NotaryServer::from_config(config).context("building server")?;
    server.serve().await?;
    Ok(())
}

async fn cmd_hash(args: HashArgs, format: OutputFormat) -> anyhow::Result<()> {
    let hash = ContentHasher::hash_file(&args.file)
        .await
        .with_context(|| format!("reading {}", args.file.display()))?;
    match format {
        OutputFormat::Json => print_json(&json!({
            "file": args.file.display().to_string(),
            "documentHash": hash,
        })),
        OutputFormat::Text => {
            println!("{}  {}", hash.to_string().cyan(), args.file.display());
            Ok(())
        }
    }
}

async fn cmd_register(
    args: RegisterArgs,
    config: &NotaryConfig,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let name = match args.name {
        Some(name) => name,
        None => default_name(&args.file)?,
    };
    let file = open(&args.file).await?;
    let service = connect(config)?;
    let result = service.register(&name, file).await?;

    match format {
        OutputFormat::Json => print_json(&result),
        OutputFormat::Text => {
            println!("{} {}", "✓".green().bold(), result.message);
            println!("  File:        {}", result.file_name.bold());
            println!("  Hash:        {}", result.document_hash.to_string().cyan());
            println!("  Document ID: {}", result.document_id.to_string().yellow());
            println!("  Transaction: {}", result.transaction_hash.to_string().dimmed());
            println!(
                "  Block:       {} ({})",
                result.block_number,
                format_timestamp(result.timestamp)
            );
            Ok(())
        }
    }
}

async fn cmd_verify(
    args: VerifyArgs,
    config: &NotaryConfig,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let name = default_name(&args.file)?;
    let file = open(&args.file).await?;
    let service = connect(config)?;
    let result = service.verify(&name, file).await?;

    match format {
        OutputFormat::Json => print_json(&result),
        OutputFormat::Text => {
            if result.is_valid {
                println!("{} {}", "✓".green().bold(), result.message);
            } else {
                println!("{} {}", "✗".red().bold(), result.message);
            }
            println!("  Hash:          {}", result.document_hash.to_string().cyan());
            if let Some(original) = &result.original_file_name {
                println!("  Registered as: {}", original.bold());
            }
            if let Some(owner) = &result.owner {
                println!("  Owner:         {}", owner.to_string().yellow());
            }
            if let Some(ts) = result.timestamp {
                println!("  Registered at: {}", format_timestamp(ts));
            }
            Ok(())
        }
    }
}

async fn cmd_list(args: ListArgs, config: &NotaryConfig, format: OutputFormat) -> anyhow::Result<()> {
    let service = connect(config)?;
    let documents = service.list_by_owner(&args.address).await?;

    match format {
        OutputFormat::Json => print_json(&DocumentList { documents }),
        OutputFormat::Text => {
            if documents.is_empty() {
                println!("No documents registered by {}.", args.address.bold());
                return Ok(());
            }
            for doc in &documents {
                println!(
                    "{}  {}  {}",
                    doc.document_id.to_string().yellow(),
                    format_timestamp(doc.timestamp()).dimmed(),
                    doc.file_name().bold()
                );
                println!("    {}", doc.document_hash().to_string().cyan());
            }
            Ok(())
        }
    }
}

async fn open(path: &Path) -> anyhow::Result<tokio::fs::File> {
    tokio::fs::File::open(path)
        .await
        .with_context(|| format!("opening {}", path.display()))
}

fn default_name(path: &Path) -> anyhow::Result<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("{} has no file name", path.display()))
}

fn format_timestamp(secs: u64) -> String {
    i64::try_from(secs)
        .ok()
        .and_then(|s| DateTime::<Utc>::from_timestamp(s, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| secs.to_string())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
