//! Chunkwise command-line uploader.
//!
//! Usage:
//!   chunkwise upload <PATH> [--category C] [--owner O] [--chunk-size BYTES]
//!   chunkwise status <UPLOAD_ID>
//!   chunkwise abort <UPLOAD_ID>

mod adapter;
mod config;
mod render;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use chunkwise_file_service::Client;
use chunkwise_protocol::HashAlgorithm;
use chunkwise_uploader::{UploadError, UploadIntent, Uploader};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::adapter::HttpFileService;
use crate::config::ChunkwiseConfig;

/// Exit status after Ctrl-C, matching shells' 128 + SIGINT.
const EXIT_CANCELLED: u8 = 130;

#[derive(Parser, Debug)]
#[command(name = "chunkwise", version, about = "Chunked uploads to a file service")]
struct Cli {
    /// Path to config.json (default: ~/.config/chunkwise/config.json)
    #[arg(long, short = 'c', env = "CHUNKWISE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// File service base URL
    #[arg(long, env = "CHUNKWISE_SERVER_URL", global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload one file
    Upload(UploadArgs),
    /// Show how many chunks of a session the service holds
    Status { upload_id: String },
    /// Discard a session on the service
    Abort { upload_id: String },
}

#[derive(Args, Debug)]
struct UploadArgs {
    /// File to upload
    path: PathBuf,

    /// Category label stored with the file
    #[arg(long)]
    category: Option<String>,

    /// Owner identity stored with the file
    #[arg(long)]
    owner: Option<String>,

    /// Chunk size in bytes
    #[arg(long)]
    chunk_size: Option<u64>,

    /// Maximum chunks in flight
    #[arg(long)]
    concurrency: Option<usize>,

    /// Skip fingerprinting (disables fast upload)
    #[arg(long)]
    no_fingerprint: bool,

    /// Fingerprint algorithm (md5, sha256)
    #[arg(long)]
    algorithm: Option<HashAlgorithm>,

    /// Print events as JSON lines instead of status text
    #[arg(long)]
    json_events: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut config = match &cli.config {
        Some(path) => ChunkwiseConfig::load_from(path)?,
        None => ChunkwiseConfig::load()?,
    };
    if let Some(server) = cli.server {
        config.server_url = server;
    }

    let client = Client::new(&config.server_url)
        .with_context(|| format!("bad server URL {}", config.server_url))?
        .with_timeouts(config.timeouts());
    let service = Arc::new(HttpFileService::new(client));

    match cli.command {
        Command::Upload(args) => upload(service, config, args).await,
        Command::Status { upload_id } => {
            let uploader = Uploader::new(service, config.upload_config());
            let status = uploader.status(&upload_id).await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Abort { upload_id } => {
            let uploader = Uploader::new(service, config.upload_config());
            if uploader.cancel_session(&upload_id).await {
                println!("aborted {upload_id}");
                Ok(ExitCode::SUCCESS)
            } else {
                eprintln!("abort of {upload_id} was not acknowledged");
                Ok(ExitCode::FAILURE)
            }
        }
    }
}

async fn upload(
    service: Arc<HttpFileService>,
    mut config: ChunkwiseConfig,
    args: UploadArgs,
) -> anyhow::Result<ExitCode> {
    if let Some(n) = args.concurrency {
        config.max_concurrent_chunks = n;
    }
    if let Some(algorithm) = args.algorithm {
        config.hash_algorithm = algorithm;
    }

    let intent = UploadIntent::from_path(&args.path)
        .await
        .with_context(|| format!("cannot read {}", args.path.display()))?
        .with_file_type(args.category.unwrap_or_else(|| config.category.clone()))
        .with_uploader_id(args.owner.unwrap_or_else(|| config.owner.clone()))
        .with_chunk_size(args.chunk_size.unwrap_or(config.chunk_size))
        .with_fingerprint(config.fingerprint && !args.no_fingerprint);

    let mut uploader = Uploader::new(service, config.upload_config());
    let events = uploader
        .take_events()
        .context("event channel already taken")?;
    let renderer = tokio::spawn(render::render_events(events, args.json_events));

    let cancel = uploader.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling upload");
            cancel.cancel();
        }
    });

    info!(file = %intent.file_name, size = intent.file_size, server = %config.server_url, "starting upload");
    let result = uploader.upload(&intent).await;
    drop(uploader);
    let _ = renderer.await;

    match result {
        Ok(record) => {
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(UploadError::Cancelled) => Ok(ExitCode::from(EXIT_CANCELLED)),
        Err(e) => {
            if let Some(upload_id) = e.upload_id() {
                eprintln!("session {upload_id} may still be held by the service; `chunkwise abort {upload_id}` discards it");
            }
            Err(e.into())
        }
    }
}
