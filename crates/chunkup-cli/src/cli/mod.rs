//! CLI for the chunkup upload client.

mod commands;

use anyhow::Result;
use chunkup_core::config::{self, ChunkupConfig};
use chunkup_core::UploadClient;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::{run_config_path, run_create_session, run_probe, run_upload, UploadArgs};

/// Environment variable that overrides the configured bearer token.
const TOKEN_ENV: &str = "CHUNKUP_TOKEN";

/// Top-level CLI for the chunkup upload client.
#[derive(Debug, Parser)]
#[command(name = "chunkup")]
#[command(about = "chunkup: resumable chunked uploads", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Check whether the server already holds a file for a resource.
    Probe {
        /// Resource identifier.
        #[arg(allow_negative_numbers = true)]
        id: i64,
    },

    /// Open a new upload session for a resource and print it as JSON.
    CreateSession {
        /// Resource identifier.
        #[arg(allow_negative_numbers = true)]
        id: i64,
    },

    /// Upload a local file in parts.
    Upload {
        /// Resource identifier.
        #[arg(allow_negative_numbers = true)]
        id: i64,

        /// Local file to upload.
        path: PathBuf,

        /// File name sent to the server (default: the local file name).
        #[arg(long)]
        name: Option<String>,

        /// Part size in bytes (default: `chunk_size` from config).
        #[arg(long, value_name = "BYTES")]
        chunk_size: Option<u64>,

        /// Skip the upload when the server copy has the same MD5.
        #[arg(long)]
        skip_if_unchanged: bool,
    },

    /// Print the path of the configuration file.
    ConfigPath,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        if let CliCommand::ConfigPath = cli.command {
            return run_config_path();
        }

        let cfg = load_config()?;
        tracing::debug!(base_url = %cfg.base_url, "loaded config");
        let client = UploadClient::from_config(&cfg)?;

        match cli.command {
            CliCommand::Probe { id } => run_probe(&client, id).await?,
            CliCommand::CreateSession { id } => run_create_session(&client, id).await?,
            CliCommand::Upload {
                id,
                path,
                name,
                chunk_size,
                skip_if_unchanged,
            } => {
                let args = UploadArgs {
                    id,
                    path,
                    name,
                    chunk_size: chunk_size.unwrap_or(cfg.chunk_size),
                    skip_if_unchanged,
                };
                run_upload(&client, &cfg, args).await?;
            }
            CliCommand::ConfigPath => {}
        }

        Ok(())
    }
}

fn load_config() -> Result<ChunkupConfig> {
    let mut cfg = config::load_or_init()?;
    if let Ok(token) = std::env::var(TOKEN_ENV) {
        if !token.is_empty() {
            cfg.bearer_token = Some(token);
        }
    }
    Ok(cfg)
}

#[cfg(test)]
mod tests;
