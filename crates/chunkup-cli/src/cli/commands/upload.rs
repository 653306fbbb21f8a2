//! `chunkup upload <id> <path>` – send a file part by part.

use anyhow::Result;
use chunkup_core::config::ChunkupConfig;
use chunkup_core::orchestrate::{self, UploadOptions, UploadOutcome};
use chunkup_core::retry::RetryPolicy;
use chunkup_core::UploadClient;
use std::path::PathBuf;

#[derive(Debug)]
pub struct UploadArgs {
    pub id: i64,
    pub path: PathBuf,
    pub name: Option<String>,
    pub chunk_size: u64,
    pub skip_if_unchanged: bool,
}

pub async fn run_upload(client: &UploadClient, cfg: &ChunkupConfig, args: UploadArgs) -> Result<()> {
    let options = UploadOptions {
        chunk_size: args.chunk_size,
        retry: cfg
            .retry
            .as_ref()
            .map(RetryPolicy::from)
            .unwrap_or_else(RetryPolicy::once),
        skip_if_unchanged: args.skip_if_unchanged,
    };

    let report = orchestrate::upload_file(
        client,
        args.id,
        &args.path,
        args.name.as_deref(),
        &options,
        |p| {
            println!(
                "part {}/{}  {} / {} bytes",
                p.parts_uploaded, p.parts_total, p.bytes_sent, p.file_size
            )
        },
    )
    .await?;

    match report.outcome {
        UploadOutcome::Completed => {
            let session = report
                .session
                .as_ref()
                .map(|s| s.session_id.as_str())
                .unwrap_or("-");
            println!(
                "uploaded {} parts (session {})",
                report.parts_uploaded, session
            );
            Ok(())
        }
        UploadOutcome::AlreadyPresent => {
            println!("server copy is up to date; nothing sent");
            Ok(())
        }
        UploadOutcome::SessionRejected { error_code, body } => anyhow::bail!(
            "session rejected ({}): {}",
            error_code.as_deref().unwrap_or("no error code"),
            body
        ),
        UploadOutcome::SessionFailed { status, body } => {
            anyhow::bail!("session request returned HTTP {}: {}", status, body)
        }
        UploadOutcome::PartFailed { part, status, body } => anyhow::bail!(
            "part at offset {} failed with HTTP {} after {} of {} parts: {}",
            part.offset,
            status,
            report.parts_uploaded,
            report.parts_total,
            body
        ),
        UploadOutcome::PartError { span, error } => {
            let session = report
                .session
                .as_ref()
                .map(|s| s.session_id.as_str())
                .unwrap_or("-");
            anyhow::bail!(
                "part at offset {} not sent after {} of {} parts (session {}): {}",
                span.offset,
                report.parts_uploaded,
                report.parts_total,
                session,
                error
            )
        }
    }
}
