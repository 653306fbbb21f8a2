//! `chunkup create-session <id>` – open an upload session and print it.

use anyhow::Result;
use chunkup_core::{SessionOutcome, UploadClient};

pub async fn run_create_session(client: &UploadClient, id: i64) -> Result<()> {
    let result = client.create_session(id).await?;
    match result.outcome {
        SessionOutcome::Created(session) => {
            println!("{}", serde_json::to_string_pretty(&session)?);
            Ok(())
        }
        SessionOutcome::Rejected { error_code, body } => anyhow::bail!(
            "session rejected ({}): {}",
            error_code.as_deref().unwrap_or("no error code"),
            body
        ),
        SessionOutcome::ServerError { body } => {
            anyhow::bail!("session request returned HTTP {}: {}", result.status, body)
        }
    }
}
