//! `chunkup probe <id>` – does the server already hold a file?

use anyhow::Result;
use chunkup_core::{ProbeOutcome, UploadClient};

pub async fn run_probe(client: &UploadClient, id: i64) -> Result<()> {
    let result = client.probe(id).await?;
    match &result.outcome {
        ProbeOutcome::Found(file) => {
            println!("found      {}", result.located_uri);
            println!("name       {}", file.file_name.as_deref().unwrap_or("-"));
            println!("modified   {}", file.last_modified.as_deref().unwrap_or("-"));
            println!("checksum   {}", file.hash.as_deref().unwrap_or("-"));
        }
        ProbeOutcome::NotFound => println!("not found  {}", result.located_uri),
        ProbeOutcome::ServerError { body } => {
            anyhow::bail!("probe returned HTTP {}: {}", result.status, body)
        }
    }
    Ok(())
}
