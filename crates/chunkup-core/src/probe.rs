//! Existence probing: does the server already hold a file for a resource?
//!
//! `HEAD B/Files(R)`: 204 means the file exists (metadata in the headers),
//! 404 means it does not. Anything else is a server error.

use crate::client::UploadClient;
use crate::content_disposition;
use crate::error::{ResourceId, UploadError};
use crate::observer::Method;
use crate::part::decode_content_md5;
use crate::transport::{Body, Request, Response};

/// Metadata of an existing server file, taken from the probe response headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteFile {
    /// Raw `Last-Modified` value.
    pub last_modified: Option<String>,
    /// File name declared in `Content-Disposition`.
    pub file_name: Option<String>,
    /// Checksum from `Content-MD5`, decoded to text.
    pub hash: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Found(RemoteFile),
    /// No file exists for the resource yet. Not an error.
    NotFound,
    /// Unexpected status; `body` is the raw response text.
    ServerError { body: String },
}

/// Result of one existence probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub status: u32,
    /// Address the probe resolved to (after redirects).
    pub located_uri: String,
    pub outcome: ProbeOutcome,
}

impl ProbeResult {
    pub fn found(&self) -> bool {
        matches!(self.outcome, ProbeOutcome::Found(_))
    }

    pub fn remote_file(&self) -> Option<&RemoteFile> {
        match &self.outcome {
            ProbeOutcome::Found(file) => Some(file),
            _ => None,
        }
    }

    /// Diagnostic text; only set for server errors.
    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            ProbeOutcome::ServerError { body } => Some(body),
            _ => None,
        }
    }
}

impl UploadClient {
    /// Probes whether a file exists for `resource_id`.
    pub async fn probe(&self, resource_id: i64) -> Result<ProbeResult, UploadError> {
        let id = ResourceId::new(resource_id)?;
        let request = Request {
            method: Method::Head,
            uri: self.transport().file_uri(id),
            body: Body::Empty,
        };
        let response = self.round_trip(id, request).await?;
        let result = classify(response);
        tracing::debug!(resource_id, status = result.status, found = result.found(), "probe");
        Ok(result)
    }
}

fn classify(response: Response) -> ProbeResult {
    let outcome = match response.status {
        204 => ProbeOutcome::Found(remote_file(&response)),
        404 => ProbeOutcome::NotFound,
        _ => ProbeOutcome::ServerError {
            body: response.body_text(),
        },
    };
    ProbeResult {
        status: response.status,
        located_uri: response.located_uri,
        outcome,
    }
}

fn remote_file(response: &Response) -> RemoteFile {
    RemoteFile {
        last_modified: response.header("last-modified").map(str::to_string),
        file_name: response
            .header("content-disposition")
            .and_then(content_disposition::file_name),
        hash: response.header("content-md5").and_then(decode_content_md5),
    }
}
