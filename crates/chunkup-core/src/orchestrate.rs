//! Whole-file upload: probe, negotiate a session, then send every part in order.
//!
//! Parts go out strictly one after another in increasing offset order over
//! a single stream. A part that still fails after the retry policy gives up
//! ends the run; the session is left as the server has it so the caller can
//! resume by re-sending that part. Once a session exists, part failures are
//! reported in the [`UploadReport`] rather than as `Err`, so the session id
//! and accepted-part count survive.

use crate::client::UploadClient;
use crate::error::UploadError;
use crate::negotiate::SessionOutcome;
use crate::part::{plan_parts, PartDescriptor, PartSpan};
use crate::probe::ProbeOutcome;
use crate::retry::{classify_error, classify_status, RetryDecision, RetryPolicy};
use crate::session::UploadSession;
use crate::transmit::PartUploadResult;
use md5::{Digest, Md5};
use std::io::SeekFrom;
use std::path::Path;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt};

const HASH_BUF_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct UploadOptions {
    /// Part size in bytes.
    pub chunk_size: u64,
    /// Retransmission policy per part.
    pub retry: RetryPolicy,
    /// Probe first and skip the upload if the server already holds a file
    /// whose checksum equals the local file's MD5.
    pub skip_if_unchanged: bool,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            chunk_size: 4 * 1024 * 1024,
            retry: RetryPolicy::once(),
            skip_if_unchanged: false,
        }
    }
}

/// Snapshot passed to the progress callback after each accepted part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub parts_uploaded: u32,
    pub parts_total: u32,
    pub bytes_sent: u64,
    pub file_size: u64,
}

#[derive(Debug)]
pub enum UploadOutcome {
    /// Every part was accepted.
    Completed,
    /// The server already holds identical content; nothing was sent.
    AlreadyPresent,
    SessionRejected {
        error_code: Option<String>,
        body: String,
    },
    SessionFailed { status: u32, body: String },
    /// This part was not accepted; earlier parts were.
    PartFailed {
        part: PartDescriptor,
        status: u32,
        body: String,
    },
    /// Reading, sending or cancelling this part ended without a server
    /// answer; earlier parts were accepted.
    PartError { span: PartSpan, error: UploadError },
}

#[derive(Debug)]
pub struct UploadReport {
    pub resource_id: i64,
    pub session: Option<UploadSession>,
    pub parts_total: u32,
    pub parts_uploaded: u32,
    pub outcome: UploadOutcome,
}

impl UploadReport {
    pub fn is_complete(&self) -> bool {
        matches!(
            self.outcome,
            UploadOutcome::Completed | UploadOutcome::AlreadyPresent
        )
    }
}

/// Uploads the file at `path`. The uploaded name defaults to the path's file name.
pub async fn upload_file<F>(
    client: &UploadClient,
    resource_id: i64,
    path: &Path,
    file_name: Option<&str>,
    options: &UploadOptions,
    on_progress: F,
) -> Result<UploadReport, UploadError>
where
    F: FnMut(&Progress),
{
    let name = match file_name {
        Some(n) => n.to_string(),
        None => path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                UploadError::invalid(format!("{} has no file name", path.display()))
            })?,
    };
    let mut file = tokio::fs::File::open(path).await?;
    let file_size = file.metadata().await?.len();
    upload_stream(
        client,
        resource_id,
        &mut file,
        file_size,
        &name,
        options,
        on_progress,
    )
    .await
}

/// Uploads `file_size` bytes of `stream` as `file_name`.
pub async fn upload_stream<S, F>(
    client: &UploadClient,
    resource_id: i64,
    stream: &mut S,
    file_size: u64,
    file_name: &str,
    options: &UploadOptions,
    mut on_progress: F,
) -> Result<UploadReport, UploadError>
where
    S: AsyncRead + AsyncSeek + Unpin,
    F: FnMut(&Progress),
{
    if options.chunk_size == 0 {
        return Err(UploadError::invalid("chunk size must be positive"));
    }
    if file_size == 0 {
        return Err(UploadError::invalid("cannot upload an empty file"));
    }
    let spans = plan_parts(file_size, options.chunk_size);
    let parts_total = u32::try_from(spans.len())
        .map_err(|_| UploadError::invalid("too many parts; raise the chunk size"))?;

    let mut report = UploadReport {
        resource_id,
        session: None,
        parts_total,
        parts_uploaded: 0,
        outcome: UploadOutcome::Completed,
    };

    if options.skip_if_unchanged {
        let probe = client.probe(resource_id).await?;
        if let ProbeOutcome::Found(remote) = &probe.outcome {
            let local = md5_stream(stream, file_size).await?;
            if remote.hash.as_deref() == Some(local.as_str()) {
                tracing::info!(resource_id, hash = %local, "server copy is current; skipping upload");
                report.outcome = UploadOutcome::AlreadyPresent;
                return Ok(report);
            }
        }
    }

    let negotiated = client.create_session(resource_id).await?;
    let status = negotiated.status;
    let session = match negotiated.outcome {
        SessionOutcome::Created(session) => session,
        SessionOutcome::Rejected { error_code, body } => {
            report.outcome = UploadOutcome::SessionRejected { error_code, body };
            return Ok(report);
        }
        SessionOutcome::ServerError { body } => {
            report.outcome = UploadOutcome::SessionFailed { status, body };
            return Ok(report);
        }
    };
    report.session = Some(session.clone());

    let mut bytes_sent = 0u64;
    for span in spans {
        // upload_part reads the payload again; this read only produces the hash.
        let sent = match describe_part(stream, span.offset, span.size).await {
            Ok(part) => {
                let result = send_with_retry(
                    client,
                    resource_id,
                    &session.session_id,
                    stream,
                    &part,
                    file_name,
                    file_size,
                    parts_total,
                    report.parts_uploaded,
                    &options.retry,
                )
                .await;
                result.map(|result| (part, result))
            }
            Err(e) => Err(e),
        };
        let (part, result) = match sent {
            Ok(sent) => sent,
            Err(error) => {
                tracing::warn!(
                    resource_id,
                    session_id = %session.session_id,
                    offset = span.offset,
                    parts = report.parts_uploaded,
                    "part aborted: {}",
                    error
                );
                report.outcome = UploadOutcome::PartError { span, error };
                return Ok(report);
            }
        };

        if !result.accepted() {
            report.outcome = UploadOutcome::PartFailed {
                part,
                status: result.status,
                body: result.error().unwrap_or_default().to_string(),
            };
            return Ok(report);
        }
        report.parts_uploaded = result.parts_uploaded();
        bytes_sent += part.size;
        on_progress(&Progress {
            parts_uploaded: report.parts_uploaded,
            parts_total,
            bytes_sent,
            file_size,
        });
    }

    tracing::info!(
        resource_id,
        session_id = %session.session_id,
        parts = report.parts_uploaded,
        "upload complete"
    );
    Ok(report)
}

/// Sends one part, retransmitting the same descriptor per `policy`.
#[allow(clippy::too_many_arguments)]
async fn send_with_retry<S>(
    client: &UploadClient,
    resource_id: i64,
    session_id: &str,
    stream: &mut S,
    part: &PartDescriptor,
    file_name: &str,
    file_size: u64,
    parts_total: u32,
    parts_uploaded: u32,
    policy: &RetryPolicy,
) -> Result<PartUploadResult, UploadError>
where
    S: AsyncRead + AsyncSeek + Unpin,
{
    let mut attempt = 1u32;
    loop {
        let res = client
            .upload_part(
                resource_id,
                session_id,
                stream,
                part,
                file_name,
                file_size,
                parts_total,
                parts_uploaded,
            )
            .await;
        let kind = match &res {
            Ok(r) if r.accepted() => None,
            Ok(r) => Some(classify_status(r.status)),
            Err(e) => Some(classify_error(e)),
        };
        let Some(kind) = kind else {
            return res;
        };
        match policy.decide(attempt, kind) {
            RetryDecision::NoRetry => return res,
            RetryDecision::RetryAfter(delay) => {
                tracing::warn!(
                    resource_id,
                    offset = part.offset,
                    attempt,
                    ?kind,
                    "part failed; retrying in {:?}",
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// Reads `[offset, offset + size)` from the stream and hashes it.
async fn describe_part<S>(
    stream: &mut S,
    offset: u64,
    size: u64,
) -> Result<PartDescriptor, UploadError>
where
    S: AsyncRead + AsyncSeek + Unpin,
{
    let len = usize::try_from(size)
        .map_err(|_| UploadError::invalid("part size does not fit in memory"))?;
    let mut buf = vec![0u8; len];
    stream.seek(SeekFrom::Start(offset)).await?;
    stream.read_exact(&mut buf).await?;
    Ok(PartDescriptor::from_bytes(offset, &buf))
}

/// Lowercase hex MD5 of the first `len` bytes of the stream.
async fn md5_stream<S>(stream: &mut S, len: u64) -> Result<String, UploadError>
where
    S: AsyncRead + AsyncSeek + Unpin,
{
    stream.seek(SeekFrom::Start(0)).await?;
    let mut hasher = Md5::new();
    let mut buf = vec![0u8; HASH_BUF_SIZE];
    let mut remaining = len;
    while remaining > 0 {
        let want = remaining.min(HASH_BUF_SIZE as u64) as usize;
        let n = stream.read(&mut buf[..want]).await?;
        if n == 0 {
            return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into());
        }
        hasher.update(&buf[..n]);
        remaining -= n as u64;
    }
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::part::md5_hex;
    use crate::transport::Transport;
    use std::io::Cursor;

    #[tokio::test]
    async fn md5_stream_matches_in_memory_hash() {
        let data: Vec<u8> = (0u8..=255).cycle().take(200_000).collect();
        let mut cursor = Cursor::new(data.clone());
        let digest = md5_stream(&mut cursor, data.len() as u64).await.unwrap();
        assert_eq!(digest, md5_hex(&data));
    }

    #[tokio::test]
    async fn md5_stream_short_stream_is_error() {
        let mut cursor = Cursor::new(vec![1u8; 10]);
        assert!(matches!(
            md5_stream(&mut cursor, 11).await,
            Err(UploadError::Io(_))
        ));
    }

    #[tokio::test]
    async fn describe_part_hashes_the_range() {
        let data = b"0123456789".to_vec();
        let mut cursor = Cursor::new(data);
        let part = describe_part(&mut cursor, 3, 4).await.unwrap();
        assert_eq!(part, PartDescriptor::from_bytes(3, b"3456"));
    }

    #[tokio::test]
    async fn empty_file_is_rejected_before_any_request() {
        let client = UploadClient::new(Transport::new("http://127.0.0.1:1").unwrap());
        let mut cursor = Cursor::new(Vec::new());
        let err = upload_stream(
            &client,
            1,
            &mut cursor,
            0,
            "empty.bin",
            &UploadOptions::default(),
            |_| {},
        )
        .await
        .unwrap_err();
        assert!(matches!(err, UploadError::InvalidArgument(_)));
    }

    #[test]
    fn report_completion() {
        let mut report = UploadReport {
            resource_id: 1,
            session: None,
            parts_total: 1,
            parts_uploaded: 0,
            outcome: UploadOutcome::AlreadyPresent,
        };
        assert!(report.is_complete());
        report.outcome = UploadOutcome::SessionFailed {
            status: 500,
            body: String::new(),
        };
        assert!(!report.is_complete());
    }
}
