//! Part transfer: one part of a file, sent as a single-field multipart PUT.
//!
//! The part bytes are read from the caller's stream at the part's offset.
//! Parts of one session must be sent one after another over the same stream;
//! the `&mut` borrow keeps two transfers from sharing it.

use crate::client::UploadClient;
use crate::error::{ResourceId, UploadError};
use crate::observer::Method;
use crate::part::PartDescriptor;
use crate::transport::{Body, FilePart, Request, Response};
use std::io::SeekFrom;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt};

/// Multipart field name carrying the part bytes.
const FILE_FIELD: &str = "file";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartOutcome {
    Accepted,
    /// Non-2xx status; `body` is the raw response text.
    Failed { body: String },
}

/// Result of one part transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartUploadResult {
    pub status: u32,
    pub located_uri: String,
    /// Unchanged from the caller's count when the part failed.
    parts_uploaded: u32,
    pub outcome: PartOutcome,
}

impl PartUploadResult {
    pub fn accepted(&self) -> bool {
        self.outcome == PartOutcome::Accepted
    }

    /// Parts uploaded so far, counting this one when it was accepted.
    pub fn parts_uploaded(&self) -> u32 {
        self.parts_uploaded
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            PartOutcome::Failed { body } => Some(body),
            PartOutcome::Accepted => None,
        }
    }
}

impl UploadClient {
    /// Sends `part` of `file_name` for session `session_id`.
    ///
    /// `parts_uploaded_so_far` is the caller's count before this part; an
    /// accepted part returns that count plus one. The stream is left open
    /// and positioned after the part.
    #[allow(clippy::too_many_arguments)]
    pub async fn upload_part<S>(
        &self,
        resource_id: i64,
        session_id: &str,
        stream: &mut S,
        part: &PartDescriptor,
        file_name: &str,
        full_file_size: u64,
        total_parts: u32,
        parts_uploaded_so_far: u32,
    ) -> Result<PartUploadResult, UploadError>
    where
        S: AsyncRead + AsyncSeek + Unpin,
    {
        let id = ResourceId::new(resource_id)?;
        validate(part, full_file_size)?;
        let len = usize::try_from(part.size)
            .map_err(|_| UploadError::invalid("part size does not fit in memory"))?;

        stream.seek(SeekFrom::Start(part.offset)).await?;
        let mut bytes = vec![0u8; len];
        stream.read_exact(&mut bytes).await?;

        let request = Request {
            method: Method::Put,
            uri: self.transport().session_uri(id, session_id)?,
            body: Body::File(FilePart {
                field: FILE_FIELD,
                file_name: file_name.to_string(),
                bytes,
                headers: vec![
                    format!("Content-Range: {}", part.content_range(full_file_size)),
                    format!("Content-MD5: {}", part.content_md5()),
                ],
            }),
        };
        let response = self.round_trip(id, request).await?;
        let result = classify(response, parts_uploaded_so_far);

        if result.accepted() {
            tracing::debug!(
                resource_id,
                offset = part.offset,
                size = part.size,
                parts = result.parts_uploaded(),
                total_parts,
                "part accepted"
            );
        } else {
            tracing::warn!(
                resource_id,
                offset = part.offset,
                status = result.status,
                "part rejected"
            );
        }
        Ok(result)
    }
}

fn validate(part: &PartDescriptor, full_file_size: u64) -> Result<(), UploadError> {
    if part.size == 0 {
        return Err(UploadError::invalid("part size must be positive"));
    }
    if part.end() > full_file_size || part.offset.checked_add(part.size).is_none() {
        return Err(UploadError::invalid(format!(
            "part [{}, {}) exceeds file size {}",
            part.offset,
            part.end(),
            full_file_size
        )));
    }
    Ok(())
}

fn classify(response: Response, parts_uploaded_so_far: u32) -> PartUploadResult {
    let (parts_uploaded, outcome) = if response.is_success() {
        (parts_uploaded_so_far.saturating_add(1), PartOutcome::Accepted)
    } else {
        (
            parts_uploaded_so_far,
            PartOutcome::Failed {
                body: response.body_text(),
            },
        )
    };
    PartUploadResult {
        status: response.status,
        located_uri: response.located_uri,
        parts_uploaded,
        outcome,
    }
}
