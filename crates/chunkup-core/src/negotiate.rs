//! Session negotiation: `POST B/Files(R)/UploadSessions` with `{}`.

use crate::client::UploadClient;
use crate::error::{ResourceId, UploadError};
use crate::observer::Method;
use crate::session::{parse_error_code, UploadSession};
use crate::transport::{Body, Request, Response};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    Created(UploadSession),
    /// 400: the server refused with an optional machine-readable code
    /// (e.g. quota exceeded, resource locked). `body` is kept verbatim.
    Rejected {
        error_code: Option<String>,
        body: String,
    },
    /// Any other status; `body` is the raw response text.
    ServerError { body: String },
}

/// Result of one session-creation request.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionResult {
    pub status: u32,
    pub located_uri: String,
    pub outcome: SessionOutcome,
}

impl SessionResult {
    pub fn session(&self) -> Option<&UploadSession> {
        match &self.outcome {
            SessionOutcome::Created(session) => Some(session),
            _ => None,
        }
    }

    pub fn into_session(self) -> Option<UploadSession> {
        match self.outcome {
            SessionOutcome::Created(session) => Some(session),
            _ => None,
        }
    }

    pub fn error_code(&self) -> Option<&str> {
        match &self.outcome {
            SessionOutcome::Rejected { error_code, .. } => error_code.as_deref(),
            _ => None,
        }
    }

    /// Raw diagnostic body for rejections and server errors.
    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            SessionOutcome::Rejected { body, .. } | SessionOutcome::ServerError { body } => {
                Some(body)
            }
            SessionOutcome::Created(_) => None,
        }
    }
}

impl UploadClient {
    /// Asks the server to open a new upload session for `resource_id`.
    pub async fn create_session(&self, resource_id: i64) -> Result<SessionResult, UploadError> {
        let id = ResourceId::new(resource_id)?;
        let request = Request {
            method: Method::Post,
            uri: self.transport().sessions_uri(id),
            body: Body::Json(b"{}".to_vec()),
        };
        let response = self.round_trip(id, request).await?;
        let result = classify(id, response)?;
        match &result.outcome {
            SessionOutcome::Created(s) => {
                tracing::info!(resource_id, session_id = %s.session_id, "upload session created")
            }
            SessionOutcome::Rejected { error_code, .. } => {
                tracing::warn!(resource_id, error_code = ?error_code, "session creation rejected")
            }
            SessionOutcome::ServerError { .. } => {
                tracing::warn!(resource_id, status = result.status, "session creation failed")
            }
        }
        Ok(result)
    }
}

fn classify(id: ResourceId, response: Response) -> Result<SessionResult, UploadError> {
    let body = response.body_text();
    let outcome = match response.status {
        200 => {
            let mut session: UploadSession = serde_json::from_str(&body)
                .map_err(|source| UploadError::Decode { body, source })?;
            if session.resource_id == 0 {
                session.resource_id = id.get();
            }
            SessionOutcome::Created(session)
        }
        400 => SessionOutcome::Rejected {
            error_code: parse_error_code(&body),
            body,
        },
        _ => SessionOutcome::ServerError { body },
    };
    Ok(SessionResult {
        status: response.status,
        located_uri: response.located_uri,
        outcome,
    })
}
