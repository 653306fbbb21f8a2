//! Error taxonomy for the upload protocol operations.
//!
//! Only failures that prevent a classified server answer are errors here.
//! "Not found", "rejected with a code" and "server error" are ordinary
//! outcomes carried by each operation's result type.

use std::fmt;

/// Errors returned by probe, session negotiation and part transfer.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// Caller input was malformed; no network request was made.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No response was obtained (connect, DNS, timeout, reset, ...).
    #[error("transport failure: {0}")]
    Transport(#[from] curl::Error),

    /// The client's abort token was set while the request was in flight.
    #[error("request cancelled")]
    Cancelled,

    /// Reading the part bytes from the caller's stream failed.
    #[error("stream: {0}")]
    Io(#[from] std::io::Error),

    /// A success response carried a body that is not a valid upload session.
    #[error("malformed session body: {source}")]
    Decode {
        body: String,
        #[source]
        source: serde_json::Error,
    },

    /// The blocking transfer task panicked or was cancelled by the runtime.
    #[error("transfer task: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl UploadError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        UploadError::InvalidArgument(msg.into())
    }
}

/// A validated server resource identifier (always > 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(i64);

impl ResourceId {
    pub fn new(id: i64) -> Result<Self, UploadError> {
        if id <= 0 {
            return Err(UploadError::invalid(format!(
                "resource id must be positive, got {}",
                id
            )));
        }
        Ok(Self(id))
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for ResourceId {
    type Error = UploadError;

    fn try_from(id: i64) -> Result<Self, Self::Error> {
        Self::new(id)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
