//! Map HTTP statuses and upload errors onto retry kinds.

use super::policy::ErrorKind;
use crate::error::UploadError;

/// Classifies a non-success HTTP status.
pub fn classify_status(status: u32) -> ErrorKind {
    match status {
        429 | 503 => ErrorKind::Throttled,
        500..=599 => ErrorKind::Http5xx(status as u16),
        _ => ErrorKind::Other,
    }
}

/// Classifies an error returned by a protocol operation.
///
/// Only transport failures can be transient; argument, stream, decode and
/// cancellation errors are final.
pub fn classify_error(err: &UploadError) -> ErrorKind {
    let UploadError::Transport(e) = err else {
        return ErrorKind::Other;
    };
    if e.is_operation_timedout() {
        return ErrorKind::Timeout;
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
    {
        return ErrorKind::Connection;
    }
    ErrorKind::Other
}
