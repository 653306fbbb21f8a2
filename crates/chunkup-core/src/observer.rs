//! Request observers: "navigating" before each request, "navigated" after.
//!
//! Observers are called synchronously on the task that issued the request.
//! They cannot influence control flow or results.

use std::fmt;

/// HTTP method used by a protocol operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Head,
    Post,
    Put,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fired immediately before a request is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigatingEvent {
    pub resource_id: i64,
    pub uri: String,
    pub method: Method,
}

/// Fired once a response has been obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigatedEvent {
    pub resource_id: i64,
    pub uri: String,
    pub method: Method,
    pub status: u32,
}

/// Instrumentation hooks around every protocol request.
pub trait UploadObserver: Send + Sync {
    fn navigating(&self, _event: &NavigatingEvent) {}
    fn navigated(&self, _event: &NavigatedEvent) {}
}

/// Default observer: logs each request through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl UploadObserver for TracingObserver {
    fn navigating(&self, event: &NavigatingEvent) {
        tracing::debug!(
            resource_id = event.resource_id,
            method = %event.method,
            uri = %event.uri,
            "navigating"
        );
    }

    fn navigated(&self, event: &NavigatedEvent) {
        tracing::debug!(
            resource_id = event.resource_id,
            method = %event.method,
            uri = %event.uri,
            status = event.status,
            "navigated"
        );
    }
}
