//! Upload client: owns the transport and the observer.
//!
//! The protocol operations live next to their result types:
//! `probe` (probe.rs), `create_session` (negotiate.rs) and `upload_part`
//! (transmit.rs). Each one validates its arguments, then performs exactly
//! one request through [`UploadClient::round_trip`].

use crate::config::ChunkupConfig;
use crate::error::{ResourceId, UploadError};
use crate::observer::{NavigatedEvent, NavigatingEvent, TracingObserver, UploadObserver};
use crate::transport::{Request, Response, Transport};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Client for the resumable chunked-upload service.
///
/// Cheap to clone; clones share the transport settings, the abort token and
/// the observer. Uploads for different resources may run concurrently.
#[derive(Clone)]
pub struct UploadClient {
    transport: Transport,
    observer: Arc<dyn UploadObserver>,
}

impl UploadClient {
    /// Client with the tracing observer.
    pub fn new(transport: Transport) -> Self {
        Self {
            transport,
            observer: Arc::new(TracingObserver),
        }
    }

    pub fn from_config(cfg: &ChunkupConfig) -> Result<Self, UploadError> {
        Ok(Self::new(Transport::from_config(cfg)?))
    }

    /// Replaces the observer notified around every request.
    pub fn with_observer(mut self, observer: Arc<dyn UploadObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Setting this token to true cancels in-flight and future requests.
    ///
    /// The token stays set for this client and all its clones until
    /// [`UploadClient::reset_abort`] is called.
    pub fn abort_token(&self) -> Arc<AtomicBool> {
        self.transport.abort_token()
    }

    /// Clears the abort token so later requests go out again.
    pub fn reset_abort(&self) {
        self.transport.reset_abort();
    }

    /// Sends one request, notifying the observer before and after.
    ///
    /// "navigated" fires only when a response was obtained.
    pub(crate) async fn round_trip(
        &self,
        resource_id: ResourceId,
        request: Request,
    ) -> Result<Response, UploadError> {
        let method = request.method;
        let uri = request.uri.clone();
        self.observer.navigating(&NavigatingEvent {
            resource_id: resource_id.get(),
            uri: uri.clone(),
            method,
        });

        let response = self.transport.execute(request).await?;

        self.observer.navigated(&NavigatedEvent {
            resource_id: resource_id.get(),
            uri,
            method,
            status: response.status,
        });
        Ok(response)
    }
}

impl std::fmt::Debug for UploadClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadClient")
            .field("base_url", &self.transport.base_url())
            .finish_non_exhaustive()
    }
}
