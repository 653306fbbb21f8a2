pub mod config;
pub mod logging;

pub mod client;
pub mod content_disposition;
pub mod error;
pub mod negotiate;
pub mod observer;
pub mod orchestrate;
pub mod part;
pub mod probe;
pub mod retry;
pub mod session;
pub mod transmit;
pub mod transport;

pub use client::UploadClient;
pub use error::{ResourceId, UploadError};
pub use negotiate::{SessionOutcome, SessionResult};
pub use observer::{NavigatedEvent, NavigatingEvent, TracingObserver, UploadObserver};
pub use part::PartDescriptor;
pub use probe::{ProbeOutcome, ProbeResult, RemoteFile};
pub use session::UploadSession;
pub use transmit::{PartOutcome, PartUploadResult};
