//! Retry and backoff policy for part retransmission.
//!
//! The protocol operations never retry on their own. The orchestrator asks
//! this policy whether a failed part should be sent again and after what
//! delay, using the classification of the failure.

mod classify;
mod policy;

pub use classify::{classify_error, classify_status};
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
