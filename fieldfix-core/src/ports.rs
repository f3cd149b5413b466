//! Port traits abstracting all I/O away from the pipeline.

use fieldfix_types::{ChangeSet, Issue, RunEvent};
use thiserror::Error;

/// Failure reported by a ticket store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The request never produced a response (DNS, TLS, timeout, ...).
    #[error("transport error: {message}")]
    Transport { message: String },

    /// The tracker answered with a non-success status.
    #[error("api error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The tracker answered with a body we could not decode.
    #[error("decode error: {message}")]
    Decode { message: String },

    /// The store rejected the call for its own reasons.
    #[error("{message}")]
    Rejected { message: String },
}

/// Remote issue collection.
pub trait TicketStore {
    /// Every issue matching `query`, in the store's order. No page cap.
    fn search(&self, query: &str) -> Result<Vec<Issue>, StoreError>;

    /// Partially update one issue with the given field values.
    fn update(&self, key: &str, changes: &ChangeSet) -> Result<(), StoreError>;
}

/// Sink for everything a run wants to tell the operator.
pub trait Reporter {
    fn report(&self, event: &RunEvent);
}
