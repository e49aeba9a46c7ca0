//! Access to the remote map-data query service.
//!
//! The [`QueryService`] trait abstracts submission of a single Overpass QL
//! query. Implementations report the service's failure modes through
//! [`RemoteError`]; the two transient conditions (rate limiting and gateway
//! timeouts) are classified by [`RemoteError::retry_kind`] so the executor
//! can absorb them.

mod error;
mod service;

pub use error::{RemoteError, RetryKind};
pub use service::QueryService;
