//! Overpass API adapter.
//!
//! [`OverpassClient`] implements [`wayfetch_core::QueryService`] over HTTP;
//! [`wire`] decodes the JSON output format into domain types.

mod client;
pub mod wire;

pub use client::{
    ClientBuildError, DEFAULT_ENDPOINT, DEFAULT_USER_AGENT, OverpassClient, OverpassClientConfig,
};
pub use wire::decode_response;
