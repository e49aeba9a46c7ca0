//! Adapters for the wayfetch pipeline.
//!
//! Responsibilities:
//! - Talk to the Overpass API over HTTP and decode its JSON output.
//! - Persist resolved results in a versioned cache file.
//! - Render resolved results as an interactive HTML map.
//!
//! Boundaries:
//! - Do not encode query or retry rules (live in `wayfetch-core`).
//! - Expose a blocking API; async HTTP stays behind the client.

#![forbid(unsafe_code)]

pub mod cache;
pub mod overpass;
pub mod render;

pub use cache::{CACHE_MAGIC, CACHE_VERSION, CacheError};
pub use overpass::{
    ClientBuildError, DEFAULT_ENDPOINT, OverpassClient, OverpassClientConfig, decode_response,
};
pub use render::{RenderError, render_map, write_map};
