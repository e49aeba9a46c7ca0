//! Facade crate for wayfetch, an OpenStreetMap road fetcher.
//!
//! This crate re-exports the core pipeline types and, behind the `data`
//! feature, the Overpass client, result cache and map renderer.

#![forbid(unsafe_code)]

pub use wayfetch_core::{
    BoundingRegion, ExecuteError, OverpassQuery, QueryResult, QueryService, RegionError,
    RegionQueryService, RemoteError, ResilientQueryExecutor, ResolvedResult, ResolvedWay,
    RetryPolicy, RoadClass, WayResolver,
};

#[cfg(feature = "data")]
pub use wayfetch_data::{
    CacheError, OverpassClient, OverpassClientConfig, RenderError, cache, render_map, write_map,
};
