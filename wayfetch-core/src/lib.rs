//! Core domain types and the fetch pipeline for wayfetch.
//!
//! Responsibilities:
//! - Model regions, OpenStreetMap elements and query results.
//! - Build Overpass QL queries from typed road classes.
//! - Execute queries with retry and backoff, then resolve way geometry.
//!
//! Boundaries:
//! - No HTTP, filesystem or rendering code; adapters live in
//!   `wayfetch-data`.
//! - Everything runs sequentially on the calling thread.

#![forbid(unsafe_code)]

mod element;
mod executor;
mod query;
mod region;
pub mod remote;
mod resolver;
mod retry;
mod service;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use element::{
    Member, MemberKind, Node, OsmId, QueryResult, Relation, ResolvedResult, ResolvedWay, Tags, Way,
};
pub use executor::{ExecuteError, ResilientQueryExecutor, RetryBudget};
pub use query::{
    CAR_HIGHWAYS, ElementKind, OverpassQuery, ParseRoadClassError, RoadClass, Scope, Statement,
    TagFilter,
};
pub use region::{BoundingRegion, RegionError};
pub use remote::{QueryService, RemoteError, RetryKind};
pub use resolver::WayResolver;
pub use retry::{
    DEFAULT_GATEWAY_TIMEOUT_DELAY, DEFAULT_MAX_DELAY, DEFAULT_MAX_RETRIES,
    DEFAULT_RATE_LIMIT_DELAY, RetryPolicy, Sleeper, ThreadSleeper,
};
pub use service::RegionQueryService;
