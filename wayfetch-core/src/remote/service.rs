//! Query-service trait.

use crate::QueryResult;

use super::error::RemoteError;

/// Submit Overpass QL queries and return their parsed results.
///
/// Implementations perform exactly one attempt per call; retrying is the
/// caller's concern (see [`crate::ResilientQueryExecutor`]).
///
/// # Examples
///
/// ```rust
/// use wayfetch_core::{Node, QueryResult, QueryService, RemoteError};
///
/// struct SingleNode;
///
/// impl QueryService for SingleNode {
///     fn query(&self, _query: &str) -> Result<QueryResult, RemoteError> {
///         let mut result = QueryResult::default();
///         result.insert_nodes([Node::untagged(1, 19.98, 50.08)]);
///         Ok(result)
///     }
/// }
///
/// let result = SingleNode.query("[out:json];node(id:1);out body;")?;
/// assert_eq!(result.nodes.len(), 1);
/// # Ok::<(), RemoteError>(())
/// ```
pub trait QueryService {
    /// Run `query` once and return the decoded response.
    fn query(&self, query: &str) -> Result<QueryResult, RemoteError>;
}

impl<T: QueryService + ?Sized> QueryService for &T {
    fn query(&self, query: &str) -> Result<QueryResult, RemoteError> {
        (**self).query(query)
    }
}
