//! Second fetch stage: attach node coordinates to every way.

use log::debug;

use crate::{
    ExecuteError, OverpassQuery, QueryResult, QueryService, ResilientQueryExecutor, ResolvedResult,
    ResolvedWay, RetryBudget, Sleeper,
};

/// Resolves the node references of each way in a [`QueryResult`].
///
/// Ways are visited in response order. For each way, node ids missing from
/// the result's node table are fetched in a single request, retried through
/// the executor's policy. The retry cap applies to each way separately while
/// a policy deadline covers the whole resolution. A fatal error on any way
/// aborts resolution; ways after it are not fetched.
#[derive(Debug)]
pub struct WayResolver<'a, S, Z> {
    executor: &'a ResilientQueryExecutor<S, Z>,
}

impl<'a, S: QueryService, Z: Sleeper> WayResolver<'a, S, Z> {
    /// Create a resolver issuing its lookups through `executor`.
    #[must_use]
    pub const fn new(executor: &'a ResilientQueryExecutor<S, Z>) -> Self {
        Self { executor }
    }

    /// Consume `result` and return it with every way fully resolved.
    pub fn resolve(&self, result: QueryResult) -> Result<ResolvedResult, ExecuteError> {
        self.resolve_within(result, &mut RetryBudget::start())
    }

    /// As [`Self::resolve`], charging every lookup to a shared `budget`.
    pub fn resolve_within(
        &self,
        mut result: QueryResult,
        budget: &mut RetryBudget,
    ) -> Result<ResolvedResult, ExecuteError> {
        let ways = std::mem::take(&mut result.ways);
        let mut resolved = Vec::with_capacity(ways.len());

        for way in ways {
            let missing = result.missing_node_ids(&way);
            if !missing.is_empty() {
                debug!("way {}: fetching {} missing nodes", way.id, missing.len());
                let query = OverpassQuery::nodes_by_id(&missing).to_string();
                let label = format!("way {}", way.id);
                let fetched = self
                    .executor
                    .run_within(&label, budget, || self.executor.service().query(&query))?;
                result.insert_nodes(fetched.nodes.into_values());
            }

            let nodes = way
                .node_ids
                .iter()
                .map(|id| {
                    result
                        .nodes
                        .get(id)
                        .cloned()
                        .ok_or(ExecuteError::UnresolvedNode {
                            way: way.id,
                            node: *id,
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;

            resolved.push(ResolvedWay {
                id: way.id,
                nodes,
                tags: way.tags,
            });
        }

        Ok(ResolvedResult {
            ways: resolved,
            relations: result.relations,
        })
    }
}
