//! Region-scoped road fetching.

use log::info;

use crate::{
    BoundingRegion, ExecuteError, OverpassQuery, QueryService, ResilientQueryExecutor,
    ResolvedResult, RetryBudget, RoadClass, Sleeper, WayResolver,
};

/// Fetches fully resolved road geometry for a region and road class.
///
/// This is the only component that knows which tags make up a road class.
/// Retrying is delegated to the wrapped executor. A policy deadline bounds
/// the region query and every node lookup together.
#[derive(Debug)]
pub struct RegionQueryService<S, Z> {
    executor: ResilientQueryExecutor<S, Z>,
}

impl<S: QueryService, Z: Sleeper> RegionQueryService<S, Z> {
    /// Wrap an executor.
    #[must_use]
    pub const fn new(executor: ResilientQueryExecutor<S, Z>) -> Self {
        Self { executor }
    }

    /// Query `road_class` ways inside `region` and resolve their nodes.
    pub fn fetch_ways(
        &self,
        region: BoundingRegion,
        road_class: RoadClass,
    ) -> Result<ResolvedResult, ExecuteError> {
        let query = OverpassQuery::for_road_class(region, road_class);
        info!("fetching {road_class} ways in {region}");
        let mut budget = RetryBudget::start();
        let unresolved = self.executor.execute_within(&query.to_string(), &mut budget)?;
        info!(
            "query returned {} ways, {} relations and {} nodes",
            unresolved.ways.len(),
            unresolved.relations.len(),
            unresolved.nodes.len()
        );
        let resolved = WayResolver::new(&self.executor).resolve_within(unresolved, &mut budget)?;
        info!(
            "resolved {} ways with {} nodes",
            resolved.ways.len(),
            resolved.nodes().count()
        );
        Ok(resolved)
    }
}
