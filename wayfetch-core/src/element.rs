//! OpenStreetMap elements returned by the query service.
//!
//! A [`QueryResult`] is what the service hands back: ways reference nodes by
//! id, and the node table holds whatever nodes the response happened to
//! include. [`ResolvedResult`] is the same data after every way has been
//! paired with concrete node coordinates; only
//! [`WayResolver`](crate::WayResolver) produces it.

use std::collections::BTreeMap;

use geo::Coord;
use serde::{Deserialize, Serialize};

/// OpenStreetMap element identifier.
pub type OsmId = u64;

/// Free-form OpenStreetMap key/value tags, ordered for stable comparison.
pub type Tags = BTreeMap<String, String>;

/// A single geographic point.
///
/// Coordinates are WGS84 with `x = longitude` and `y = latitude`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Element identifier.
    pub id: OsmId,
    /// Geospatial position.
    pub location: Coord<f64>,
    /// OpenStreetMap tags.
    pub tags: Tags,
}

impl Node {
    /// Construct a node from longitude and latitude.
    #[must_use]
    pub fn new(id: OsmId, lon: f64, lat: f64, tags: Tags) -> Self {
        Self {
            id,
            location: Coord { x: lon, y: lat },
            tags,
        }
    }

    /// Construct an untagged node.
    #[must_use]
    pub fn untagged(id: OsmId, lon: f64, lat: f64) -> Self {
        Self::new(id, lon, lat, Tags::new())
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn lon(&self) -> f64 {
        self.location.x
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn lat(&self) -> f64 {
        self.location.y
    }
}

/// An ordered path through referenced nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Way {
    /// Element identifier.
    pub id: OsmId,
    /// Node references in path order. Ids may repeat (closed ways).
    pub node_ids: Vec<OsmId>,
    /// OpenStreetMap tags.
    pub tags: Tags,
}

/// Kind of element a relation member points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberKind {
    /// A node member.
    Node,
    /// A way member.
    Way,
    /// A nested relation.
    Relation,
}

/// One entry in a relation's member list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Kind of the referenced element.
    pub kind: MemberKind,
    /// Identifier of the referenced element.
    pub reference: OsmId,
    /// Role of the member inside the relation, often empty.
    pub role: String,
}

/// A grouping of elements, such as a signed cycle route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    /// Element identifier.
    pub id: OsmId,
    /// Members in declaration order.
    pub members: Vec<Member>,
    /// OpenStreetMap tags.
    pub tags: Tags,
}

/// Unresolved response from the query service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Ways in response order.
    pub ways: Vec<Way>,
    /// Relations in response order.
    pub relations: Vec<Relation>,
    /// Nodes carried by the response, keyed by id.
    pub nodes: BTreeMap<OsmId, Node>,
}

impl QueryResult {
    /// Add nodes to the node table, replacing entries with the same id.
    pub fn insert_nodes<I>(&mut self, nodes: I)
    where
        I: IntoIterator<Item = Node>,
    {
        self.nodes
            .extend(nodes.into_iter().map(|node| (node.id, node)));
    }

    /// Node ids referenced by `way` that have no entry in the node table.
    ///
    /// Each id appears once, in first-reference order.
    #[must_use]
    pub fn missing_node_ids(&self, way: &Way) -> Vec<OsmId> {
        let mut missing: Vec<OsmId> = Vec::new();
        for id in &way.node_ids {
            if !self.nodes.contains_key(id) && !missing.contains(id) {
                missing.push(*id);
            }
        }
        missing
    }

    /// Whether every way has all of its nodes in the node table.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.ways
            .iter()
            .all(|way| way.node_ids.iter().all(|id| self.nodes.contains_key(id)))
    }
}

/// A way paired with the coordinates of every node it references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedWay {
    /// Element identifier.
    pub id: OsmId,
    /// Nodes in path order, duplicates preserved.
    pub nodes: Vec<Node>,
    /// OpenStreetMap tags.
    pub tags: Tags,
}

/// Fully resolved query output, ready to cache or render.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedResult {
    /// Ways in the order the service returned them.
    pub ways: Vec<ResolvedWay>,
    /// Relations in the order the service returned them.
    pub relations: Vec<Relation>,
}

impl ResolvedResult {
    /// Number of nodes in each way, in way order.
    #[must_use]
    pub fn node_counts(&self) -> Vec<usize> {
        self.ways.iter().map(|way| way.nodes.len()).collect()
    }

    /// Iterate every node of every way, in way order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.ways.iter().flat_map(|way| way.nodes.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn partial_result() -> QueryResult {
        let mut result = QueryResult {
            ways: vec![Way {
                id: 10,
                node_ids: vec![1, 2, 3, 2],
                tags: Tags::new(),
            }],
            ..QueryResult::default()
        };
        result.insert_nodes([Node::untagged(1, 19.98, 50.08)]);
        result
    }

    #[rstest]
    fn missing_node_ids_are_unique_and_ordered(partial_result: QueryResult) {
        let way = partial_result.ways.first().expect("one way").clone();
        assert_eq!(partial_result.missing_node_ids(&way), vec![2, 3]);
        assert!(!partial_result.is_resolved());
    }

    #[rstest]
    fn inserting_nodes_completes_resolution(mut partial_result: QueryResult) {
        partial_result.insert_nodes([Node::untagged(2, 19.99, 50.09), Node::untagged(3, 20.0, 50.1)]);
        assert!(partial_result.is_resolved());
    }

    #[rstest]
    fn node_accessors_follow_lon_lat_convention() {
        let node = Node::untagged(7, 19.5, 50.25);
        assert_eq!(node.lon(), 19.5);
        assert_eq!(node.lat(), 50.25);
    }
}
