//! Overpass API JSON response types.
//!
//! Queries issued with `[out:json]` and `out body` return a flat `elements`
//! array mixing nodes, ways and relations. Ways carry node ids only; nodes
//! appear in the array when the query selected them.
//!
//! See: <https://dev.overpass-api.de/output_formats.html#json>

use serde::Deserialize;
use wayfetch_core::{
    Member, MemberKind, Node, QueryResult, Relation, RemoteError, Tags, Way,
};

/// Prefix of a `remark` reporting that the server aborted the query.
const RUNTIME_ERROR_PREFIX: &str = "runtime error";

/// Top-level Overpass JSON response.
#[derive(Debug, Deserialize)]
pub struct OverpassResponse {
    /// Elements in server output order.
    #[serde(default)]
    pub elements: Vec<Element>,
    /// Free-text diagnostic added by the server, e.g. on query timeout.
    pub remark: Option<String>,
}

/// One entry of the `elements` array.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Element {
    /// A node with coordinates.
    Node {
        /// Element identifier.
        id: u64,
        /// Latitude in degrees.
        lat: f64,
        /// Longitude in degrees.
        lon: f64,
        /// Tags, absent when the node is untagged.
        #[serde(default)]
        tags: Tags,
    },
    /// A way referencing nodes by id.
    Way {
        /// Element identifier.
        id: u64,
        /// Node ids in path order.
        #[serde(default)]
        nodes: Vec<u64>,
        /// Tags, absent when the way is untagged.
        #[serde(default)]
        tags: Tags,
    },
    /// A relation listing its members.
    Relation {
        /// Element identifier.
        id: u64,
        /// Members in declaration order.
        #[serde(default)]
        members: Vec<WireMember>,
        /// Tags, absent when the relation is untagged.
        #[serde(default)]
        tags: Tags,
    },
    /// Any element type the pipeline does not use (areas, counts, ...).
    #[serde(other)]
    Other,
}

/// Relation member as encoded on the wire.
#[derive(Debug, Deserialize)]
pub struct WireMember {
    /// `node`, `way` or `relation`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Referenced element id.
    #[serde(rename = "ref")]
    pub reference: u64,
    /// Member role, often empty.
    #[serde(default)]
    pub role: String,
}

impl WireMember {
    fn into_member(self) -> Option<Member> {
        let kind = match self.kind.as_str() {
            "node" => MemberKind::Node,
            "way" => MemberKind::Way,
            "relation" => MemberKind::Relation,
            _ => return None,
        };
        Some(Member {
            kind,
            reference: self.reference,
            role: self.role,
        })
    }
}

impl OverpassResponse {
    /// Whether the server reported aborting the query.
    #[must_use]
    pub fn runtime_error(&self) -> Option<&str> {
        self.remark
            .as_deref()
            .filter(|remark| remark.trim_start().starts_with(RUNTIME_ERROR_PREFIX))
    }

    /// Convert the response into the domain aggregate.
    pub fn into_query_result(self) -> Result<QueryResult, RemoteError> {
        if let Some(remark) = self.runtime_error() {
            return Err(RemoteError::Runtime {
                remark: remark.to_owned(),
            });
        }

        let mut result = QueryResult::default();
        for element in self.elements {
            match element {
                Element::Node { id, lat, lon, tags } => {
                    result.insert_nodes([Node::new(id, lon, lat, tags)]);
                }
                Element::Way { id, nodes, tags } => result.ways.push(Way {
                    id,
                    node_ids: nodes,
                    tags,
                }),
                Element::Relation { id, members, tags } => result.relations.push(Relation {
                    id,
                    members: members
                        .into_iter()
                        .filter_map(WireMember::into_member)
                        .collect(),
                    tags,
                }),
                Element::Other => {}
            }
        }
        Ok(result)
    }
}

/// Decode a raw response body.
pub fn decode_response(body: &str) -> Result<QueryResult, RemoteError> {
    let response: OverpassResponse =
        serde_json::from_str(body).map_err(|err| RemoteError::Parse {
            message: err.to_string(),
        })?;
    response.into_query_result()
}
