//! Typed Overpass QL builder.
//!
//! Queries are assembled from [`Statement`] values rather than spliced
//! strings, so region bounds and tag values are always rendered in a known
//! shape. Only the subset of Overpass QL the fetch pipeline needs is
//! modelled: tag-equality filters scoped either to a bounding region or to
//! an explicit id list, unioned, and printed with `out body`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{BoundingRegion, OsmId};

/// Coarse category of road infrastructure selecting the query template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoadClass {
    /// Cycle routes, cycleways and designated cycle paths.
    Bicycle,
    /// General roads open to cars.
    Car,
}

/// `highway` values treated as car-accessible roads.
pub const CAR_HIGHWAYS: [&str; 5] = [
    "primary",
    "secondary",
    "tertiary",
    "unclassified",
    "residential",
];

impl RoadClass {
    /// Statements selecting this road class inside `region`.
    #[must_use]
    pub fn statements(self, region: BoundingRegion) -> Vec<Statement> {
        match self {
            Self::Bicycle => vec![
                Statement::relation(region).tag("route", "bicycle"),
                Statement::way(region).tag("highway", "cycleway"),
                Statement::way(region)
                    .tag("highway", "path")
                    .tag("bicycle", "designated"),
            ],
            Self::Car => CAR_HIGHWAYS
                .into_iter()
                .map(|value| Statement::way(region).tag("highway", value))
                .collect(),
        }
    }

    /// Lowercase name used on the command line and in configuration files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bicycle => "bicycle",
            Self::Car => "car",
        }
    }
}

impl fmt::Display for RoadClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown road class name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown road class {0:?}; expected \"bicycle\" or \"car\"")]
pub struct ParseRoadClassError(pub String);

impl FromStr for RoadClass {
    type Err = ParseRoadClassError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bicycle" | "bike" => Ok(Self::Bicycle),
            "car" => Ok(Self::Car),
            _ => Err(ParseRoadClassError(s.to_owned())),
        }
    }
}

/// Element type a statement selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// `node`
    Node,
    /// `way`
    Way,
    /// `relation`
    Relation,
}

impl ElementKind {
    const fn keyword(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Way => "way",
            Self::Relation => "relation",
        }
    }
}

/// Tag equality filter, rendered as `["key"="value"]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagFilter {
    /// Tag key.
    pub key: String,
    /// Required tag value.
    pub value: String,
}

/// Spatial or identity scope of a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Scope {
    /// Elements intersecting a bounding region.
    Region(BoundingRegion),
    /// Elements with the listed ids.
    Ids(Vec<OsmId>),
}

/// A single selection statement inside the query union.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    kind: ElementKind,
    filters: Vec<TagFilter>,
    scope: Scope,
}

impl Statement {
    /// Select ways inside `region`.
    #[must_use]
    pub const fn way(region: BoundingRegion) -> Self {
        Self::new(ElementKind::Way, Scope::Region(region))
    }

    /// Select relations inside `region`.
    #[must_use]
    pub const fn relation(region: BoundingRegion) -> Self {
        Self::new(ElementKind::Relation, Scope::Region(region))
    }

    /// Select nodes by id.
    #[must_use]
    pub fn nodes_by_id(ids: &[OsmId]) -> Self {
        Self::new(ElementKind::Node, Scope::Ids(ids.to_vec()))
    }

    const fn new(kind: ElementKind, scope: Scope) -> Self {
        Self {
            kind,
            filters: Vec::new(),
            scope,
        }
    }

    /// Require `key=value` on selected elements.
    #[must_use]
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push(TagFilter {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    /// Element type this statement selects.
    #[must_use]
    pub const fn kind(&self) -> ElementKind {
        self.kind
    }

    /// Tag filters in declaration order.
    #[must_use]
    pub fn filters(&self) -> &[TagFilter] {
        &self.filters
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.keyword())?;
        for filter in &self.filters {
            write!(
                f,
                "[{}={}]",
                QuotedString(&filter.key),
                QuotedString(&filter.value)
            )?;
        }
        match &self.scope {
            Scope::Region(region) => write!(f, "{region}"),
            Scope::Ids(ids) => {
                f.write_str("(id:")?;
                for (index, id) in ids.iter().enumerate() {
                    if index > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{id}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Overpass string literal with `"` and `\` escaped.
struct QuotedString<'a>(&'a str);

impl fmt::Display for QuotedString<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("\"")?;
        for ch in self.0.chars() {
            match ch {
                '"' => f.write_str("\\\"")?,
                '\\' => f.write_str("\\\\")?,
                '\n' => f.write_str("\\n")?,
                other => write!(f, "{other}")?,
            }
        }
        f.write_str("\"")
    }
}

/// A complete query: JSON output, a union of statements, `out body`.
///
/// # Examples
///
/// ```
/// use wayfetch_core::{BoundingRegion, OverpassQuery, RoadClass};
///
/// # fn main() -> Result<(), wayfetch_core::RegionError> {
/// let region = BoundingRegion::new(0.0, 1.0, 2.0, 3.0)?;
/// let query = OverpassQuery::for_road_class(region, RoadClass::Bicycle);
/// assert!(query.to_string().starts_with("[out:json];(relation[\"route\"=\"bicycle\"](2,0,3,1);"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverpassQuery {
    statements: Vec<Statement>,
}

impl OverpassQuery {
    /// Create an empty query.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            statements: Vec::new(),
        }
    }

    /// Append a statement to the union.
    #[must_use]
    pub fn with(mut self, statement: Statement) -> Self {
        self.statements.push(statement);
        self
    }

    /// Query selecting `road_class` inside `region`.
    #[must_use]
    pub fn for_road_class(region: BoundingRegion, road_class: RoadClass) -> Self {
        road_class
            .statements(region)
            .into_iter()
            .fold(Self::new(), Self::with)
    }

    /// Query fetching the listed nodes.
    #[must_use]
    pub fn nodes_by_id(ids: &[OsmId]) -> Self {
        Self::new().with(Statement::nodes_by_id(ids))
    }

    /// Statements in union order.
    #[must_use]
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }
}

impl fmt::Display for OverpassQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[out:json];(")?;
        for statement in &self.statements {
            write!(f, "{statement};")?;
        }
        f.write_str(");out body;")
    }
}
