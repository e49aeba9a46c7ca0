//! Axis-aligned query regions.
//!
//! A [`BoundingRegion`] scopes every Overpass statement. Its textual form is
//! part of the wire contract: Overpass expects `(south,west,north,east)`.

use std::fmt;

use geo::{Coord, Polygon, Rect};
use thiserror::Error;

/// Errors returned by [`BoundingRegion::new`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegionError {
    /// A bound was NaN or infinite.
    #[error("{bound} bound must be finite, got {value}")]
    NonFinite {
        /// Name of the offending bound.
        bound: &'static str,
        /// Value supplied by the caller.
        value: f64,
    },
    /// A longitude fell outside `[-180, 180]` or a latitude outside `[-90, 90]`.
    #[error("{bound} bound {value} is outside the valid range")]
    OutOfRange {
        /// Name of the offending bound.
        bound: &'static str,
        /// Value supplied by the caller.
        value: f64,
    },
    /// `west` was not strictly less than `east`.
    #[error("west bound {west} must be less than east bound {east}")]
    InvertedLongitude {
        /// Western longitude.
        west: f64,
        /// Eastern longitude.
        east: f64,
    },
    /// `south` was not strictly less than `north`.
    #[error("south bound {south} must be less than north bound {north}")]
    InvertedLatitude {
        /// Southern latitude.
        south: f64,
        /// Northern latitude.
        north: f64,
    },
}

/// A longitude/latitude rectangle used to scope a remote query.
///
/// # Examples
///
/// ```
/// use wayfetch_core::BoundingRegion;
///
/// # fn main() -> Result<(), wayfetch_core::RegionError> {
/// let region = BoundingRegion::new(19.98687, 19.9903, 50.0885, 50.0904)?;
/// assert_eq!(region.to_string(), "(50.0885,19.98687,50.0904,19.9903)");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingRegion {
    west: f64,
    east: f64,
    south: f64,
    north: f64,
}

impl BoundingRegion {
    /// Validates and constructs a [`BoundingRegion`].
    pub fn new(west: f64, east: f64, south: f64, north: f64) -> Result<Self, RegionError> {
        for (bound, value, limit) in [
            ("west", west, 180.0),
            ("east", east, 180.0),
            ("south", south, 90.0),
            ("north", north, 90.0),
        ] {
            if !value.is_finite() {
                return Err(RegionError::NonFinite { bound, value });
            }
            if !(-limit..=limit).contains(&value) {
                return Err(RegionError::OutOfRange { bound, value });
            }
        }
        if west >= east {
            return Err(RegionError::InvertedLongitude { west, east });
        }
        if south >= north {
            return Err(RegionError::InvertedLatitude { south, north });
        }
        Ok(Self {
            west,
            east,
            south,
            north,
        })
    }

    /// Western longitude.
    #[must_use]
    pub const fn west(&self) -> f64 {
        self.west
    }

    /// Eastern longitude.
    #[must_use]
    pub const fn east(&self) -> f64 {
        self.east
    }

    /// Southern latitude.
    #[must_use]
    pub const fn south(&self) -> f64 {
        self.south
    }

    /// Northern latitude.
    #[must_use]
    pub const fn north(&self) -> f64 {
        self.north
    }

    /// Midpoint of the region with `x = longitude`, `y = latitude`.
    #[must_use]
    pub fn center(&self) -> Coord<f64> {
        self.to_rect().center()
    }

    /// The region as a `geo` rectangle.
    #[must_use]
    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(
            Coord {
                x: self.west,
                y: self.south,
            },
            Coord {
                x: self.east,
                y: self.north,
            },
        )
    }

    /// Closed outline of the region, used when drawing it on a map.
    #[must_use]
    pub fn outline(&self) -> Polygon<f64> {
        self.to_rect().to_polygon()
    }
}

impl fmt::Display for BoundingRegion {
    /// Renders the Overpass bbox filter `(south,west,north,east)`.
    ///
    /// `f64`'s `Display` emits the shortest string that parses back to the
    /// same value, so the rendering is lossless.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({},{},{},{})",
            self.south, self.west, self.north, self.east
        )
    }
}
