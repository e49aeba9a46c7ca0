//! Interactive HTML map of a resolved result.
//!
//! The document loads Leaflet from a CDN and draws a single GeoJSON
//! `FeatureCollection` embedded in the page:
//!
//! - the region outline as a red polygon,
//! - one `LineString` per way with at least two nodes,
//! - one `Point` per node, drawn as a radius-1 red circle marker.

use std::{
    fs,
    path::{Path, PathBuf},
};

use geo::CoordsIter;
use log::debug;
use serde_json::{Value, json};
use thiserror::Error;
use wayfetch_core::{BoundingRegion, Node, ResolvedResult, ResolvedWay};

/// Initial zoom level of the rendered map.
pub const DEFAULT_ZOOM: u8 = 15;

const TEMPLATE: &str = r##"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>wayfetch map</title>
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<style>html, body, #map { height: 100%; margin: 0; }</style>
</head>
<body>
<div id="map"></div>
<script>
const map = L.map("map").setView([@LAT@, @LON@], @ZOOM@);
L.tileLayer("https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}{r}.png", {
  attribution: "&copy; OpenStreetMap contributors &copy; CARTO",
  subdomains: "abcd",
  maxZoom: 20
}).addTo(map);
const features = @GEOJSON@;
L.geoJSON(features, {
  style: (feature) => feature.properties.kind === "region"
    ? { color: "red", fill: false }
    : { color: "#3388ff", weight: 3 },
  pointToLayer: (feature, latlng) => L.circleMarker(latlng, {
    radius: 1, color: "red", fill: true, fillColor: "red", fillOpacity: 1
  })
}).addTo(map);
</script>
</body>
</html>
"##;

/// Error emitted when writing a map document.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The document could not be written.
    #[error("failed to write map to {path}: {source}")]
    Io {
        /// Destination file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

fn position(node: &Node) -> Value {
    json!([node.lon(), node.lat()])
}

fn region_feature(region: BoundingRegion) -> Value {
    let ring: Vec<Value> = region
        .outline()
        .exterior_coords_iter()
        .map(|coord| json!([coord.x, coord.y]))
        .collect();
    json!({
        "type": "Feature",
        "properties": { "kind": "region" },
        "geometry": { "type": "Polygon", "coordinates": [ring] },
    })
}

fn way_feature(way: &ResolvedWay) -> Option<Value> {
    if way.nodes.len() < 2 {
        return None;
    }
    let line: Vec<Value> = way.nodes.iter().map(position).collect();
    Some(json!({
        "type": "Feature",
        "properties": { "kind": "way", "id": way.id, "tags": way.tags },
        "geometry": { "type": "LineString", "coordinates": line },
    }))
}

fn node_feature(node: &Node) -> Value {
    json!({
        "type": "Feature",
        "properties": { "kind": "node", "id": node.id },
        "geometry": { "type": "Point", "coordinates": position(node) },
    })
}

/// GeoJSON `FeatureCollection` of the region, ways and nodes.
#[must_use]
pub fn feature_collection(region: BoundingRegion, result: &ResolvedResult) -> Value {
    let features: Vec<Value> = std::iter::once(region_feature(region))
        .chain(result.ways.iter().filter_map(way_feature))
        .chain(result.nodes().map(node_feature))
        .collect();
    json!({ "type": "FeatureCollection", "features": features })
}

/// Render `result` over `region` as a standalone HTML document.
#[must_use]
pub fn render_map(region: BoundingRegion, result: &ResolvedResult) -> String {
    let centre = region.center();
    // Keep tag values such as "</script>" from closing the inline script.
    let geojson = feature_collection(region, result)
        .to_string()
        .replace("</", "<\\/");
    TEMPLATE
        .replace("@LAT@", &centre.y.to_string())
        .replace("@LON@", &centre.x.to_string())
        .replace("@ZOOM@", &DEFAULT_ZOOM.to_string())
        .replace("@GEOJSON@", &geojson)
}

/// Render `result` and write the document to `path`.
///
/// # Errors
///
/// Returns [`RenderError::Io`] when the file cannot be written.
pub fn write_map(
    path: &Path,
    region: BoundingRegion,
    result: &ResolvedResult,
) -> Result<(), RenderError> {
    let document = render_map(region, result);
    fs::write(path, document).map_err(|source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("wrote map with {} ways to {}", result.ways.len(), path.display());
    Ok(())
}
