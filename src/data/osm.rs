//! Overpass JSON payload model and conversion into domain geometry.
//!
//! Payloads are the raw `[out:json]` responses of `out geom;` queries —
//! the same bytes the cache stores — so conversion has to tolerate partial
//! or odd elements and simply skip what it cannot use.

use geo_types::{Coord, LineString, Polygon};
use serde::Deserialize;

use crate::core::geo::LatLng;
use crate::data::features::{RoadClass, StreetEdge, StreetGraph};
use crate::prelude::HashMap;

#[derive(Debug, Deserialize)]
pub struct OverpassResponse {
    #[serde(default)]
    pub elements: Vec<Element>,
}

/// One Overpass element. `out geom;` inlines way geometry; relations carry
/// their geometry on the members instead.
#[derive(Debug, Deserialize)]
pub struct Element {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub tags: HashMap<String, String>,
    #[serde(default)]
    pub geometry: Vec<GeomPoint>,
    #[serde(default)]
    pub members: Vec<Member>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct GeomPoint {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Deserialize)]
pub struct Member {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub geometry: Vec<GeomPoint>,
}

fn to_path(geometry: &[GeomPoint]) -> Vec<LatLng> {
    geometry.iter().map(|g| LatLng::new(g.lat, g.lon)).collect()
}

fn path_length_m(path: &[LatLng]) -> f64 {
    path.windows(2).map(|w| w[0].distance_to(&w[1])).sum()
}

/// Builds the street graph from a highway-way payload.
pub fn parse_street_graph(payload: &[u8]) -> Result<StreetGraph, serde_json::Error> {
    let response: OverpassResponse = serde_json::from_slice(payload)?;

    let mut graph = StreetGraph::default();
    for element in &response.elements {
        if element.kind != "way" || element.geometry.len() < 2 {
            continue;
        }
        let Some(highway) = element.tags.get("highway") else {
            continue;
        };
        let path = to_path(&element.geometry);
        graph.nodes.push(path[0]);
        graph.nodes.push(path[path.len() - 1]);
        graph.edges.push(StreetEdge {
            length_m: path_length_m(&path),
            class: RoadClass::from_highway_tag(highway),
            path,
        });
    }

    log::debug!(
        "parsed street graph: {} edges, {:.1} km",
        graph.edges.len(),
        graph.total_length_m() / 1000.0
    );
    Ok(graph)
}

/// Extracts fill polygons from a water/park payload: closed ways plus the
/// outer rings of multipolygon relations. Open rings are force-closed;
/// degenerate fragments (under 3 distinct points) are skipped.
pub fn parse_polygons(payload: &[u8]) -> Result<Vec<Polygon<f64>>, serde_json::Error> {
    let response: OverpassResponse = serde_json::from_slice(payload)?;

    let mut polygons = Vec::new();
    for element in &response.elements {
        match element.kind.as_str() {
            "way" => push_ring(&mut polygons, &element.geometry),
            "relation" => {
                for member in &element.members {
                    if member.role == "outer" {
                        push_ring(&mut polygons, &member.geometry);
                    }
                }
            }
            _ => {}
        }
    }
    Ok(polygons)
}

fn push_ring(polygons: &mut Vec<Polygon<f64>>, geometry: &[GeomPoint]) {
    if geometry.len() < 3 {
        return;
    }
    let mut coords: Vec<Coord<f64>> = geometry
        .iter()
        .map(|g| Coord { x: g.lon, y: g.lat })
        .collect();
    if coords.first() != coords.last() {
        coords.push(coords[0]);
    }
    polygons.push(Polygon::new(LineString::from(coords), vec![]));
}
