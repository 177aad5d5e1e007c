//! Domain geometry: the street graph and the decorative polygon layers.

use geo::BoundingRect;
use geo_types::Polygon;

use crate::core::geo::{LatLng, LatLngBounds};

/// Closed enumeration of road classes driving visual weight. Every OSM
/// highway value folds into one of these; [`RoadClass::Other`] is the
/// designated default class for anything unrecognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RoadClass {
    Motorway,
    Primary,
    Secondary,
    Tertiary,
    Residential,
    Other,
}

impl RoadClass {
    /// Maps an OSM `highway` tag value to its class. Link variants fold
    /// into their parent class; living streets and unclassified ways count
    /// as residential.
    pub fn from_highway_tag(tag: &str) -> Self {
        match tag {
            "motorway" | "motorway_link" => Self::Motorway,
            "trunk" | "trunk_link" | "primary" | "primary_link" => Self::Primary,
            "secondary" | "secondary_link" => Self::Secondary,
            "tertiary" | "tertiary_link" => Self::Tertiary,
            "residential" | "living_street" | "unclassified" => Self::Residential,
            _ => Self::Other,
        }
    }

    /// All classes in draw order: thin residential fabric first, the
    /// motorway skeleton last (on top).
    pub fn draw_order() -> [RoadClass; 6] {
        [
            Self::Other,
            Self::Residential,
            Self::Tertiary,
            Self::Secondary,
            Self::Primary,
            Self::Motorway,
        ]
    }
}

/// One drawable street segment: its polyline, class, and length.
#[derive(Debug, Clone, PartialEq)]
pub struct StreetEdge {
    pub path: Vec<LatLng>,
    pub class: RoadClass,
    pub length_m: f64,
}

/// The street network of the queried area.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreetGraph {
    /// Way endpoints (enough for bounds/statistics; edge geometry carries
    /// the intermediate shape points).
    pub nodes: Vec<LatLng>,
    pub edges: Vec<StreetEdge>,
}

impl StreetGraph {
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn total_length_m(&self) -> f64 {
        self.edges.iter().map(|e| e.length_m).sum()
    }
}

/// Everything the compositor draws. The polygon layers may legitimately be
/// empty (landlocked or parkless places) — that is not an error.
#[derive(Debug, Clone, Default)]
pub struct FeatureSet {
    pub graph: StreetGraph,
    pub water: Vec<Polygon<f64>>,
    pub parks: Vec<Polygon<f64>>,
}

impl FeatureSet {
    /// Geographic bounds of all drawable geometry, if any exists.
    pub fn bounds(&self) -> Option<LatLngBounds> {
        let mut south = f64::INFINITY;
        let mut west = f64::INFINITY;
        let mut north = f64::NEG_INFINITY;
        let mut east = f64::NEG_INFINITY;
        let mut any = false;

        for edge in &self.graph.edges {
            for p in &edge.path {
                south = south.min(p.lat);
                north = north.max(p.lat);
                west = west.min(p.lon);
                east = east.max(p.lon);
                any = true;
            }
        }
        for poly in self.water.iter().chain(self.parks.iter()) {
            if let Some(rect) = poly.bounding_rect() {
                south = south.min(rect.min().y);
                north = north.max(rect.max().y);
                west = west.min(rect.min().x);
                east = east.max(rect.max().x);
                any = true;
            }
        }

        any.then(|| LatLngBounds::from_coords(south, west, north, east))
    }
}
