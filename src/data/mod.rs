//! Geographic data model and Overpass payload parsing.

pub mod features;
pub mod osm;

pub use features::{FeatureSet, RoadClass, StreetEdge, StreetGraph};
