//! Layered compositing: projection, scene construction, and the two
//! output backends (SVG document, resvg rasterization).

pub mod compositor;
pub mod project;
pub mod scene;
pub mod svg;

pub use compositor::{Artifact, Compositor};
pub use project::Projector;
pub use scene::{Element, FadeEdge, Layer, Scene};
