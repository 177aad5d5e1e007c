//! Geometry-to-canvas projection.

use crate::core::geo::{LatLng, Point};

/// Maps geographic coordinates onto a W×H canvas.
///
/// Geometry first goes through the aspect-true local projection
/// ([`LatLng::to_local_meters`]), then through one uniform scale chosen so
/// the requested radius covers the canvas (the larger of the two
/// per-axis ratios — excess geometry is clipped by the canvas edge, never
/// squeezed). Uniform scaling is what makes output dimensions a pure
/// zoom: relative positions are identical at any W:H.
#[derive(Debug, Clone, Copy)]
pub struct Projector {
    origin: LatLng,
    /// Canvas units per projected meter.
    scale: f64,
    width: f64,
    height: f64,
}

impl Projector {
    /// Fits the circle of `radius_m` around `center` onto a canvas of
    /// `width`×`height` user units.
    pub fn fit(center: LatLng, radius_m: f64, width: f64, height: f64) -> Self {
        let diameter = (2.0 * radius_m).max(1.0);
        let scale = (width / diameter).max(height / diameter);
        Self {
            origin: center,
            scale,
            width,
            height,
        }
    }

    /// Projects a coordinate to canvas space (x right, y down, origin at
    /// the top-left corner).
    pub fn to_canvas(&self, coord: &LatLng) -> Point {
        let local = coord.to_local_meters(&self.origin);
        Point::new(
            self.width / 2.0 + local.x * self.scale,
            self.height / 2.0 - local.y * self.scale,
        )
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }
}
