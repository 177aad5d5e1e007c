//! Output serialization: one composed scene, two equivalent backends.

use crate::core::constants::BASE_DPI;
use crate::core::query::{OutputFormat, RenderSpec, ResolvedLocation};
use crate::data::features::FeatureSet;
use crate::error::RenderError;
use crate::render::scene::Scene;
use crate::render::svg::scene_to_svg;
use crate::theme::ThemeConfig;

/// A rendered poster, in memory.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
}

/// Projects, layers, and serializes one poster.
pub struct Compositor;

impl Compositor {
    /// Renders `features` styled by `theme` onto the canvas described by
    /// `spec`. Vector and raster outputs share the same scene, so layer
    /// ordering and styling are identical in both.
    pub fn render(
        features: &FeatureSet,
        theme: &ThemeConfig,
        spec: &RenderSpec,
        location: &ResolvedLocation,
        radius_m: u32,
    ) -> Result<Artifact, RenderError> {
        spec.validate()?;
        if features.graph.is_empty() {
            return Err(RenderError::EmptyGraph);
        }

        let scene = Scene::compose(features, theme, spec, location, radius_m);
        let svg = scene_to_svg(&scene);
        log::debug!(
            "composed scene: {} layers, {}x{} {:?}",
            scene.layers.len(),
            spec.width,
            spec.height,
            spec.format
        );

        let bytes = match spec.format {
            OutputFormat::Svg => svg.into_bytes(),
            OutputFormat::Png => rasterize(&svg, spec)?,
        };
        Ok(Artifact {
            bytes,
            format: spec.format,
        })
    }
}

/// Rasterizes the SVG document at the spec's dpi. `BASE_DPI` means one
/// pixel per SVG user unit; higher dpi scales the pixmap uniformly.
fn rasterize(svg: &str, spec: &RenderSpec) -> Result<Vec<u8>, RenderError> {
    let mut options = resvg::usvg::Options::default();
    options.fontdb_mut().load_system_fonts();
    let tree = resvg::usvg::Tree::from_data(svg.as_bytes(), &options)
        .map_err(|e| RenderError::Backend(e.to_string()))?;

    let scale = spec.dpi as f32 / BASE_DPI as f32;
    let px_w = (spec.width as f32 * scale).round() as u32;
    let px_h = (spec.height as f32 * scale).round() as u32;
    let mut pixmap = resvg::tiny_skia::Pixmap::new(px_w, px_h).ok_or_else(|| {
        RenderError::Backend(format!("cannot allocate {px_w}x{px_h} pixmap"))
    })?;

    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );

    pixmap
        .encode_png()
        .map_err(|e| RenderError::Backend(e.to_string()))
}
