//! The layered scene: a backend-agnostic description of one poster.
//!
//! Composition assigns every drawable a z index and sorts before
//! serialization, so both output backends inherit the same ordering:
//! background < water < parks < roads (residential up to motorway) <
//! gradient fades < typography.

use crate::core::geo::Point;
use crate::core::query::{RenderSpec, ResolvedLocation};
use crate::data::features::{FeatureSet, RoadClass};
use crate::render::project::Projector;
use crate::theme::ThemeConfig;

// Z indices per layer family.
pub(crate) const Z_BACKGROUND: u8 = 0;
pub(crate) const Z_WATER: u8 = 1;
pub(crate) const Z_PARKS: u8 = 2;
pub(crate) const Z_ROADS_BASE: u8 = 3;
pub(crate) const Z_GRADIENT: u8 = 10;
pub(crate) const Z_TEXT: u8 = 11;

/// Which canvas edge a gradient fade dissolves into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeEdge {
    Top,
    Bottom,
}

/// Font weight bucket for a text block (maps to font-weight in SVG).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextWeight {
    Light,
    Regular,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    Middle,
    End,
}

/// One positioned run of text. Coordinates are canvas units derived from
/// canvas-relative fractions, font size from min(width, height).
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub content: String,
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub weight: TextWeight,
    pub anchor: TextAnchor,
    pub color: String,
    pub opacity: f64,
    /// Stretch the run to exactly this width (title fitting).
    pub fit_width: Option<f64>,
    pub letter_spacing: Option<f64>,
}

/// One drawable element.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    /// Full-canvas fill.
    Background { color: String },
    /// Filled polygons (projected rings, one subpath each).
    Polygons { rings: Vec<Vec<Point>>, color: String },
    /// Stroked polylines of one road class.
    Roads {
        paths: Vec<Vec<Point>>,
        color: String,
        stroke_width: f64,
    },
    /// Quarter-canvas fade into the gradient color.
    GradientFade { color: String, edge: FadeEdge },
    /// Horizontal rule between title and subtitle.
    Divider {
        from: Point,
        to: Point,
        color: String,
        stroke_width: f64,
    },
    Text(TextBlock),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub z: u8,
    pub element: Element,
}

/// A fully composed poster scene, layers already in draw order.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub width: f64,
    pub height: f64,
    pub background: String,
    pub layers: Vec<Layer>,
}

impl Scene {
    /// Composes the scene from projected features, theme, and output
    /// geometry. Pure: no IO, deterministic for fixed inputs.
    pub fn compose(
        features: &FeatureSet,
        theme: &ThemeConfig,
        spec: &RenderSpec,
        location: &ResolvedLocation,
        radius_m: u32,
    ) -> Self {
        let width = f64::from(spec.width);
        let height = f64::from(spec.height);
        let projector = Projector::fit(location.coordinate, f64::from(radius_m), width, height);
        // Text scales with the smaller side so narrow canvases don't
        // overflow; road strokes scale the same way.
        let text_base = width.min(height);
        let stroke_scale = text_base / 400.0;

        let mut layers = Vec::new();
        layers.push(Layer {
            z: Z_BACKGROUND,
            element: Element::Background {
                color: theme.background.clone(),
            },
        });

        if !features.water.is_empty() {
            layers.push(Layer {
                z: Z_WATER,
                element: Element::Polygons {
                    rings: project_polygons(&features.water, &projector),
                    color: theme.water.clone(),
                },
            });
        }
        if !features.parks.is_empty() {
            layers.push(Layer {
                z: Z_PARKS,
                element: Element::Polygons {
                    rings: project_polygons(&features.parks, &projector),
                    color: theme.parks.clone(),
                },
            });
        }

        // One layer per road class, minor fabric first so arterials and
        // motorways draw over it.
        for (i, class) in RoadClass::draw_order().into_iter().enumerate() {
            let paths: Vec<Vec<Point>> = features
                .graph
                .edges
                .iter()
                .filter(|e| e.class == class)
                .map(|e| e.path.iter().map(|c| projector.to_canvas(c)).collect())
                .collect();
            if paths.is_empty() {
                continue;
            }
            let style = theme.road_style(class);
            layers.push(Layer {
                z: Z_ROADS_BASE + i as u8,
                element: Element::Roads {
                    paths,
                    color: style.color.clone(),
                    stroke_width: style.width * stroke_scale,
                },
            });
        }

        for edge in [FadeEdge::Bottom, FadeEdge::Top] {
            layers.push(Layer {
                z: Z_GRADIENT,
                element: Element::GradientFade {
                    color: theme.gradient.clone(),
                    edge,
                },
            });
        }

        compose_typography(&mut layers, theme, spec, location, width, height, text_base);

        layers.sort_by_key(|l| l.z);
        Self {
            width,
            height,
            background: theme.background.clone(),
            layers,
        }
    }

    /// Layers of one z family, in draw order.
    pub fn layers_at(&self, z: u8) -> impl Iterator<Item = &Layer> {
        self.layers.iter().filter(move |l| l.z == z)
    }
}

fn project_polygons(
    polygons: &[geo_types::Polygon<f64>],
    projector: &Projector,
) -> Vec<Vec<Point>> {
    polygons
        .iter()
        .map(|poly| {
            poly.exterior()
                .0
                .iter()
                .map(|c| projector.to_canvas(&crate::core::geo::LatLng::new(c.y, c.x)))
                .collect()
        })
        .collect()
}

/// Title, subtitle, coordinate line, optional tagline, divider rule, and
/// attribution — all at canvas-relative anchors (fractions of H from the
/// bottom, matching the poster layout's design coordinates).
#[allow(clippy::too_many_arguments)]
fn compose_typography(
    layers: &mut Vec<Layer>,
    theme: &ThemeConfig,
    spec: &RenderSpec,
    location: &ResolvedLocation,
    width: f64,
    height: f64,
    text_base: f64,
) {
    let y_from_bottom = |frac: f64| height * (1.0 - frac);

    let title_text = spec
        .title
        .clone()
        .unwrap_or_else(|| location.display_city.to_uppercase());
    let subtitle_text = spec
        .subtitle
        .clone()
        .unwrap_or_else(|| location.display_country.to_uppercase());

    let mut text = |block: TextBlock| {
        layers.push(Layer {
            z: Z_TEXT,
            element: Element::Text(block),
        });
    };

    text(TextBlock {
        content: spaced_letters(&title_text),
        x: width / 2.0,
        y: y_from_bottom(0.14),
        size: text_base * 0.06,
        weight: TextWeight::Bold,
        anchor: TextAnchor::Middle,
        color: theme.text.clone(),
        opacity: 1.0,
        fit_width: Some(width * 0.92),
        letter_spacing: None,
    });

    text(TextBlock {
        content: subtitle_text,
        x: width / 2.0,
        y: y_from_bottom(0.10),
        size: text_base * 0.022,
        weight: TextWeight::Light,
        anchor: TextAnchor::Middle,
        color: theme.text.clone(),
        opacity: 1.0,
        fit_width: None,
        letter_spacing: Some(text_base * 0.004),
    });

    text(TextBlock {
        content: format_coordinates(location.coordinate.lat, location.coordinate.lon),
        x: width / 2.0,
        y: y_from_bottom(0.07),
        size: text_base * 0.014,
        weight: TextWeight::Regular,
        anchor: TextAnchor::Middle,
        color: theme.text.clone(),
        opacity: 0.7,
        fit_width: None,
        letter_spacing: None,
    });

    if let Some(tagline) = &spec.tagline {
        text(TextBlock {
            content: tagline.clone(),
            x: width / 2.0,
            y: y_from_bottom(0.05),
            size: text_base * 0.012,
            weight: TextWeight::Light,
            anchor: TextAnchor::Middle,
            color: theme.text.clone(),
            opacity: 0.7,
            fit_width: None,
            letter_spacing: None,
        });
    }

    text(TextBlock {
        content: "© OpenStreetMap contributors".to_string(),
        x: width * 0.98,
        y: y_from_bottom(0.02),
        size: text_base * 0.01,
        weight: TextWeight::Light,
        anchor: TextAnchor::End,
        color: theme.text.clone(),
        opacity: 0.5,
        fit_width: None,
        letter_spacing: None,
    });

    layers.push(Layer {
        z: Z_TEXT,
        element: Element::Divider {
            from: Point::new(width * 0.4, y_from_bottom(0.125)),
            to: Point::new(width * 0.6, y_from_bottom(0.125)),
            color: theme.text.clone(),
            stroke_width: (text_base / 1200.0).max(0.75),
        },
    });
}

/// "VENICE" -> "V E N I C E" (double space, as the poster typography
/// expects).
fn spaced_letters(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 3);
    let mut first = true;
    for c in text.chars() {
        if !first {
            out.push_str("  ");
        }
        out.push(c);
        first = false;
    }
    out
}

/// `45.4408° N / 12.3155° E` with hemisphere letters.
fn format_coordinates(lat: f64, lon: f64) -> String {
    let ns = if lat >= 0.0 { 'N' } else { 'S' };
    let ew = if lon >= 0.0 { 'E' } else { 'W' };
    format!("{:.4}° {} / {:.4}° {}", lat.abs(), ns, lon.abs(), ew)
}
