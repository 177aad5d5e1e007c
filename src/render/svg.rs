//! Scene-to-SVG serialization. The SVG document is both the vector output
//! artifact and the input to the raster backend, which is what keeps the
//! two paths visually equivalent.

use std::fmt::Write;

use crate::render::scene::{Element, FadeEdge, Scene, TextAnchor, TextBlock, TextWeight};

const FONT_STACK: &str = "Roboto, 'Helvetica Neue', Arial, sans-serif";

/// Serializes a composed scene into a standalone SVG document.
pub fn scene_to_svg(scene: &Scene) -> String {
    let mut out = String::with_capacity(64 * 1024);
    let w = scene.width;
    let h = scene.height;

    let _ = write!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
    );
    out.push('\n');
    write_gradient_defs(&mut out, scene);

    for layer in &scene.layers {
        match &layer.element {
            Element::Background { color } => {
                let _ = write!(
                    out,
                    r#"<rect x="0" y="0" width="{w}" height="{h}" fill="{color}"/>"#
                );
                out.push('\n');
            }
            Element::Polygons { rings, color } => {
                let d = rings_to_path(rings);
                if !d.is_empty() {
                    let _ = write!(
                        out,
                        r#"<path d="{d}" fill="{color}" fill-rule="evenodd" stroke="none"/>"#
                    );
                    out.push('\n');
                }
            }
            Element::Roads {
                paths,
                color,
                stroke_width,
            } => {
                let d = polylines_to_path(paths);
                if !d.is_empty() {
                    let _ = write!(
                        out,
                        r#"<path d="{d}" fill="none" stroke="{color}" stroke-width="{sw:.3}" stroke-linecap="round" stroke-linejoin="round"/>"#,
                        sw = stroke_width
                    );
                    out.push('\n');
                }
            }
            Element::GradientFade { edge, .. } => {
                let (y, id) = match edge {
                    FadeEdge::Bottom => (h * 0.75, "fade-bottom"),
                    FadeEdge::Top => (0.0, "fade-top"),
                };
                let _ = write!(
                    out,
                    r#"<rect x="0" y="{y:.2}" width="{w}" height="{fh:.2}" fill="url(#{id})"/>"#,
                    fh = h * 0.25
                );
                out.push('\n');
            }
            Element::Divider {
                from,
                to,
                color,
                stroke_width,
            } => {
                let _ = write!(
                    out,
                    r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="{color}" stroke-width="{stroke_width:.3}"/>"#,
                    from.x, from.y, to.x, to.y
                );
                out.push('\n');
            }
            Element::Text(block) => {
                write_text(&mut out, block);
            }
        }
    }

    out.push_str("</svg>\n");
    out
}

fn write_gradient_defs(out: &mut String, scene: &Scene) {
    let fades: Vec<(&FadeEdge, &String)> = scene
        .layers
        .iter()
        .filter_map(|l| match &l.element {
            Element::GradientFade { color, edge } => Some((edge, color)),
            _ => None,
        })
        .collect();
    if fades.is_empty() {
        return;
    }

    out.push_str("<defs>\n");
    for (edge, color) in fades {
        // Fully opaque at the canvas edge, dissolving toward the map.
        let (id, edge_offset, map_offset) = match edge {
            FadeEdge::Bottom => ("fade-bottom", "1", "0"),
            FadeEdge::Top => ("fade-top", "0", "1"),
        };
        let _ = write!(
            out,
            concat!(
                r#"<linearGradient id="{id}" x1="0" y1="0" x2="0" y2="1">"#,
                r#"<stop offset="{map}" stop-color="{color}" stop-opacity="0"/>"#,
                r#"<stop offset="{edge}" stop-color="{color}" stop-opacity="1"/>"#,
                "</linearGradient>\n"
            ),
            id = id,
            map = map_offset,
            edge = edge_offset,
            color = color
        );
    }
    out.push_str("</defs>\n");
}

fn write_text(out: &mut String, block: &TextBlock) {
    let weight = match block.weight {
        TextWeight::Light => 300,
        TextWeight::Regular => 400,
        TextWeight::Bold => 700,
    };
    let anchor = match block.anchor {
        TextAnchor::Middle => "middle",
        TextAnchor::End => "end",
    };
    let _ = write!(
        out,
        r#"<text x="{x:.2}" y="{y:.2}" font-family="{FONT_STACK}" font-size="{size:.2}" font-weight="{weight}" fill="{color}" fill-opacity="{opacity}" text-anchor="{anchor}""#,
        x = block.x,
        y = block.y,
        size = block.size,
        color = block.color,
        opacity = block.opacity,
    );
    if let Some(fit) = block.fit_width {
        let _ = write!(out, r#" textLength="{fit:.2}" lengthAdjust="spacingAndGlyphs""#);
    }
    if let Some(spacing) = block.letter_spacing {
        let _ = write!(out, r#" letter-spacing="{spacing:.2}""#);
    }
    let _ = write!(out, ">{}</text>", escape_xml(&block.content));
    out.push('\n');
}

fn rings_to_path(rings: &[Vec<crate::core::geo::Point>]) -> String {
    let mut d = String::new();
    for ring in rings {
        if ring.len() < 3 {
            continue;
        }
        for (i, p) in ring.iter().enumerate() {
            let cmd = if i == 0 { 'M' } else { 'L' };
            let _ = write!(d, "{cmd}{:.2},{:.2}", p.x, p.y);
        }
        d.push('Z');
    }
    d
}

fn polylines_to_path(paths: &[Vec<crate::core::geo::Point>]) -> String {
    let mut d = String::new();
    for path in paths {
        if path.len() < 2 {
            continue;
        }
        for (i, p) in path.iter().enumerate() {
            let cmd = if i == 0 { 'M' } else { 'L' };
            let _ = write!(d, "{cmd}{:.2},{:.2}", p.x, p.y);
        }
    }
    d
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::{LatLng, Point};
    use crate::core::query::{OutputFormat, RenderSpec, ResolvedLocation};
    use crate::data::features::{FeatureSet, RoadClass, StreetEdge, StreetGraph};
    use crate::theme::ThemeConfig;
    use geo_types::{Coord, LineString, Polygon};

    fn test_scene() -> Scene {
        let features = FeatureSet {
            graph: StreetGraph {
                nodes: vec![],
                edges: vec![StreetEdge {
                    path: vec![LatLng::new(45.44, 12.30), LatLng::new(45.44, 12.33)],
                    class: RoadClass::Primary,
                    length_m: 2300.0,
                }],
            },
            water: vec![Polygon::new(
                LineString::from(vec![
                    Coord { x: 12.30, y: 45.42 },
                    Coord { x: 12.34, y: 45.42 },
                    Coord { x: 12.34, y: 45.45 },
                    Coord { x: 12.30, y: 45.42 },
                ]),
                vec![],
            )],
            parks: vec![],
        };
        Scene::compose(
            &features,
            &ThemeConfig::default_palette(),
            &RenderSpec::new(1200, 1600, OutputFormat::Svg),
            &ResolvedLocation {
                coordinate: LatLng::new(45.4408, 12.3155),
                display_city: "Venice".into(),
                display_country: "Italy".into(),
            },
            3000,
        )
    }

    #[test]
    fn test_document_structure() {
        let svg = scene_to_svg(&test_scene());
        assert!(svg.starts_with("<svg "));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains(r#"viewBox="0 0 1200 1600""#));
        assert!(svg.contains("fade-bottom"));
        assert!(svg.contains("fade-top"));
    }

    #[test]
    fn test_water_precedes_roads_in_document_order() {
        let svg = scene_to_svg(&test_scene());
        let water_at = svg.find("#C0C0C0").expect("water fill missing");
        let road_at = svg.find("#1A1A1A").expect("primary road stroke missing");
        assert!(water_at < road_at, "water must serialize before roads");
    }

    #[test]
    fn test_title_is_fitted_and_escaped() {
        let mut scene = test_scene();
        // Inject a title with XML-delicate characters.
        for layer in &mut scene.layers {
            if let Element::Text(t) = &mut layer.element {
                if t.fit_width.is_some() {
                    t.content = "A&B <CITY>".into();
                }
            }
        }
        let svg = scene_to_svg(&scene);
        assert!(svg.contains("A&amp;B &lt;CITY&gt;"));
        assert!(svg.contains("lengthAdjust"));
    }

    #[test]
    fn test_attribution_present() {
        let svg = scene_to_svg(&test_scene());
        assert!(svg.contains("OpenStreetMap contributors"));
    }
}
