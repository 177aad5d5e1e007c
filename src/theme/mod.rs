//! Styling configuration.
//!
//! A theme is a named JSON record in the themes directory; adding a theme
//! is dropping a new file there, no code change. Loaded records pass
//! through a defaulting step that backfills every missing key from the
//! built-in default palette, so the compositor never observes a gap.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::data::features::RoadClass;
use crate::error::ThemeError;

/// Stroke styling for one road class.
#[derive(Debug, Clone, PartialEq)]
pub struct RoadStyle {
    /// Hex color, `#RRGGBB`.
    pub color: String,
    /// Relative stroke weight; the compositor scales it to canvas size.
    pub width: f64,
}

/// A fully resolved theme: every field the compositor reads is present.
#[derive(Debug, Clone, PartialEq)]
pub struct ThemeConfig {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub background: String,
    pub text: String,
    /// Fade overlay color; defaults to the background so the fade reads
    /// as the map dissolving into the poster margin.
    pub gradient: String,
    pub water: String,
    pub parks: String,
    motorway: RoadStyle,
    primary: RoadStyle,
    secondary: RoadStyle,
    tertiary: RoadStyle,
    residential: RoadStyle,
    default_road: RoadStyle,
}

impl ThemeConfig {
    /// Style for a road class. [`RoadClass::Other`] lands on the
    /// designated default style, so every class resolves.
    pub fn road_style(&self, class: RoadClass) -> &RoadStyle {
        match class {
            RoadClass::Motorway => &self.motorway,
            RoadClass::Primary => &self.primary,
            RoadClass::Secondary => &self.secondary,
            RoadClass::Tertiary => &self.tertiary,
            RoadClass::Residential => &self.residential,
            RoadClass::Other => &self.default_road,
        }
    }

    /// The built-in palette: feature-based grayscale shading on white.
    /// Also the source of every defaulted key.
    pub fn default_palette() -> Self {
        Self {
            name: crate::core::constants::DEFAULT_THEME.to_string(),
            display_name: "Feature-Based Shading".to_string(),
            description: "Road hierarchy in grayscale on a white background".to_string(),
            background: "#FFFFFF".to_string(),
            text: "#000000".to_string(),
            gradient: "#FFFFFF".to_string(),
            water: "#C0C0C0".to_string(),
            parks: "#F0F0F0".to_string(),
            motorway: RoadStyle {
                color: "#0A0A0A".to_string(),
                width: 1.2,
            },
            primary: RoadStyle {
                color: "#1A1A1A".to_string(),
                width: 1.0,
            },
            secondary: RoadStyle {
                color: "#2A2A2A".to_string(),
                width: 0.8,
            },
            tertiary: RoadStyle {
                color: "#3A3A3A".to_string(),
                width: 0.6,
            },
            residential: RoadStyle {
                color: "#4A4A4A".to_string(),
                width: 0.4,
            },
            default_road: RoadStyle {
                color: "#3A3A3A".to_string(),
                width: 0.4,
            },
        }
    }
}

/// Raw theme record as stored on disk. Every key is optional; resolution
/// backfills from the default palette.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ThemeFile {
    pub name: Option<String>,
    pub description: Option<String>,
    pub bg: Option<String>,
    pub text: Option<String>,
    pub gradient_color: Option<String>,
    pub water: Option<String>,
    pub parks: Option<String>,
    pub road_motorway: Option<String>,
    pub road_primary: Option<String>,
    pub road_secondary: Option<String>,
    pub road_tertiary: Option<String>,
    pub road_residential: Option<String>,
    pub road_default: Option<String>,
    pub width_motorway: Option<f64>,
    pub width_primary: Option<f64>,
    pub width_secondary: Option<f64>,
    pub width_tertiary: Option<f64>,
    pub width_residential: Option<f64>,
    pub width_default: Option<f64>,
}

impl ThemeFile {
    /// Fills every missing key from the default palette.
    pub fn resolve(self, theme_name: &str) -> Result<ThemeConfig, ThemeError> {
        let base = ThemeConfig::default_palette();
        let color = |value: Option<String>, fallback: &str| -> Result<String, ThemeError> {
            let value = value.unwrap_or_else(|| fallback.to_string());
            validate_hex_color(&value).map_err(|reason| ThemeError::Invalid {
                name: theme_name.to_string(),
                reason,
            })?;
            Ok(value)
        };
        let road = |c: Option<String>,
                    w: Option<f64>,
                    fallback: &RoadStyle|
         -> Result<RoadStyle, ThemeError> {
            Ok(RoadStyle {
                color: color(c, &fallback.color)?,
                width: w.unwrap_or(fallback.width),
            })
        };

        let background = color(self.bg, &base.background)?;
        Ok(ThemeConfig {
            name: theme_name.to_string(),
            display_name: self.name.unwrap_or_else(|| theme_name.to_string()),
            description: self.description.unwrap_or_default(),
            text: color(self.text, &base.text)?,
            // Absent gradient fades into the theme's own background, not
            // the default palette's.
            gradient: color(self.gradient_color, &background)?,
            background,
            water: color(self.water, &base.water)?,
            parks: color(self.parks, &base.parks)?,
            motorway: road(self.road_motorway, self.width_motorway, &base.motorway)?,
            primary: road(self.road_primary, self.width_primary, &base.primary)?,
            secondary: road(self.road_secondary, self.width_secondary, &base.secondary)?,
            tertiary: road(self.road_tertiary, self.width_tertiary, &base.tertiary)?,
            residential: road(
                self.road_residential,
                self.width_residential,
                &base.residential,
            )?,
            default_road: road(self.road_default, self.width_default, &base.default_road)?,
        })
    }
}

fn validate_hex_color(value: &str) -> Result<(), String> {
    let ok = value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit());
    if ok {
        Ok(())
    } else {
        Err(format!("\"{value}\" is not a #RRGGBB color"))
    }
}

/// Discovery metadata for one configured theme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeInfo {
    pub name: String,
    pub display_name: String,
    pub description: String,
}

/// Loads named themes from a directory of JSON records.
pub struct ThemeResolver {
    themes_dir: PathBuf,
}

impl ThemeResolver {
    pub fn new(themes_dir: impl AsRef<Path>) -> Self {
        Self {
            themes_dir: themes_dir.as_ref().to_path_buf(),
        }
    }

    fn theme_path(&self, name: &str) -> Result<PathBuf, ThemeError> {
        // Names are bare identifiers; anything path-like is rejected
        // rather than resolved, closing directory traversal.
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(ThemeError::NotFound(name.to_string()));
        }
        Ok(self.themes_dir.join(format!("{name}.json")))
    }

    /// Loads and resolves a theme. Unknown names fail with
    /// [`ThemeError::NotFound`]; callers are expected to offer
    /// [`ThemeResolver::list_themes`] as the discovery aid.
    pub fn load(&self, name: &str) -> Result<ThemeConfig, ThemeError> {
        let path = self.theme_path(name)?;
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ThemeError::NotFound(name.to_string()))
            }
            Err(e) => {
                return Err(ThemeError::Invalid {
                    name: name.to_string(),
                    reason: e.to_string(),
                })
            }
        };
        let file: ThemeFile =
            serde_json::from_slice(&bytes).map_err(|e| ThemeError::Invalid {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        let config = file.resolve(name)?;
        log::debug!("loaded theme \"{}\" ({})", name, config.display_name);
        Ok(config)
    }

    /// Enumerates configured theme names with their display metadata.
    /// A pure read: no side effects, unreadable records are skipped.
    pub fn list_themes(&self) -> Vec<ThemeInfo> {
        let Ok(entries) = fs::read_dir(&self.themes_dir) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter_map(|e| {
                let path = e.path();
                (path.extension().and_then(|x| x.to_str()) == Some("json"))
                    .then(|| path.file_stem()?.to_str().map(str::to_string))
                    .flatten()
            })
            .collect();
        names.sort();

        names
            .into_iter()
            .filter_map(|name| {
                let config = self.load(&name).ok()?;
                Some(ThemeInfo {
                    name,
                    display_name: config.display_name,
                    description: config.description,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_theme(dir: &Path, name: &str, json: serde_json::Value) {
        fs::write(dir.join(format!("{name}.json")), json.to_string()).unwrap();
    }

    #[test]
    fn test_missing_keys_are_defaulted() {
        let dir = tempfile::tempdir().unwrap();
        write_theme(
            dir.path(),
            "noir",
            serde_json::json!({
                "name": "Noir",
                "bg": "#101010",
                "text": "#EAEAEA",
                "road_motorway": "#FFFFFF"
            }),
        );

        let resolver = ThemeResolver::new(dir.path());
        let theme = resolver.load("noir").unwrap();
        assert_eq!(theme.background, "#101010");
        // No gradient_color in the file: falls back to the theme's own bg.
        assert_eq!(theme.gradient, "#101010");
        // Unstated keys come from the default palette.
        assert_eq!(theme.water, "#C0C0C0");
        assert_eq!(theme.road_style(RoadClass::Motorway).color, "#FFFFFF");
        assert!((theme.road_style(RoadClass::Motorway).width - 1.2).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_theme_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = ThemeResolver::new(dir.path());
        match resolver.load("not_a_theme") {
            Err(ThemeError::NotFound(name)) => assert_eq!(name, "not_a_theme"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_path_like_names_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = ThemeResolver::new(dir.path());
        assert!(matches!(
            resolver.load("../escape"),
            Err(ThemeError::NotFound(_))
        ));
    }

    #[test]
    fn test_bad_color_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        write_theme(dir.path(), "broken", serde_json::json!({"bg": "purple"}));
        let resolver = ThemeResolver::new(dir.path());
        assert!(matches!(
            resolver.load("broken"),
            Err(ThemeError::Invalid { .. })
        ));
    }

    #[test]
    fn test_unclassified_roads_use_the_default_style() {
        let theme = ThemeConfig::default_palette();
        assert_eq!(theme.road_style(RoadClass::Other).color, "#3A3A3A");
    }

    #[test]
    fn test_list_themes_enumerates_sorted_metadata() {
        let dir = tempfile::tempdir().unwrap();
        write_theme(dir.path(), "noir", serde_json::json!({"name": "Noir"}));
        write_theme(
            dir.path(),
            "terracotta",
            serde_json::json!({"name": "Terracotta", "description": "Warm clay tones"}),
        );
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let resolver = ThemeResolver::new(dir.path());
        let themes = resolver.list_themes();
        assert_eq!(themes.len(), 2);
        assert_eq!(themes[0].name, "noir");
        assert_eq!(themes[1].display_name, "Terracotta");
        assert_eq!(themes[1].description, "Warm clay tones");
    }
}
