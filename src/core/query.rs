//! Request-side value types: the place being asked for, the resolved
//! coordinate, and the output geometry.

use serde::{Deserialize, Serialize};

use crate::core::constants::{
    DEFAULT_HEIGHT_PX, DEFAULT_WIDTH_PX, MAX_DIMENSION_PX, MAX_DPI, MAX_RADIUS_M,
    MIN_DIMENSION_PX, MIN_DPI, MIN_RADIUS_M,
};
use crate::core::geo::LatLng;
use crate::error::{PosterError, RenderError};

/// A human-entered place. Immutable once constructed: construction
/// validates, accessors read.
///
/// City and country are always required (they drive the poster typography
/// even when an explicit coordinate is supplied). An explicit coordinate
/// bypasses geocoding entirely; display-name overrides swap the printed
/// text without affecting resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceQuery {
    city: String,
    country: String,
    coordinate: Option<LatLng>,
    display_city: Option<String>,
    display_country: Option<String>,
}

impl PlaceQuery {
    pub fn new(
        city: impl Into<String>,
        country: impl Into<String>,
    ) -> Result<Self, PosterError> {
        let city = city.into();
        let country = country.into();
        if city.trim().is_empty() || country.trim().is_empty() {
            return Err(PosterError::InvalidRequest(
                "city and country must both be non-empty".into(),
            ));
        }
        Ok(Self {
            city,
            country,
            coordinate: None,
            display_city: None,
            display_country: None,
        })
    }

    /// Pre-resolved coordinate override: used verbatim, no geocoding call
    /// is made for this query.
    pub fn with_coordinate(mut self, coordinate: LatLng) -> Result<Self, PosterError> {
        if !coordinate.is_valid() {
            return Err(PosterError::InvalidRequest(format!(
                "coordinate ({}, {}) out of range",
                coordinate.lat, coordinate.lon
            )));
        }
        self.coordinate = Some(coordinate);
        Ok(self)
    }

    /// Override the city name printed on the poster (localization).
    pub fn with_display_city(mut self, name: impl Into<String>) -> Self {
        self.display_city = Some(name.into());
        self
    }

    /// Override the country name printed on the poster.
    pub fn with_display_country(mut self, name: impl Into<String>) -> Self {
        self.display_country = Some(name.into());
        self
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn coordinate(&self) -> Option<LatLng> {
        self.coordinate
    }

    /// Name printed as the poster title.
    pub fn display_city(&self) -> &str {
        self.display_city.as_deref().unwrap_or(&self.city)
    }

    /// Name printed as the poster subtitle.
    pub fn display_country(&self) -> &str {
        self.display_country.as_deref().unwrap_or(&self.country)
    }

    /// Normalized geocoder query string, also the geocode cache identity.
    pub fn geocode_query(&self) -> String {
        format!(
            "{}, {}",
            self.city.trim().to_lowercase(),
            self.country.trim().to_lowercase()
        )
    }
}

/// Canonical resolution of a `PlaceQuery`. Produced once by the resolver
/// and never mutated afterward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub coordinate: LatLng,
    pub display_city: String,
    pub display_country: String,
}

/// Output encoding of the rendered artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Raster, rendered at `dpi`-scaled pixel dimensions.
    Png,
    /// Vector, one document regardless of dpi.
    Svg,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
        }
    }
}

/// Output geometry and typography overrides for one render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSpec {
    pub width: u32,
    pub height: u32,
    /// Raster resolution; `BASE_DPI` (96) means one SVG user unit per pixel.
    pub dpi: u32,
    pub format: OutputFormat,
    /// Replaces the city name as the large title when set.
    pub title: Option<String>,
    /// Replaces the country name as the subtitle when set.
    pub subtitle: Option<String>,
    /// Extra line under the coordinates, free text.
    pub tagline: Option<String>,
}

impl RenderSpec {
    pub fn new(width: u32, height: u32, format: OutputFormat) -> Self {
        Self {
            width,
            height,
            dpi: crate::core::constants::BASE_DPI,
            format,
            title: None,
            subtitle: None,
            tagline: None,
        }
    }

    /// Checks dimensions and dpi against the configured bounds. The
    /// compositor refuses to run on a spec that fails this.
    pub fn validate(&self) -> Result<(), RenderError> {
        let in_range = |v: u32| (MIN_DIMENSION_PX..=MAX_DIMENSION_PX).contains(&v);
        if !in_range(self.width) || !in_range(self.height) {
            return Err(RenderError::InvalidDimensions {
                width: self.width,
                height: self.height,
                min: MIN_DIMENSION_PX,
                max: MAX_DIMENSION_PX,
            });
        }
        if !(MIN_DPI..=MAX_DPI).contains(&self.dpi) {
            return Err(RenderError::InvalidDpi {
                dpi: self.dpi,
                min: MIN_DPI,
                max: MAX_DPI,
            });
        }
        Ok(())
    }

    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn with_tagline(mut self, tagline: impl Into<String>) -> Self {
        self.tagline = Some(tagline.into());
        self
    }

    // Size presets, in pixels at 96 dpi.

    pub fn portrait(format: OutputFormat) -> Self {
        Self::new(DEFAULT_WIDTH_PX, DEFAULT_HEIGHT_PX, format)
    }

    pub fn landscape(format: OutputFormat) -> Self {
        Self::new(DEFAULT_HEIGHT_PX, DEFAULT_WIDTH_PX, format)
    }

    pub fn square(format: OutputFormat) -> Self {
        Self::new(1200, 1200, format)
    }

    pub fn a4(format: OutputFormat) -> Self {
        Self::new(794, 1123, format)
    }

    pub fn a3(format: OutputFormat) -> Self {
        Self::new(1123, 1587, format)
    }

    pub fn wide(format: OutputFormat) -> Self {
        Self::new(1600, 900, format)
    }
}

impl Default for RenderSpec {
    fn default() -> Self {
        Self::portrait(OutputFormat::Png)
    }
}

/// Checks a fetch radius against the configured bounds.
pub fn validate_radius(radius_m: u32) -> Result<(), PosterError> {
    if !(MIN_RADIUS_M..=MAX_RADIUS_M).contains(&radius_m) {
        return Err(PosterError::InvalidRequest(format!(
            "radius {radius_m} m outside allowed range {MIN_RADIUS_M}..={MAX_RADIUS_M} m"
        )));
    }
    Ok(())
}
