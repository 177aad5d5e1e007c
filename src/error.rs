//! Error types for every pipeline stage.
//!
//! Each stage owns its error enum; [`PosterError`] is the umbrella the
//! pipeline and job manager speak. [`PosterError::kind`] exposes a
//! stable machine-readable tag for job status payloads, so shells can
//! branch on failure class without parsing display strings.

/// Geocoding failures.
#[derive(Debug, thiserror::Error)]
pub enum ResolutionError {
    #[error("place not found: {0}")]
    NotFound(String),

    #[error("geocoding timed out for: {0}")]
    Timeout(String),
}

/// Feature download failures.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("network failure: {0}")]
    NetworkFailure(String),

    #[error("no street network within {radius_m} m of ({lat}, {lon})")]
    EmptyResult { lat: f64, lon: f64, radius_m: u32 },
}

/// Theme loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ThemeError {
    #[error("unknown theme: {0}")]
    NotFound(String),

    #[error("theme {name} is invalid: {reason}")]
    Invalid { name: String, reason: String },
}

/// Rendering failures.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("street graph is empty, nothing to render")]
    EmptyGraph,

    #[error("dimensions {width}x{height} outside allowed range {min}..={max} px")]
    InvalidDimensions {
        width: u32,
        height: u32,
        min: u32,
        max: u32,
    },

    #[error("dpi {dpi} outside allowed range {min}..={max}")]
    InvalidDpi { dpi: u32, min: u32, max: u32 },

    #[error("render backend error: {0}")]
    Backend(String),
}

/// Umbrella error for the whole pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PosterError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Theme(#[from] ThemeError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PosterError {
    /// Stable failure tag carried in job status. These strings are part
    /// of the public surface; renaming one breaks polling clients.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Resolution(ResolutionError::NotFound(_)) => "resolution_not_found",
            Self::Resolution(ResolutionError::Timeout(_)) => "resolution_timeout",
            Self::Fetch(FetchError::NetworkFailure(_)) => "fetch_network_failure",
            Self::Fetch(FetchError::EmptyResult { .. }) => "fetch_empty_result",
            Self::Theme(ThemeError::NotFound(_)) => "theme_not_found",
            Self::Theme(ThemeError::Invalid { .. }) => "theme_invalid",
            Self::Render(RenderError::EmptyGraph) => "render_empty_graph",
            Self::Render(RenderError::InvalidDimensions { .. }) => "render_invalid_dimensions",
            Self::Render(RenderError::InvalidDpi { .. }) => "render_invalid_dpi",
            Self::Render(RenderError::Backend(_)) => "render_backend",
            Self::InvalidRequest(_) => "invalid_request",
            Self::Io(_) => "io",
        }
    }
}
