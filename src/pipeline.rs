//! The full generation pipeline: resolve → fetch → render → finalize.
//!
//! [`PosterPipeline`] is the synchronous, single-request engine. The CLI
//! shell calls [`PosterPipeline::generate`] directly; service mode wraps
//! the same call in a [`crate::jobs::JobManager`] worker.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cache::CacheStore;
use crate::core::constants::progress;
use crate::core::query::{validate_radius, PlaceQuery, RenderSpec, ResolvedLocation};
use crate::data::features::FeatureSet;
use crate::error::PosterError;
use crate::net::{
    FeatureFetcher, FeatureSource, GeoResolver, GeocodeBackend, Nominatim, Overpass, RateLimiter,
};
use crate::render::Compositor;
use crate::theme::{ThemeInfo, ThemeResolver};

/// Where the pipeline reads and writes.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub cache_dir: PathBuf,
    pub themes_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("cache"),
            themes_dir: PathBuf::from("themes"),
            output_dir: PathBuf::from("posters"),
        }
    }
}

/// One poster request, CLI and service mode alike.
#[derive(Debug, Clone)]
pub struct PosterRequest {
    pub place: PlaceQuery,
    pub theme: String,
    pub radius_m: u32,
    pub spec: RenderSpec,
}

impl PosterRequest {
    pub fn new(place: PlaceQuery, theme: impl Into<String>) -> Self {
        Self {
            place,
            theme: theme.into(),
            radius_m: crate::core::constants::DEFAULT_RADIUS_M,
            spec: RenderSpec::default(),
        }
    }

    pub fn with_radius(mut self, radius_m: u32) -> Self {
        self.radius_m = radius_m;
        self
    }

    pub fn with_spec(mut self, spec: RenderSpec) -> Self {
        self.spec = spec;
        self
    }
}

/// A finished poster on disk.
#[derive(Debug, Clone)]
pub struct PosterArtifact {
    pub path: PathBuf,
    pub location: ResolvedLocation,
    pub theme: String,
}

/// Observer for pipeline progress. Percentages are monotonically
/// non-decreasing over one run.
pub trait ProgressSink: Send + Sync {
    fn report(&self, percent: u8, message: &str);
}

/// Sink that discards all reports (CLI one-shot use).
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn report(&self, _percent: u8, _message: &str) {}
}

impl<F: Fn(u8, &str) + Send + Sync> ProgressSink for F {
    fn report(&self, percent: u8, message: &str) {
        self(percent, message)
    }
}

/// End-to-end generation engine. One instance serves any number of
/// sequential or concurrent requests; all external calls go through one
/// shared rate limiter.
pub struct PosterPipeline {
    resolver: GeoResolver,
    fetcher: FeatureFetcher,
    themes: ThemeResolver,
    output_dir: PathBuf,
}

impl PosterPipeline {
    /// Production wiring: Nominatim + Overpass behind the shared cache.
    pub fn new(config: PipelineConfig) -> Result<Self, PosterError> {
        Self::with_backends(config, Arc::new(Nominatim::new()), Arc::new(Overpass::new()))
    }

    /// Custom backends (tests, alternative data services).
    pub fn with_backends(
        config: PipelineConfig,
        geocoder: Arc<dyn GeocodeBackend>,
        features: Arc<dyn FeatureSource>,
    ) -> Result<Self, PosterError> {
        let cache = CacheStore::open(&config.cache_dir)?;
        let limiter = RateLimiter::default();
        Ok(Self {
            resolver: GeoResolver::new(geocoder, cache.clone(), limiter.clone()),
            fetcher: FeatureFetcher::new(features, cache, limiter),
            themes: ThemeResolver::new(&config.themes_dir),
            output_dir: config.output_dir,
        })
    }

    /// Theme discovery passthrough for the surrounding shells.
    pub fn list_themes(&self) -> Vec<ThemeInfo> {
        self.themes.list_themes()
    }

    pub fn generate(&self, request: &PosterRequest) -> Result<PosterArtifact, PosterError> {
        self.generate_with_progress(request, &NoopProgress)
    }

    /// Runs the full pipeline, reporting stage progress to `sink`.
    ///
    /// Order matters: the request (radius, dimensions) and the theme are
    /// validated before any network cost is paid, so a bad theme name
    /// never triggers a fetch.
    pub fn generate_with_progress(
        &self,
        request: &PosterRequest,
        sink: &dyn ProgressSink,
    ) -> Result<PosterArtifact, PosterError> {
        validate_radius(request.radius_m)?;
        request.spec.validate().map_err(PosterError::Render)?;
        let theme = self.themes.load(&request.theme)?;

        sink.report(progress::RESOLVING, "Resolving place");
        let location = self.resolver.resolve(&request.place)?;

        let graph = self.fetcher.fetch_graph(&location, request.radius_m)?;
        sink.report(progress::GRAPH_FETCHED, "Street network loaded");
        let water = self.fetcher.fetch_water(&location, request.radius_m);
        sink.report(progress::WATER_FETCHED, "Water features loaded");
        let parks = self.fetcher.fetch_parks(&location, request.radius_m);
        sink.report(progress::PARKS_FETCHED, "Parks loaded");
        let features = FeatureSet {
            graph,
            water,
            parks,
        };
        if let Some(bounds) = features.bounds() {
            log::debug!(
                "feature extent: ({:.4}, {:.4}) to ({:.4}, {:.4})",
                bounds.south_west.lat,
                bounds.south_west.lon,
                bounds.north_east.lat,
                bounds.north_east.lon
            );
        }

        sink.report(progress::RENDERING, "Rendering map");
        let artifact = Compositor::render(
            &features,
            &theme,
            &request.spec,
            &location,
            request.radius_m,
        )?;

        sink.report(progress::FINALIZING, "Writing output");
        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_path(request);
        fs::write(&path, &artifact.bytes)?;
        log::info!("poster written to {}", path.display());

        sink.report(progress::DONE, "Done");
        Ok(PosterArtifact {
            path,
            location,
            theme: request.theme.clone(),
        })
    }

    /// `{place}_{theme}_{timestamp}.{ext}`; millisecond timestamps keep
    /// concurrent jobs for the same place and theme from colliding.
    fn output_path(&self, request: &PosterRequest) -> PathBuf {
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S%3f");
        let filename = format!(
            "{}_{}_{}.{}",
            slugify(request.place.city()),
            slugify(&request.theme),
            timestamp,
            request.spec.format.extension()
        );
        self.output_dir.join(filename)
    }
}

/// Lowercased, whitespace collapsed to underscores, everything else
/// non-alphanumeric dropped.
fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.trim().to_lowercase().chars() {
        if c.is_alphanumeric() {
            out.push(c);
        } else if c.is_whitespace() && !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}
