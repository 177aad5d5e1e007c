//! # cartopress
//!
//! Turns a named place (or explicit coordinates) into a styled map
//! poster: street network, water, parks, and typography, layered onto an
//! SVG or PNG canvas driven by a theme configuration.
//!
//! The pipeline is `GeoResolver` → `FeatureFetcher` (through a durable
//! `CacheStore`) → `ThemeResolver` → `Compositor`. CLI-style callers run
//! it synchronously through [`pipeline::PosterPipeline::generate`];
//! services wrap the same pipeline in [`jobs::JobManager`] for
//! queued/processing/completed/failed lifecycle with progress polling.

pub mod cache;
pub mod core;
pub mod data;
pub mod error;
pub mod jobs;
pub mod net;
pub mod pipeline;
pub mod prelude;
pub mod render;
pub mod theme;

// Re-export public API
pub use crate::core::{
    geo::{LatLng, LatLngBounds, Point},
    query::{OutputFormat, PlaceQuery, RenderSpec, ResolvedLocation},
};

pub use crate::cache::{CacheKey, CacheKind, CacheStore};
pub use crate::data::features::{FeatureSet, RoadClass, StreetGraph};
pub use crate::error::{FetchError, PosterError, RenderError, ResolutionError, ThemeError};
pub use crate::jobs::{Job, JobId, JobManager, JobManagerConfig, JobState};
pub use crate::net::{FeatureFetcher, GeoResolver, RateLimiter};
pub use crate::pipeline::{PipelineConfig, PosterArtifact, PosterPipeline, PosterRequest};
pub use crate::render::{Artifact, Compositor};
pub use crate::theme::{ThemeConfig, ThemeResolver};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, PosterError>;
