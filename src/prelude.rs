//! Prelude module for common cartopress types and traits
//!
//! Re-exports the most commonly used types for easy importing with
//! `use cartopress::prelude::*;`.

pub use crate::core::{
    constants,
    geo::{LatLng, LatLngBounds, Point},
    query::{OutputFormat, PlaceQuery, RenderSpec, ResolvedLocation},
};

pub use crate::cache::{CacheEntry, CacheKey, CacheKind, CacheStore};

pub use crate::net::{
    FeatureFetcher, FeatureSource, GeoResolver, GeocodeBackend, Nominatim, Overpass, RateLimiter,
};

pub use crate::data::features::{FeatureSet, RoadClass, StreetEdge, StreetGraph};

pub use crate::theme::{RoadStyle, ThemeConfig, ThemeInfo, ThemeResolver};

pub use crate::render::{Artifact, Compositor, Projector, Scene};

pub use crate::pipeline::{
    NoopProgress, PipelineConfig, PosterArtifact, PosterPipeline, PosterRequest, ProgressSink,
};

pub use crate::jobs::{Job, JobId, JobManager, JobManagerConfig, JobRunner, JobState};

pub use crate::error::{
    FetchError, PosterError, RenderError, ResolutionError, ThemeError,
};

pub use crate::Result;

pub use std::{
    sync::Arc,
    time::{Duration, Instant},
};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};
