//! Documented defaults and bounds for the poster pipeline.

use std::time::Duration;

/// Timeout applied to a single external geocoding or feature request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Minimum delay between successive external calls, shared across all
/// workers (Nominatim usage policy: at most one request per second).
pub const MIN_REQUEST_DELAY: Duration = Duration::from_secs(1);

/// Default map radius in meters around the resolved coordinate.
pub const DEFAULT_RADIUS_M: u32 = 29_000;

/// Accepted radius range in meters.
pub const MIN_RADIUS_M: u32 = 1_000;
pub const MAX_RADIUS_M: u32 = 50_000;

/// Accepted output dimension range, per side, in pixels.
pub const MIN_DIMENSION_PX: u32 = 256;
pub const MAX_DIMENSION_PX: u32 = 8_192;

/// Default output geometry: a 3:4 portrait poster.
pub const DEFAULT_WIDTH_PX: u32 = 1200;
pub const DEFAULT_HEIGHT_PX: u32 = 1600;

/// Base DPI at which the SVG scene's user units equal output pixels.
pub const BASE_DPI: u32 = 96;

/// Accepted raster resolution range. The lower bound rules out the
/// degenerate zero-pixel pixmap, the upper bound covers print output
/// without allowing unallocatable canvases.
pub const MIN_DPI: u32 = 30;
pub const MAX_DPI: u32 = 600;

/// Coordinates are rounded to this many decimal places before cache
/// keying (1e-4 degrees is roughly 11 m, well below any poster radius).
pub const CACHE_COORD_DECIMALS: u32 = 4;

/// Name of the theme whose palette backfills missing keys in any loaded
/// theme, and the fallback when no theme is requested.
pub const DEFAULT_THEME: &str = "feature_based";

/// Progress percentages reported at each pipeline stage boundary.
pub mod progress {
    pub const QUEUED: u8 = 0;
    pub const RESOLVING: u8 = 5;
    pub const GRAPH_FETCHED: u8 = 20;
    pub const WATER_FETCHED: u8 = 25;
    pub const PARKS_FETCHED: u8 = 40;
    pub const RENDERING: u8 = 70;
    pub const FINALIZING: u8 = 95;
    pub const DONE: u8 = 100;
}
