//! External data acquisition: geocoding, feature downloads, and the
//! shared pacing that keeps both inside upstream rate limits.

pub mod geocode;
pub mod limiter;
pub mod overpass;

pub use geocode::{GeoResolver, GeocodeBackend, GeocodedPlace, Nominatim};
pub use limiter::RateLimiter;
pub use overpass::{FeatureFetcher, FeatureSource, Overpass};

use once_cell::sync::Lazy;
use reqwest::blocking::Client;

use crate::core::constants::REQUEST_TIMEOUT;

/// Shared blocking HTTP client with a custom User-Agent so that the public
/// OSM services (Nominatim, Overpass) don't reject the request. Building
/// the client once avoids TLS and connection pool setup per call.
pub(crate) static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .user_agent("cartopress/0.1 (+https://github.com/example/cartopress)")
        .timeout(REQUEST_TIMEOUT)
        .build()
        .expect("failed to build reqwest blocking client")
});
