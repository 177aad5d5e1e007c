//! Place-name resolution.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cache::{CacheKey, CacheStore};
use crate::core::geo::LatLng;
use crate::core::query::{PlaceQuery, ResolvedLocation};
use crate::error::ResolutionError;
use crate::net::limiter::RateLimiter;

/// A successful geocoder answer, as cached on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodedPlace {
    pub coordinate: LatLng,
    pub display_name: String,
}

/// Trait representing anything that can turn a place string into a
/// coordinate. The production implementation is [`Nominatim`]; tests
/// substitute fakes.
pub trait GeocodeBackend: Send + Sync {
    /// One lookup attempt. `Ok(None)` means the service answered but knows
    /// no such place; `Err` is a transport-level failure.
    fn lookup(&self, query: &str) -> Result<Option<GeocodedPlace>, ResolutionError>;
}

/// The public OSM Nominatim search endpoint.
pub struct Nominatim {
    endpoint: String,
}

impl Nominatim {
    pub fn new() -> Self {
        Self {
            endpoint: "https://nominatim.openstreetmap.org/search".into(),
        }
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

impl Default for Nominatim {
    fn default() -> Self {
        Self::new()
    }
}

/// Nominatim returns lat/lon as strings.
#[derive(Debug, Deserialize)]
struct NominatimRecord {
    lat: String,
    lon: String,
    display_name: String,
}

impl GeocodeBackend for Nominatim {
    fn lookup(&self, query: &str) -> Result<Option<GeocodedPlace>, ResolutionError> {
        let response = crate::net::HTTP_CLIENT
            .get(&self.endpoint)
            .query(&[("q", query), ("format", "json"), ("limit", "1")])
            .send()
            .and_then(|r| r.error_for_status())
            // The request did not complete inside the window; connection
            // failures classify the same way at this boundary.
            .map_err(|e| {
                log::warn!("geocode transport failure for \"{query}\": {e}");
                ResolutionError::Timeout(query.to_string())
            })?;

        let body = response.bytes().map_err(|e| {
            log::warn!("geocode body read failure for \"{query}\": {e}");
            ResolutionError::Timeout(query.to_string())
        })?;
        decode_records(&body, query)
    }
}

/// Decodes a Nominatim response body. A body that is not the expected
/// JSON (a proxy error page, a truncated reply) is a transport problem,
/// not an authoritative "no such place" — only a well-formed empty
/// answer means the place is unknown.
fn decode_records(body: &[u8], query: &str) -> Result<Option<GeocodedPlace>, ResolutionError> {
    let records: Vec<NominatimRecord> = serde_json::from_slice(body).map_err(|e| {
        log::warn!("undecodable geocode response for \"{query}\": {e}");
        ResolutionError::Timeout(query.to_string())
    })?;

    let Some(record) = records.into_iter().next() else {
        return Ok(None);
    };
    let (Ok(lat), Ok(lon)) = (record.lat.parse::<f64>(), record.lon.parse::<f64>()) else {
        return Err(ResolutionError::NotFound(query.to_string()));
    };
    Ok(Some(GeocodedPlace {
        coordinate: LatLng::new(lat, lon),
        display_name: record.display_name,
    }))
}

/// Resolves a [`PlaceQuery`] to a single canonical coordinate.
///
/// Explicit coordinates on the query are used verbatim with no network
/// call and no cache traffic. Name lookups go through the cache; a miss
/// performs exactly one rate-limited external request and stores the
/// answer. No retry lives here — retry policy belongs to the caller.
pub struct GeoResolver {
    backend: Arc<dyn GeocodeBackend>,
    cache: CacheStore,
    limiter: RateLimiter,
}

impl GeoResolver {
    pub fn new(backend: Arc<dyn GeocodeBackend>, cache: CacheStore, limiter: RateLimiter) -> Self {
        Self {
            backend,
            cache,
            limiter,
        }
    }

    pub fn resolve(&self, query: &PlaceQuery) -> Result<ResolvedLocation, ResolutionError> {
        if let Some(coordinate) = query.coordinate() {
            log::debug!(
                "using explicit coordinate ({}, {}) for {}",
                coordinate.lat,
                coordinate.lon,
                query.display_city()
            );
            return Ok(self.located(query, coordinate));
        }

        let geocode_query = query.geocode_query();
        let key = CacheKey::geocode(&geocode_query);

        if let Some(entry) = self.cache.get(&key) {
            if let Ok(place) = serde_json::from_slice::<GeocodedPlace>(&entry.payload) {
                log::debug!("geocode cache hit for \"{geocode_query}\"");
                return Ok(self.located(query, place.coordinate));
            }
            // Undecodable payload behaves like any other corrupt entry.
            let _ = self.cache.purge(&key);
        }

        self.limiter.acquire();
        log::info!("geocoding \"{geocode_query}\"");
        let place = self
            .backend
            .lookup(&geocode_query)?
            .ok_or_else(|| ResolutionError::NotFound(geocode_query.clone()))?;
        log::info!(
            "resolved \"{}\" to ({:.4}, {:.4})",
            place.display_name,
            place.coordinate.lat,
            place.coordinate.lon
        );

        match serde_json::to_vec(&place) {
            Ok(bytes) => {
                if let Err(e) = self.cache.put(&key, &bytes) {
                    log::warn!("failed to cache geocode result: {e}");
                }
            }
            Err(e) => log::warn!("failed to encode geocode result: {e}"),
        }

        Ok(self.located(query, place.coordinate))
    }

    fn located(&self, query: &PlaceQuery, coordinate: LatLng) -> ResolvedLocation {
        ResolvedLocation {
            coordinate,
            display_city: query.display_city().to_string(),
            display_country: query.display_country().to_string(),
        }
    }
}
