//! Street-network and polygon-layer acquisition.

use std::sync::Arc;

use crate::cache::{CacheKey, CacheKind, CacheStore};
use crate::core::geo::LatLng;
use crate::core::query::ResolvedLocation;
use crate::data::features::FeatureSet;
use crate::data::osm;
use crate::error::FetchError;
use crate::net::limiter::RateLimiter;

/// Trait representing anything that can download one feature layer as a
/// raw Overpass-JSON payload. The production implementation is
/// [`Overpass`]; tests substitute fakes.
pub trait FeatureSource: Send + Sync {
    fn fetch_layer(
        &self,
        kind: CacheKind,
        center: LatLng,
        radius_m: u32,
    ) -> Result<Vec<u8>, FetchError>;
}

/// The public Overpass API interpreter.
pub struct Overpass {
    endpoint: String,
}

impl Overpass {
    pub fn new() -> Self {
        Self {
            endpoint: "https://overpass-api.de/api/interpreter".into(),
        }
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    /// Overpass QL for one layer around a point. `out geom;` inlines
    /// coordinates so no second id-resolution round trip is needed.
    fn query(kind: CacheKind, center: LatLng, radius_m: u32) -> String {
        let around = format!("(around:{},{:.7},{:.7})", radius_m, center.lat, center.lon);
        let body = match kind {
            CacheKind::StreetGraph => format!("way[highway]{around};"),
            CacheKind::Water => format!(
                "(way[natural=water]{around};relation[natural=water]{around};way[waterway=riverbank]{around};);"
            ),
            CacheKind::Parks => format!(
                "(way[leisure=park]{around};relation[leisure=park]{around};way[landuse=grass]{around};);"
            ),
            CacheKind::Geocode => unreachable!("geocoding is not an Overpass layer"),
        };
        format!("[out:json][timeout:25];{body}out geom;")
    }
}

impl Default for Overpass {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureSource for Overpass {
    fn fetch_layer(
        &self,
        kind: CacheKind,
        center: LatLng,
        radius_m: u32,
    ) -> Result<Vec<u8>, FetchError> {
        let response = crate::net::HTTP_CLIENT
            .post(&self.endpoint)
            .body(Self::query(kind, center, radius_m))
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| FetchError::NetworkFailure(e.to_string()))?;
        let bytes = response
            .bytes()
            .map_err(|e| FetchError::NetworkFailure(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// Retrieves the three feature layers for a location, each independently
/// through the cache.
///
/// The street graph is structural: any failure there is fatal. Water and
/// parks are decorative: their failures are absorbed into empty layers
/// with a warning and rendering proceeds.
pub struct FeatureFetcher {
    source: Arc<dyn FeatureSource>,
    cache: CacheStore,
    limiter: RateLimiter,
}

impl FeatureFetcher {
    pub fn new(source: Arc<dyn FeatureSource>, cache: CacheStore, limiter: RateLimiter) -> Self {
        Self {
            source,
            cache,
            limiter,
        }
    }

    pub fn fetch(
        &self,
        location: &ResolvedLocation,
        radius_m: u32,
    ) -> Result<FeatureSet, FetchError> {
        let graph = self.fetch_graph(location, radius_m)?;
        let water = self.fetch_water(location, radius_m);
        let parks = self.fetch_parks(location, radius_m);

        log::info!(
            "fetched features: {} street edges, {} water polygons, {} park polygons",
            graph.edges.len(),
            water.len(),
            parks.len()
        );

        Ok(FeatureSet {
            graph,
            water,
            parks,
        })
    }

    /// The structural layer. Fatal on network failure, and fatal with
    /// [`FetchError::EmptyResult`] when the area holds no streets at all.
    pub fn fetch_graph(
        &self,
        location: &ResolvedLocation,
        radius_m: u32,
    ) -> Result<crate::data::features::StreetGraph, FetchError> {
        let center = location.coordinate;
        let payload = self.layer_payload(CacheKind::StreetGraph, center, radius_m)?;
        let graph = osm::parse_street_graph(&payload).map_err(|e| {
            // A payload that does not decode is an upstream answer we
            // cannot use; drop the entry so the next attempt re-fetches.
            let _ = self
                .cache
                .purge(&CacheKey::layer(CacheKind::StreetGraph, center, radius_m));
            FetchError::NetworkFailure(format!("unreadable street payload: {e}"))
        })?;
        if graph.is_empty() {
            return Err(FetchError::EmptyResult {
                lat: center.lat,
                lon: center.lon,
                radius_m,
            });
        }
        Ok(graph)
    }

    /// Decorative layer: failures come back as an empty collection.
    pub fn fetch_water(
        &self,
        location: &ResolvedLocation,
        radius_m: u32,
    ) -> Vec<geo_types::Polygon<f64>> {
        self.decorative_layer(CacheKind::Water, location.coordinate, radius_m)
    }

    /// Decorative layer: failures come back as an empty collection.
    pub fn fetch_parks(
        &self,
        location: &ResolvedLocation,
        radius_m: u32,
    ) -> Vec<geo_types::Polygon<f64>> {
        self.decorative_layer(CacheKind::Parks, location.coordinate, radius_m)
    }

    /// Cache-first payload for one layer: at most one external request,
    /// stored on success.
    fn layer_payload(
        &self,
        kind: CacheKind,
        center: LatLng,
        radius_m: u32,
    ) -> Result<Vec<u8>, FetchError> {
        let key = CacheKey::layer(kind, center, radius_m);
        if let Some(entry) = self.cache.get(&key) {
            return Ok(entry.payload);
        }

        self.limiter.acquire();
        log::info!(
            "downloading {} layer around ({:.4}, {:.4}), radius {} m",
            kind.tag(),
            center.lat,
            center.lon,
            radius_m
        );
        let payload = self.source.fetch_layer(kind, center, radius_m)?;
        if let Err(e) = self.cache.put(&key, &payload) {
            log::warn!("failed to cache {} layer: {e}", kind.tag());
        }
        Ok(payload)
    }

    /// Non-fatal path for water/parks: any failure becomes an empty layer.
    fn decorative_layer(
        &self,
        kind: CacheKind,
        center: LatLng,
        radius_m: u32,
    ) -> Vec<geo_types::Polygon<f64>> {
        let payload = match self.layer_payload(kind, center, radius_m) {
            Ok(payload) => payload,
            Err(e) => {
                log::warn!("{} layer unavailable, rendering without it: {e}", kind.tag());
                return Vec::new();
            }
        };
        match osm::parse_polygons(&payload) {
            Ok(polygons) => polygons,
            Err(e) => {
                log::warn!("{} payload unreadable, rendering without it: {e}", kind.tag());
                let _ = self.cache.purge(&CacheKey::layer(kind, center, radius_m));
                Vec::new()
            }
        }
    }
}
