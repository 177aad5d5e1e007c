//! Deterministic cache keys.
//!
//! The key is content-addressed: it is derived purely from the request
//! parameters, so identical logical requests land on the same durable
//! entry across runs and processes. Coordinates are rounded before keying
//! so that float noise well below the fetch radius does not split entries;
//! the radius itself is keyed verbatim, so two radii never collide.

use std::hash::{Hash, Hasher};

use fxhash::FxHasher;

use crate::core::constants::CACHE_COORD_DECIMALS;
use crate::core::geo::LatLng;

/// What kind of payload an entry holds. Part of the key: the same
/// coordinate and radius fetched as water vs. parks are distinct entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    Geocode,
    StreetGraph,
    Water,
    Parks,
}

impl CacheKind {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Geocode => "geocode",
            Self::StreetGraph => "graph",
            Self::Water => "water",
            Self::Parks => "parks",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum KeyIdent {
    /// Normalized "city, country" string.
    Place(String),
    /// Rounded coordinate (scaled to integer microdegrees/1e4) plus radius.
    Area {
        lat_e4: i64,
        lon_e4: i64,
        radius_m: u32,
    },
}

/// Identity of one cacheable request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    kind: CacheKind,
    ident: KeyIdent,
}

impl CacheKey {
    /// Key for a geocoding lookup of a normalized query string.
    pub fn geocode(query: &str) -> Self {
        Self {
            kind: CacheKind::Geocode,
            ident: KeyIdent::Place(query.trim().to_lowercase()),
        }
    }

    /// Key for a feature-layer download around a coordinate.
    pub fn layer(kind: CacheKind, center: LatLng, radius_m: u32) -> Self {
        let scale = 10f64.powi(CACHE_COORD_DECIMALS as i32);
        Self {
            kind,
            ident: KeyIdent::Area {
                lat_e4: (center.lat * scale).round() as i64,
                lon_e4: (center.lon * scale).round() as i64,
                radius_m,
            },
        }
    }

    pub fn kind(&self) -> CacheKind {
        self.kind
    }

    /// Stable on-disk name for this key. FxHasher is an unkeyed hash, so
    /// the digest is identical across runs of any build of this crate.
    pub fn filename(&self) -> String {
        let mut hasher = FxHasher::default();
        self.hash(&mut hasher);
        format!("{}_{:016x}.bin", self.kind.tag(), hasher.finish())
    }
}
