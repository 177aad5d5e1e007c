use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters, used for haversine distances and the
/// meters-per-degree conversion of the local projection.
pub const EARTH_RADIUS: f64 = 6_371_000.0;

/// Represents a geographical coordinate with latitude and longitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lon: f64,
}

impl LatLng {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Validates that the coordinates are within valid ranges.
    pub fn is_valid(&self) -> bool {
        self.lat >= -90.0 && self.lat <= 90.0 && self.lon >= -180.0 && self.lon <= 180.0
    }

    /// Calculates the distance to another coordinate using the Haversine formula.
    pub fn distance_to(&self, other: &LatLng) -> f64 {
        let lat1_rad = self.lat.to_radians();
        let lat2_rad = other.lat.to_radians();
        let delta_lat = (other.lat - self.lat).to_radians();
        let delta_lon = (other.lon - self.lon).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS * c
    }

    /// Projects this coordinate into a planar system centered on `origin`,
    /// in meters, with east as +x and north as +y. An equirectangular
    /// projection scaled by cos(origin latitude): over poster-sized extents
    /// this preserves true aspect ratio at the target latitude.
    pub fn to_local_meters(&self, origin: &LatLng) -> Point {
        let meters_per_deg_lat = EARTH_RADIUS.to_radians();
        let meters_per_deg_lon = meters_per_deg_lat * origin.lat.to_radians().cos();
        Point::new(
            (self.lon - origin.lon) * meters_per_deg_lon,
            (self.lat - origin.lat) * meters_per_deg_lat,
        )
    }

    /// Bounding box of the circle of `radius_m` meters around this point.
    pub fn bounds_around(&self, radius_m: f64) -> LatLngBounds {
        let dlat = radius_m / EARTH_RADIUS.to_radians();
        let cos_lat = self.lat.to_radians().cos().max(1e-6);
        let dlon = dlat / cos_lat;
        LatLngBounds::from_coords(
            self.lat - dlat,
            self.lon - dlon,
            self.lat + dlat,
            self.lon + dlon,
        )
    }
}

/// Represents a point in projected or canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Represents a bounding box of geographical coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLngBounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl LatLngBounds {
    pub fn new(south_west: LatLng, north_east: LatLng) -> Self {
        Self {
            south_west,
            north_east,
        }
    }

    /// Creates bounds from individual coordinates.
    pub fn from_coords(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self::new(LatLng::new(south, west), LatLng::new(north, east))
    }

    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.south_west.lat + self.north_east.lat) / 2.0,
            (self.south_west.lon + self.north_east.lon) / 2.0,
        )
    }

    /// Checks if the bounds contain a coordinate.
    pub fn contains(&self, point: &LatLng) -> bool {
        point.lat >= self.south_west.lat
            && point.lat <= self.north_east.lat
            && point.lon >= self.south_west.lon
            && point.lon <= self.north_east.lon
    }
}
