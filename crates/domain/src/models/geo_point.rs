//! Geographic point primitive.

use serde::{Deserialize, Serialize};

use crate::error::GeofenceError;

/// A WGS84 latitude/longitude pair in decimal degrees.
///
/// Planar operations treat `lng` as the x-axis and `lat` as the y-axis, which
/// holds at city or regional scale but not near the poles or across the
/// antimeridian.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Builds a point from a GeoJSON `[lng, lat]` position.
    pub const fn from_lng_lat([lng, lat]: [f64; 2]) -> Self {
        Self { lat, lng }
    }

    /// Returns the GeoJSON `[lng, lat]` position for this point.
    pub const fn to_lng_lat(self) -> [f64; 2] {
        [self.lng, self.lat]
    }

    /// Checks that the point lies within valid latitude/longitude ranges.
    pub fn validate(&self) -> Result<(), GeofenceError> {
        shared::validation::validate_latitude(self.lat)?;
        shared::validation::validate_longitude(self.lng)?;
        Ok(())
    }
}

impl From<GeoPoint> for geo::Coord<f64> {
    fn from(p: GeoPoint) -> Self {
        geo::coord! { x: p.lng, y: p.lat }
    }
}

impl From<GeoPoint> for geo::Point<f64> {
    fn from(p: GeoPoint) -> Self {
        geo::Point::new(p.lng, p.lat)
    }
}

/// Z component of the planar cross product `(a - o) x (b - o)`.
///
/// Positive for a counter-clockwise (left) turn `o -> a -> b`, negative for a
/// clockwise turn, zero when collinear.
pub fn cross(o: GeoPoint, a: GeoPoint, b: GeoPoint) -> f64 {
    (a.lng - o.lng) * (b.lat - o.lat) - (a.lat - o.lat) * (b.lng - o.lng)
}
