//! Geofence domain model.
//!
//! A geofence is either a circle (center + radius) or a convex polygon. The
//! shape is a tagged variant so that a polygon can never carry a radius and a
//! circle can never carry vertices.

use geo::{Contains, HaversineDistance};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::geo_point::{cross, GeoPoint};
use crate::error::GeofenceError;

/// Server-assigned geofence identifier.
pub type GeofenceId = i64;

/// Identifier of the manager owning a geofence.
pub type ManagerId = i64;

/// Zone classification. Carries no behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZoneStatus {
    #[default]
    OperationalZone,
    Parking,
    RestrictedZone,
}

impl ZoneStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OperationalZone => "OperationalZone",
            Self::Parking => "Parking",
            Self::RestrictedZone => "RestrictedZone",
        }
    }
}

impl std::fmt::Display for ZoneStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ZoneStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OperationalZone" => Ok(Self::OperationalZone),
            "Parking" => Ok(Self::Parking),
            "RestrictedZone" => Ok(Self::RestrictedZone),
            _ => Err(format!("Invalid zone status: {}", s)),
        }
    }
}

/// Circular boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub center: GeoPoint,
    pub radius_meters: f64,
}

impl Circle {
    pub fn new(center: GeoPoint, radius_meters: f64) -> Result<Self, GeofenceError> {
        shared::validation::validate_radius(radius_meters)?;
        Ok(Self {
            center,
            radius_meters,
        })
    }
}

/// Convex polygon boundary. The vertex list is open: the first vertex is not
/// repeated at the end.
///
/// Vertices run counter-clockwise in the (lng, lat) plane and every turn is
/// strictly left, so collinear and self-intersecting lists cannot be built.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    vertices: Vec<GeoPoint>,
}

impl Polygon {
    /// Minimum number of vertices of a saveable polygon.
    pub const MIN_VERTICES: usize = 3;

    pub fn new(vertices: Vec<GeoPoint>) -> Result<Self, GeofenceError> {
        if vertices.len() < Self::MIN_VERTICES {
            return Err(GeofenceError::Validation(format!(
                "Polygon needs at least {} vertices, got {}",
                Self::MIN_VERTICES,
                vertices.len()
            )));
        }
        if !is_strictly_convex(&vertices) {
            return Err(GeofenceError::Validation(
                "Polygon vertices must form a convex counter-clockwise ring".into(),
            ));
        }
        Ok(Self { vertices })
    }

    pub fn vertices(&self) -> &[GeoPoint] {
        &self.vertices
    }

    pub fn into_vertices(self) -> Vec<GeoPoint> {
        self.vertices
    }
}

/// Every consecutive turn is strictly left and the ring winds exactly once.
///
/// The winding check rejects star-shaped rings, whose turns are all left but
/// add up to more than one full revolution.
fn is_strictly_convex(vertices: &[GeoPoint]) -> bool {
    let n = vertices.len();
    let mut turning = 0.0;

    for i in 0..n {
        let o = vertices[i];
        let a = vertices[(i + 1) % n];
        let b = vertices[(i + 2) % n];

        let turn = cross(o, a, b);
        if turn <= 0.0 {
            return false;
        }

        let dot = (a.lng - o.lng) * (b.lng - a.lng) + (a.lat - o.lat) * (b.lat - a.lat);
        turning += turn.atan2(dot);
    }

    (turning - std::f64::consts::TAU).abs() < 1e-6
}

/// A finished geofence shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Circle(Circle),
    Polygon(Polygon),
}

impl Shape {
    pub fn kind(&self) -> &'static str {
        match self {
            Shape::Circle(_) => "circle",
            Shape::Polygon(_) => "polygon",
        }
    }

    /// Point containment. Circles use the haversine distance to the center;
    /// polygons use planar point-in-polygon, with boundary points excluded.
    pub fn contains(&self, point: &GeoPoint) -> bool {
        match self {
            Shape::Circle(circle) => {
                let center = geo::Point::from(circle.center);
                center.haversine_distance(&geo::Point::from(*point)) <= circle.radius_meters
            }
            Shape::Polygon(polygon) => {
                let ring: geo::LineString<f64> = polygon
                    .vertices()
                    .iter()
                    .map(|v| geo::Coord::from(*v))
                    .collect();
                geo::Polygon::new(ring, vec![]).contains(&geo::Point::from(*point))
            }
        }
    }
}

/// A completed authoring result, not yet persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct GeofenceDraft {
    pub name: String,
    pub status: ZoneStatus,
    pub shape: Shape,
}

/// A persisted geofence.
#[derive(Debug, Clone, PartialEq)]
pub struct Geofence {
    pub geofence_id: GeofenceId,
    pub manager_id: ManagerId,
    pub name: String,
    pub status: ZoneStatus,
    pub shape: Shape,
}

impl Geofence {
    pub fn from_draft(geofence_id: GeofenceId, manager_id: ManagerId, draft: GeofenceDraft) -> Self {
        Self {
            geofence_id,
            manager_id,
            name: draft.name,
            status: draft.status,
            shape: draft.shape,
        }
    }

    pub fn contains(&self, point: &GeoPoint) -> bool {
        self.shape.contains(point)
    }

    /// Applies a validated partial update. Geometry is never touched.
    pub fn apply(&mut self, update: &GeofenceUpdate) {
        if let Some(name) = &update.geofence_name {
            self.name = name.trim().to_string();
        }
        if let Some(status) = update.geofence_status {
            self.status = status;
        }
    }
}

/// Partial update of a persisted geofence (rename and/or status change).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GeofenceUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "shared::validation::validate_geofence_name"))]
    pub geofence_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub geofence_status: Option<ZoneStatus>,
}

impl GeofenceUpdate {
    pub fn is_empty(&self) -> bool {
        self.geofence_name.is_none() && self.geofence_status.is_none()
    }
}
