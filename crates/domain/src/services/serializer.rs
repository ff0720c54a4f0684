//! GeoJSON-compatible wire format for geofences.
//!
//! Circles travel as a GeoJSON `Point` center plus a radius in meters.
//! Polygons travel as a closed GeoJSON `LineString`: the first vertex is
//! repeated at the end. Positions are always `[lng, lat]`.
//!
//! Integral numbers are written without a fractional part (`20`, not
//! `20.0`), matching what browser clients emit, so a record read from the
//! API serializes back to the same text.

use serde::{Deserialize, Serialize, Serializer};

use crate::error::GeofenceError;
use crate::models::{
    Circle, GeoPoint, Geofence, GeofenceDraft, GeofenceId, ManagerId, Polygon, Shape, ZoneStatus,
};

/// GeoJSON position, `[lng, lat]`.
pub type Position = [f64; 2];

/// Largest magnitude below which every integer is exactly representable.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// A number as it appears on the wire.
struct WireNumber(f64);

impl Serialize for WireNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value = self.0;
        if value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER {
            serializer.serialize_i64(value as i64)
        } else {
            serializer.serialize_f64(value)
        }
    }
}

fn serialize_number<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    WireNumber(*value).serialize(serializer)
}

fn serialize_position<S: Serializer>(
    position: &Position,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    [WireNumber(position[0]), WireNumber(position[1])].serialize(serializer)
}

fn serialize_positions<S: Serializer>(
    positions: &[Position],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(
        positions
            .iter()
            .map(|position| [WireNumber(position[0]), WireNumber(position[1])]),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointType {
    Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineStringType {
    LineString,
}

/// GeoJSON `Point` geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointGeometry {
    #[serde(rename = "type")]
    pub kind: PointType,
    #[serde(serialize_with = "serialize_position")]
    pub coordinates: Position,
}

/// GeoJSON `LineString` geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineStringGeometry {
    #[serde(rename = "type")]
    pub kind: LineStringType,
    #[serde(serialize_with = "serialize_positions")]
    pub coordinates: Vec<Position>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircleWire {
    pub geofence_name: String,
    pub geofence_status: ZoneStatus,
    pub center: PointGeometry,
    #[serde(serialize_with = "serialize_number")]
    pub radius: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolygonWire {
    pub geofence_name: String,
    pub geofence_status: ZoneStatus,
    pub vertices: LineStringGeometry,
}

/// Creation payload for either shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GeofenceWire {
    Circle(CircleWire),
    Polygon(PolygonWire),
}

/// Persisted geofence as returned by the persistence API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeofenceRecordWire {
    pub geofence_id: GeofenceId,
    pub manager_id: ManagerId,
    #[serde(flatten)]
    pub shape: GeofenceWire,
}

pub fn circle_to_wire(name: &str, status: ZoneStatus, circle: &Circle) -> CircleWire {
    CircleWire {
        geofence_name: name.to_string(),
        geofence_status: status,
        center: PointGeometry {
            kind: PointType::Point,
            coordinates: circle.center.to_lng_lat(),
        },
        radius: circle.radius_meters,
    }
}

pub fn polygon_to_wire(name: &str, status: ZoneStatus, polygon: &Polygon) -> PolygonWire {
    let mut coordinates: Vec<Position> =
        polygon.vertices().iter().map(|v| v.to_lng_lat()).collect();
    if let Some(first) = coordinates.first().copied() {
        coordinates.push(first);
    }

    PolygonWire {
        geofence_name: name.to_string(),
        geofence_status: status,
        vertices: LineStringGeometry {
            kind: LineStringType::LineString,
            coordinates,
        },
    }
}

pub fn to_wire(draft: &GeofenceDraft) -> GeofenceWire {
    match &draft.shape {
        Shape::Circle(circle) => {
            GeofenceWire::Circle(circle_to_wire(&draft.name, draft.status, circle))
        }
        Shape::Polygon(polygon) => {
            GeofenceWire::Polygon(polygon_to_wire(&draft.name, draft.status, polygon))
        }
    }
}

pub fn circle_from_wire(wire: &CircleWire) -> Result<Circle, GeofenceError> {
    let center = GeoPoint::from_lng_lat(wire.center.coordinates);
    center.validate()?;
    Circle::new(center, wire.radius)
}

/// Rebuilds the open vertex list from a closed ring, dropping the trailing
/// duplicate.
pub fn polygon_from_wire(wire: &PolygonWire) -> Result<Polygon, GeofenceError> {
    let coordinates = &wire.vertices.coordinates;
    let (last, open) = match coordinates.split_last() {
        Some(parts) if coordinates.len() >= Polygon::MIN_VERTICES + 1 => parts,
        _ => {
            return Err(GeofenceError::Validation(format!(
                "Polygon ring needs at least {} positions, got {}",
                Polygon::MIN_VERTICES + 1,
                coordinates.len()
            )))
        }
    };

    if open.first() != Some(last) {
        return Err(GeofenceError::Validation(
            "Polygon ring is not closed".into(),
        ));
    }

    let vertices = open
        .iter()
        .map(|&position| {
            let point = GeoPoint::from_lng_lat(position);
            point.validate().map(|_| point)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Polygon::new(vertices)
}

pub fn from_wire(wire: &GeofenceWire) -> Result<GeofenceDraft, GeofenceError> {
    let (name, status, shape) = match wire {
        GeofenceWire::Circle(c) => (
            &c.geofence_name,
            c.geofence_status,
            Shape::Circle(circle_from_wire(c)?),
        ),
        GeofenceWire::Polygon(p) => (
            &p.geofence_name,
            p.geofence_status,
            Shape::Polygon(polygon_from_wire(p)?),
        ),
    };

    Ok(GeofenceDraft {
        name: name.clone(),
        status,
        shape,
    })
}

pub fn record_to_wire(geofence: &Geofence) -> GeofenceRecordWire {
    let shape = match &geofence.shape {
        Shape::Circle(circle) => {
            GeofenceWire::Circle(circle_to_wire(&geofence.name, geofence.status, circle))
        }
        Shape::Polygon(polygon) => {
            GeofenceWire::Polygon(polygon_to_wire(&geofence.name, geofence.status, polygon))
        }
    };

    GeofenceRecordWire {
        geofence_id: geofence.geofence_id,
        manager_id: geofence.manager_id,
        shape,
    }
}

pub fn record_from_wire(wire: &GeofenceRecordWire) -> Result<Geofence, GeofenceError> {
    let draft = from_wire(&wire.shape)?;
    Ok(Geofence::from_draft(wire.geofence_id, wire.manager_id, draft))
}
