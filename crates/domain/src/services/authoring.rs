//! Geofence authoring state machine.
//!
//! Tracks whether the operator is drawing a circle or a polygon, accumulates
//! map clicks, and validates the result before it is handed off for
//! persistence. Every geometry change is published as a [`ShapeChanged`]
//! event so the map surface can redraw the live outline.

use tokio::sync::broadcast;
use tracing::{debug, info};

use super::convex_hull::hull_reduce;
use crate::error::GeofenceError;
use crate::models::{Circle, GeoPoint, GeofenceDraft, Polygon, Shape, ZoneStatus};

/// Buffered shape events per subscriber before older ones are dropped.
const EVENT_CAPACITY: usize = 64;

/// Coarse authoring mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthoringMode {
    Idle,
    DrawingCircle,
    DrawingPolygon,
}

/// In-progress circle. Each click replaces the center.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CircleDraft {
    pub center: Option<GeoPoint>,
    pub radius_meters: Option<f64>,
}

/// In-progress polygon. Raw clicks are kept so the hull can always be
/// recomputed from full history; only `hull` is displayed and saved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolygonDraft {
    raw_points: Vec<GeoPoint>,
    hull: Vec<GeoPoint>,
}

impl PolygonDraft {
    pub fn raw_points(&self) -> &[GeoPoint] {
        &self.raw_points
    }

    pub fn hull(&self) -> &[GeoPoint] {
        &self.hull
    }

    fn push(&mut self, point: GeoPoint) {
        self.raw_points.push(point);
        self.hull = hull_reduce(&self.raw_points);
    }

    fn pop(&mut self) -> Option<GeoPoint> {
        let removed = self.raw_points.pop();
        self.hull = hull_reduce(&self.raw_points);
        removed
    }
}

#[derive(Debug, Clone, PartialEq)]
enum DrawingState {
    Idle,
    Circle(CircleDraft),
    Polygon(PolygonDraft),
}

/// What the map surface should draw for the session in progress.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapePreview {
    None,
    Circle {
        center: Option<GeoPoint>,
        radius_meters: Option<f64>,
    },
    Polygon {
        vertices: Vec<GeoPoint>,
    },
}

/// Emitted after every change to the previewed geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeChanged {
    pub mode: AuthoringMode,
    pub preview: ShapePreview,
}

/// Authoring state for a single operator session.
#[derive(Debug)]
pub struct GeofenceAuthoring {
    state: DrawingState,
    name: String,
    status: ZoneStatus,
    events: broadcast::Sender<ShapeChanged>,
}

impl Default for GeofenceAuthoring {
    fn default() -> Self {
        Self::new()
    }
}

impl GeofenceAuthoring {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: DrawingState::Idle,
            name: String::new(),
            status: ZoneStatus::default(),
            events,
        }
    }

    /// Subscribes to shape change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<ShapeChanged> {
        self.events.subscribe()
    }

    pub fn mode(&self) -> AuthoringMode {
        match self.state {
            DrawingState::Idle => AuthoringMode::Idle,
            DrawingState::Circle(_) => AuthoringMode::DrawingCircle,
            DrawingState::Polygon(_) => AuthoringMode::DrawingPolygon,
        }
    }

    pub fn is_drawing(&self) -> bool {
        self.mode() != AuthoringMode::Idle
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> ZoneStatus {
        self.status
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_status(&mut self, status: ZoneStatus) {
        self.status = status;
    }

    pub fn circle(&self) -> Option<&CircleDraft> {
        match &self.state {
            DrawingState::Circle(draft) => Some(draft),
            _ => None,
        }
    }

    pub fn polygon(&self) -> Option<&PolygonDraft> {
        match &self.state {
            DrawingState::Polygon(draft) => Some(draft),
            _ => None,
        }
    }

    pub fn preview(&self) -> ShapePreview {
        match &self.state {
            DrawingState::Idle => ShapePreview::None,
            DrawingState::Circle(draft) => ShapePreview::Circle {
                center: draft.center,
                radius_meters: draft.radius_meters,
            },
            DrawingState::Polygon(draft) => ShapePreview::Polygon {
                vertices: draft.hull.clone(),
            },
        }
    }

    /// Enters circle mode, discarding any previous geometry.
    pub fn start_circle(&mut self) {
        debug!(previous = ?self.mode(), "Starting circle authoring");
        self.state = DrawingState::Circle(CircleDraft::default());
        self.notify();
    }

    /// Enters polygon mode, discarding any previous geometry.
    pub fn start_polygon(&mut self) {
        debug!(previous = ?self.mode(), "Starting polygon authoring");
        self.state = DrawingState::Polygon(PolygonDraft::default());
        self.notify();
    }

    /// Records a map click.
    ///
    /// In circle mode the click becomes the new center. In polygon mode it is
    /// appended to the raw click set and the hull is recomputed. Clicks while
    /// idle are ignored. Out-of-range coordinates are rejected without
    /// touching the drawing.
    pub fn record_click(&mut self, point: GeoPoint) -> Result<(), GeofenceError> {
        point.validate()?;

        match &mut self.state {
            DrawingState::Idle => {
                debug!(lat = point.lat, lng = point.lng, "Ignoring map click while idle");
                return Ok(());
            }
            DrawingState::Circle(draft) => {
                draft.center = Some(point);
                debug!(lat = point.lat, lng = point.lng, "Circle center set");
            }
            DrawingState::Polygon(draft) => {
                draft.push(point);
                debug!(
                    lat = point.lat,
                    lng = point.lng,
                    clicks = draft.raw_points.len(),
                    hull_vertices = draft.hull.len(),
                    "Polygon point added"
                );
            }
        }

        self.notify();
        Ok(())
    }

    /// Removes the most recent polygon click and recomputes the hull.
    pub fn undo_last_click(&mut self) -> Result<Option<GeoPoint>, GeofenceError> {
        let DrawingState::Polygon(draft) = &mut self.state else {
            return Err(GeofenceError::Validation(
                "Undo is only available while drawing a polygon".into(),
            ));
        };

        let removed = draft.pop();
        if removed.is_some() {
            self.notify();
        }
        Ok(removed)
    }

    /// Sets the circle radius in meters.
    pub fn set_radius(&mut self, radius_meters: f64) -> Result<(), GeofenceError> {
        let DrawingState::Circle(draft) = &mut self.state else {
            return Err(GeofenceError::Validation(
                "Radius can only be set while drawing a circle".into(),
            ));
        };

        shared::validation::validate_radius(radius_meters)?;
        draft.radius_meters = Some(radius_meters);
        self.notify();
        Ok(())
    }

    /// Validates the current drawing and builds the draft it would save,
    /// without leaving the drawing state.
    pub fn build_draft(&self) -> Result<GeofenceDraft, GeofenceError> {
        shared::validation::validate_geofence_name(&self.name)?;

        let shape = match &self.state {
            DrawingState::Idle => {
                return Err(GeofenceError::Validation(
                    "No geofence is being drawn".into(),
                ))
            }
            DrawingState::Circle(draft) => {
                let center = draft.center.ok_or_else(|| {
                    GeofenceError::Validation("Click on the map to set the circle center".into())
                })?;
                let radius = draft.radius_meters.ok_or_else(|| {
                    GeofenceError::Validation("Circle radius has not been set".into())
                })?;
                Shape::Circle(Circle::new(center, radius)?)
            }
            DrawingState::Polygon(draft) => Shape::Polygon(Polygon::new(draft.hull.clone())?),
        };

        Ok(GeofenceDraft {
            name: self.name.trim().to_string(),
            status: self.status,
            shape,
        })
    }

    /// Validates and emits the finished geofence, returning to idle.
    ///
    /// On failure the drawing is left intact so the operator can correct it.
    pub fn save(&mut self) -> Result<GeofenceDraft, GeofenceError> {
        let draft = self.build_draft()?;
        info!(
            name = %draft.name,
            status = %draft.status,
            shape = draft.shape.kind(),
            "Geofence authoring completed"
        );
        self.reset();
        Ok(draft)
    }

    /// Discards the session and returns to idle.
    ///
    /// Cancelling while already idle clears the name and status but emits no
    /// event, since the preview does not change.
    pub fn cancel(&mut self) {
        if self.is_drawing() {
            debug!(mode = ?self.mode(), "Geofence authoring cancelled");
            self.reset();
        } else {
            self.clear();
        }
    }

    pub(crate) fn reset(&mut self) {
        self.clear();
        self.notify();
    }

    fn clear(&mut self) {
        self.state = DrawingState::Idle;
        self.name.clear();
        self.status = ZoneStatus::default();
    }

    fn notify(&self) {
        // no subscribers is fine
        let _ = self.events.send(ShapeChanged {
            mode: self.mode(),
            preview: self.preview(),
        });
    }
}
