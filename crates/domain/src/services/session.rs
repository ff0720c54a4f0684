//! Asynchronous authoring session.
//!
//! Wraps [`GeofenceAuthoring`] with the persistence round trip. Only one save
//! may be in flight per session; a second request is rejected with
//! `Conflict`, and so are edits to the drawing being saved. Cancelling (or
//! starting a new shape) while a save is in flight resets local state at once
//! and the late response is discarded.

use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};
use tracing::{error, info, warn};

use super::authoring::{AuthoringMode, GeofenceAuthoring, ShapeChanged, ShapePreview};
use super::map_surface::{MapSurface, RenderScene};
use super::store::GeofenceStore;
use crate::error::GeofenceError;
use crate::models::{GeoPoint, Geofence, IdentityContext, ZoneStatus};

/// Result of a save that reached the store.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// The geofence was stored and the session is idle again.
    Saved(Geofence),
    /// The session was cancelled while the request was in flight; the
    /// response was ignored.
    Discarded,
}

#[derive(Debug)]
struct SessionState {
    authoring: GeofenceAuthoring,
    /// Bumped whenever local state is abandoned.
    generation: u64,
    /// Generation of the save currently awaiting the store.
    in_flight: Option<u64>,
}

impl SessionState {
    fn abandon(&mut self) {
        self.generation += 1;
        self.in_flight = None;
    }

    /// The drawing, unless it is currently being saved.
    fn editable(&mut self) -> Result<&mut GeofenceAuthoring, GeofenceError> {
        if self.in_flight.is_some() {
            warn!("Rejected edit while the geofence is being saved");
            return Err(GeofenceError::Conflict(
                "The geofence is being saved; wait for the save to finish or cancel it".into(),
            ));
        }
        Ok(&mut self.authoring)
    }
}

/// One operator's geofence authoring context.
pub struct AuthoringSession {
    store: Arc<dyn GeofenceStore>,
    identity: IdentityContext,
    state: Mutex<SessionState>,
}

impl AuthoringSession {
    pub fn new(store: Arc<dyn GeofenceStore>, identity: IdentityContext) -> Self {
        Self {
            store,
            identity,
            state: Mutex::new(SessionState {
                authoring: GeofenceAuthoring::new(),
                generation: 0,
                in_flight: None,
            }),
        }
    }

    pub fn identity(&self) -> &IdentityContext {
        &self.identity
    }

    pub async fn subscribe(&self) -> broadcast::Receiver<ShapeChanged> {
        self.state.lock().await.authoring.subscribe()
    }

    pub async fn mode(&self) -> AuthoringMode {
        self.state.lock().await.authoring.mode()
    }

    pub async fn preview(&self) -> ShapePreview {
        self.state.lock().await.authoring.preview()
    }

    pub async fn is_saving(&self) -> bool {
        self.state.lock().await.in_flight.is_some()
    }

    pub async fn start_circle(&self) {
        let mut state = self.state.lock().await;
        state.abandon();
        state.authoring.start_circle();
    }

    pub async fn start_polygon(&self) {
        let mut state = self.state.lock().await;
        state.abandon();
        state.authoring.start_polygon();
    }

    /// Map click handler.
    pub async fn record_click(&self, point: GeoPoint) -> Result<(), GeofenceError> {
        self.state.lock().await.editable()?.record_click(point)
    }

    pub async fn undo_last_click(&self) -> Result<Option<GeoPoint>, GeofenceError> {
        self.state.lock().await.editable()?.undo_last_click()
    }

    pub async fn set_radius(&self, radius_meters: f64) -> Result<(), GeofenceError> {
        self.state.lock().await.editable()?.set_radius(radius_meters)
    }

    pub async fn set_name(&self, name: impl Into<String>) -> Result<(), GeofenceError> {
        self.state.lock().await.editable()?.set_name(name);
        Ok(())
    }

    pub async fn set_status(&self, status: ZoneStatus) -> Result<(), GeofenceError> {
        self.state.lock().await.editable()?.set_status(status);
        Ok(())
    }

    /// Discards the drawing. An in-flight save keeps running but its
    /// response will be ignored.
    pub async fn cancel(&self) {
        let mut state = self.state.lock().await;
        if state.in_flight.is_some() {
            warn!("Cancelling authoring session with a save in flight");
        }
        state.abandon();
        state.authoring.cancel();
    }

    /// Validates the drawing and persists it.
    ///
    /// Validation failures and store errors leave the drawing intact.
    pub async fn save(&self) -> Result<SaveOutcome, GeofenceError> {
        let (draft, generation) = {
            let mut state = self.state.lock().await;
            if state.in_flight.is_some() {
                warn!("Rejected save while another save is in flight");
                return Err(GeofenceError::Conflict(
                    "A save is already in progress for this geofence".into(),
                ));
            }
            let draft = state.authoring.build_draft()?;
            state.in_flight = Some(state.generation);
            (draft, state.generation)
        };

        let result = self.store.create(&self.identity, &draft).await;

        let mut state = self.state.lock().await;
        if state.generation != generation {
            warn!(
                name = %draft.name,
                succeeded = result.is_ok(),
                "Discarding save response for an abandoned session"
            );
            return Ok(SaveOutcome::Discarded);
        }
        state.in_flight = None;

        match result {
            Ok(geofence) => {
                state.authoring.reset();
                info!(
                    geofence_id = geofence.geofence_id,
                    manager_id = geofence.manager_id,
                    name = %geofence.name,
                    shape = geofence.shape.kind(),
                    "Geofence saved"
                );
                Ok(SaveOutcome::Saved(geofence))
            }
            Err(e) => {
                error!(error = %e, name = %draft.name, "Failed to save geofence");
                Err(e)
            }
        }
    }

    /// Draws the current preview together with `geofences`.
    pub async fn render(&self, surface: &dyn MapSurface, geofences: &[Geofence]) {
        let preview = self.preview().await;
        surface.render(&RenderScene { preview, geofences });
    }
}
