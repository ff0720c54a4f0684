//! Asynchronous vehicle assignment workflow.
//!
//! Combines the association rules of [`VehicleGeofenceManager`] with the
//! geofence and association stores. The stores are the source of truth: each
//! operation loads the records it needs, applies the rules locally and
//! writes the result back. One request may be in flight per service; a
//! concurrent one is rejected with `Conflict`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use super::association::VehicleGeofenceManager;
use super::association_store::AssociationStore;
use super::store::GeofenceStore;
use crate::error::GeofenceError;
use crate::models::{GeofenceId, IdentityContext, VehicleGeofence, VehicleId};

pub struct AssignmentService {
    geofences: Arc<dyn GeofenceStore>,
    associations: Arc<dyn AssociationStore>,
    identity: IdentityContext,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag when the request finishes, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl AssignmentService {
    pub fn new(
        geofences: Arc<dyn GeofenceStore>,
        associations: Arc<dyn AssociationStore>,
        identity: IdentityContext,
    ) -> Self {
        Self {
            geofences,
            associations,
            identity,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn identity(&self) -> &IdentityContext {
        &self.identity
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn begin(&self) -> Result<InFlight<'_>, GeofenceError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| {
                warn!("Rejected assignment request while another is in flight");
                GeofenceError::Conflict("An assignment request is already in progress".into())
            })?;
        Ok(InFlight(&self.in_flight))
    }

    /// Assigns a vehicle to a stored geofence.
    ///
    /// Fails with `NotFound` if the geofence is not visible to the acting
    /// identity and with `Conflict` if the pair is already actively linked.
    pub async fn assign(
        &self,
        vehicle_id: VehicleId,
        geofence_id: GeofenceId,
        notes: Option<String>,
    ) -> Result<VehicleGeofence, GeofenceError> {
        let _guard = self.begin()?;

        if self.geofences.find(&self.identity, geofence_id).await?.is_none() {
            warn!(vehicle_id, geofence_id, "Assignment to unknown geofence");
            return Err(GeofenceError::NotFound(format!("Geofence {}", geofence_id)));
        }

        let history = self
            .associations
            .list_by_vehicle(&self.identity, vehicle_id)
            .await?;
        let mut manager = VehicleGeofenceManager::with_records(history)?;
        let association = manager.assign(&self.identity, vehicle_id, geofence_id, notes)?;

        self.associations.create(&self.identity, &association).await
    }

    /// Deactivates a stored association, keeping it as history.
    pub async fn deactivate(&self, association_id: Uuid) -> Result<VehicleGeofence, GeofenceError> {
        let _guard = self.begin()?;

        let record = self
            .associations
            .find_by_id(&self.identity, association_id)
            .await?
            .ok_or_else(|| GeofenceError::NotFound(format!("Association {}", association_id)))?;

        let mut manager = VehicleGeofenceManager::with_records(vec![record])?;
        let deactivated = manager.deactivate(association_id)?;

        self.associations.update(&self.identity, &deactivated).await
    }

    /// All associations of a geofence, newest first.
    pub async fn list_for_geofence(
        &self,
        geofence_id: GeofenceId,
    ) -> Result<Vec<VehicleGeofence>, GeofenceError> {
        let records = self
            .associations
            .list_by_geofence(&self.identity, geofence_id)
            .await?;
        Ok(VehicleGeofenceManager::with_records(records)?.list_for_geofence(geofence_id))
    }

    /// All associations of a vehicle, newest first.
    pub async fn list_for_vehicle(
        &self,
        vehicle_id: VehicleId,
    ) -> Result<Vec<VehicleGeofence>, GeofenceError> {
        let records = self
            .associations
            .list_by_vehicle(&self.identity, vehicle_id)
            .await?;
        Ok(VehicleGeofenceManager::with_records(records)?.list_for_vehicle(vehicle_id))
    }

    /// Geofences a vehicle is currently assigned to.
    pub async fn active_for_vehicle(
        &self,
        vehicle_id: VehicleId,
    ) -> Result<Vec<GeofenceId>, GeofenceError> {
        let records = self
            .associations
            .list_by_vehicle(&self.identity, vehicle_id)
            .await?;
        Ok(VehicleGeofenceManager::with_records(records)?.active_for_vehicle(vehicle_id))
    }
}
