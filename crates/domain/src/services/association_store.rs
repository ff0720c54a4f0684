//! Persistence seam for vehicle to geofence associations.
//!
//! Records are written whole: deactivation is an update of the stored record,
//! never a delete.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Mutex;
use uuid::Uuid;

use super::store::SimulatedFailure;
use crate::error::GeofenceError;
use crate::models::{GeofenceId, IdentityContext, VehicleGeofence, VehicleId};

#[async_trait::async_trait]
pub trait AssociationStore: Send + Sync {
    /// Persists a new association.
    async fn create(
        &self,
        identity: &IdentityContext,
        association: &VehicleGeofence,
    ) -> Result<VehicleGeofence, GeofenceError>;

    /// Replaces a stored association, e.g. after deactivation.
    async fn update(
        &self,
        identity: &IdentityContext,
        association: &VehicleGeofence,
    ) -> Result<VehicleGeofence, GeofenceError>;

    async fn find_by_id(
        &self,
        identity: &IdentityContext,
        association_id: Uuid,
    ) -> Result<Option<VehicleGeofence>, GeofenceError>;

    /// Every association of a vehicle, active and inactive.
    async fn list_by_vehicle(
        &self,
        identity: &IdentityContext,
        vehicle_id: VehicleId,
    ) -> Result<Vec<VehicleGeofence>, GeofenceError>;

    /// Every association of a geofence, active and inactive.
    async fn list_by_geofence(
        &self,
        identity: &IdentityContext,
        geofence_id: GeofenceId,
    ) -> Result<Vec<VehicleGeofence>, GeofenceError>;
}

/// In-process association store.
///
/// Like a unique index on active pairs, `create` refuses a second active
/// link for the same vehicle and geofence.
#[derive(Debug, Default)]
pub struct InMemoryAssociationStore {
    rows: Mutex<Vec<VehicleGeofence>>,
    simulate_failure: AtomicBool,
}

impl InMemoryAssociationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let store = Self::default();
        store.set_failing(true);
        store
    }

    pub fn set_failing(&self, failing: bool) {
        self.simulate_failure.store(failing, Ordering::Relaxed);
    }

    fn check_available(&self) -> Result<(), GeofenceError> {
        if self.simulate_failure.load(Ordering::Relaxed) {
            tracing::warn!("In-memory association store simulating failure");
            return Err(GeofenceError::transport(SimulatedFailure));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl AssociationStore for InMemoryAssociationStore {
    async fn create(
        &self,
        _identity: &IdentityContext,
        association: &VehicleGeofence,
    ) -> Result<VehicleGeofence, GeofenceError> {
        self.check_available()?;

        let mut rows = self.rows.lock().await;
        if rows.iter().any(|r| r.association_id == association.association_id) {
            return Err(GeofenceError::Conflict(format!(
                "Association {} already exists",
                association.association_id
            )));
        }
        let duplicate_active = association.is_active()
            && rows.iter().any(|r| {
                r.is_active() && r.links(association.vehicle_id, association.geofence_id)
            });
        if duplicate_active {
            return Err(GeofenceError::Conflict(format!(
                "Vehicle {} is already assigned to geofence {}",
                association.vehicle_id, association.geofence_id
            )));
        }

        rows.push(association.clone());
        Ok(association.clone())
    }

    async fn update(
        &self,
        _identity: &IdentityContext,
        association: &VehicleGeofence,
    ) -> Result<VehicleGeofence, GeofenceError> {
        self.check_available()?;

        let mut rows = self.rows.lock().await;
        let row = rows
            .iter_mut()
            .find(|r| r.association_id == association.association_id)
            .ok_or_else(|| {
                GeofenceError::NotFound(format!("Association {}", association.association_id))
            })?;
        *row = association.clone();
        Ok(row.clone())
    }

    async fn find_by_id(
        &self,
        _identity: &IdentityContext,
        association_id: Uuid,
    ) -> Result<Option<VehicleGeofence>, GeofenceError> {
        self.check_available()?;

        let rows = self.rows.lock().await;
        Ok(rows.iter().find(|r| r.association_id == association_id).cloned())
    }

    async fn list_by_vehicle(
        &self,
        _identity: &IdentityContext,
        vehicle_id: VehicleId,
    ) -> Result<Vec<VehicleGeofence>, GeofenceError> {
        self.check_available()?;

        let rows = self.rows.lock().await;
        Ok(rows.iter().filter(|r| r.vehicle_id == vehicle_id).cloned().collect())
    }

    async fn list_by_geofence(
        &self,
        _identity: &IdentityContext,
        geofence_id: GeofenceId,
    ) -> Result<Vec<VehicleGeofence>, GeofenceError> {
        self.check_available()?;

        let rows = self.rows.lock().await;
        Ok(rows.iter().filter(|r| r.geofence_id == geofence_id).cloned().collect())
    }
}
