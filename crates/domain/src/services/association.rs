//! Vehicle to geofence association manager.
//!
//! At most one `Active` association may exist per (vehicle, geofence) pair.
//! Removal is a soft transition to `Inactive`; records are kept as history.

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::GeofenceError;
use crate::models::{
    AssignmentState, GeofenceId, IdentityContext, VehicleGeofence, VehicleId,
};

#[derive(Debug, Default)]
pub struct VehicleGeofenceManager {
    /// Insertion order is preserved so equal timestamps list newest first.
    records: Vec<VehicleGeofence>,
}

impl VehicleGeofenceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hydrates the manager from previously fetched associations.
    ///
    /// Fails with `Conflict` if the records hold two active links for the
    /// same pair.
    pub fn with_records(records: Vec<VehicleGeofence>) -> Result<Self, GeofenceError> {
        let mut manager = Self::new();
        for record in records {
            let duplicate = record.is_active()
                && manager
                    .active_link(record.vehicle_id, record.geofence_id)
                    .is_some();
            if duplicate {
                return Err(GeofenceError::Conflict(format!(
                    "Vehicle {} has more than one active assignment to geofence {}",
                    record.vehicle_id, record.geofence_id
                )));
            }
            manager.records.push(record);
        }
        Ok(manager)
    }

    /// Assigns a vehicle to a geofence.
    pub fn assign(
        &mut self,
        identity: &IdentityContext,
        vehicle_id: VehicleId,
        geofence_id: GeofenceId,
        notes: Option<String>,
    ) -> Result<VehicleGeofence, GeofenceError> {
        if let Some(notes) = notes.as_deref() {
            shared::validation::validate_notes(notes)?;
        }

        if let Some(existing) = self.active_link(vehicle_id, geofence_id) {
            warn!(
                vehicle_id,
                geofence_id,
                association_id = %existing.association_id,
                "Rejected duplicate active vehicle assignment"
            );
            return Err(GeofenceError::Conflict(format!(
                "Vehicle {} is already assigned to geofence {}",
                vehicle_id, geofence_id
            )));
        }

        let association = VehicleGeofence {
            association_id: Uuid::new_v4(),
            vehicle_id,
            geofence_id,
            assignment_state: AssignmentState::Active,
            assigned_by: identity.manager_id,
            assigned_at: Utc::now(),
            deactivated_at: None,
            notes: notes.filter(|n| !n.trim().is_empty()),
        };

        info!(
            vehicle_id,
            geofence_id,
            association_id = %association.association_id,
            assigned_by = identity.manager_id,
            "Vehicle assigned to geofence"
        );

        self.records.push(association.clone());
        Ok(association)
    }

    /// Deactivates an association, keeping it as history.
    ///
    /// Unknown and already inactive associations both fail with `NotFound`.
    pub fn deactivate(&mut self, association_id: Uuid) -> Result<VehicleGeofence, GeofenceError> {
        let record = self
            .records
            .iter_mut()
            .find(|r| r.association_id == association_id && r.is_active())
            .ok_or_else(|| {
                warn!(%association_id, "No active association to deactivate");
                GeofenceError::NotFound(format!("Active association {}", association_id))
            })?;

        record.assignment_state = AssignmentState::Inactive;
        record.deactivated_at = Some(Utc::now());

        info!(
            %association_id,
            vehicle_id = record.vehicle_id,
            geofence_id = record.geofence_id,
            "Vehicle assignment deactivated"
        );

        Ok(record.clone())
    }

    pub fn find(&self, association_id: Uuid) -> Option<&VehicleGeofence> {
        self.records.iter().find(|r| r.association_id == association_id)
    }

    /// All associations for a geofence, newest first.
    pub fn list_for_geofence(&self, geofence_id: GeofenceId) -> Vec<VehicleGeofence> {
        self.newest_first(|r| r.geofence_id == geofence_id)
    }

    /// All associations for a vehicle, newest first.
    pub fn list_for_vehicle(&self, vehicle_id: VehicleId) -> Vec<VehicleGeofence> {
        self.newest_first(|r| r.vehicle_id == vehicle_id)
    }

    /// Geofences a vehicle is currently assigned to.
    pub fn active_for_vehicle(&self, vehicle_id: VehicleId) -> Vec<GeofenceId> {
        self.records
            .iter()
            .filter(|r| r.vehicle_id == vehicle_id && r.is_active())
            .map(|r| r.geofence_id)
            .collect()
    }

    fn active_link(&self, vehicle_id: VehicleId, geofence_id: GeofenceId) -> Option<&VehicleGeofence> {
        self.records
            .iter()
            .find(|r| r.links(vehicle_id, geofence_id) && r.is_active())
    }

    fn newest_first(&self, keep: impl Fn(&VehicleGeofence) -> bool) -> Vec<VehicleGeofence> {
        let mut matching: Vec<VehicleGeofence> =
            self.records.iter().rev().filter(|r| keep(*r)).cloned().collect();
        // stable: ties stay in reverse insertion order
        matching.sort_by(|a, b| b.assigned_at.cmp(&a.assigned_at));
        matching
    }
}
