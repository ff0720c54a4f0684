//! Vehicle to geofence association model.
//!
//! Associations are never deleted. Removing a vehicle from a zone flips the
//! record to `Inactive` so past assignments stay queryable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::geofence::{GeofenceId, ManagerId};

/// Vehicle identifier as issued by the fleet API.
pub type VehicleId = i64;

/// Lifecycle state of an association.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignmentState {
    Active,
    Inactive,
}

impl AssignmentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
        }
    }
}

impl std::fmt::Display for AssignmentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Assignment of a vehicle to a geofence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleGeofence {
    pub association_id: Uuid,
    pub vehicle_id: VehicleId,
    pub geofence_id: GeofenceId,
    pub assignment_state: AssignmentState,
    pub assigned_by: ManagerId,
    pub assigned_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deactivated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl VehicleGeofence {
    pub fn is_active(&self) -> bool {
        self.assignment_state == AssignmentState::Active
    }

    pub fn links(&self, vehicle_id: VehicleId, geofence_id: GeofenceId) -> bool {
        self.vehicle_id == vehicle_id && self.geofence_id == geofence_id
    }
}
