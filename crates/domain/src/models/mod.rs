//! Domain models for fleet geofencing.

pub mod geo_point;
pub mod geofence;
pub mod identity;
pub mod vehicle_geofence;

pub use geo_point::GeoPoint;
pub use geofence::{
    Circle, Geofence, GeofenceDraft, GeofenceId, GeofenceUpdate, ManagerId, Polygon, Shape,
    ZoneStatus,
};
pub use identity::{ActorRole, IdentityContext, ListScope, OrganizationId};
pub use vehicle_geofence::{AssignmentState, VehicleGeofence, VehicleId};
