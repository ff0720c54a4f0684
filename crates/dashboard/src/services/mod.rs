//! External collaborators of the geofence core.

pub mod association_api;
pub mod client;
pub mod geofence_api;

pub use association_api::{ListAssociationsResponse, RestAssociationStore};
pub use client::PersistenceClient;
pub use geofence_api::{ListGeofencesResponse, RestGeofenceStore};
