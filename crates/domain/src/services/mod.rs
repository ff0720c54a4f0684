//! Domain services for geofence authoring and vehicle assignment.
//!
//! Services contain business logic that operates on domain models.

pub mod assignment;
pub mod association;
pub mod association_store;
pub mod authoring;
pub mod convex_hull;
pub mod map_surface;
pub mod serializer;
pub mod session;
pub mod store;

pub use assignment::AssignmentService;
pub use association::VehicleGeofenceManager;
pub use association_store::{AssociationStore, InMemoryAssociationStore};
pub use authoring::{
    AuthoringMode, CircleDraft, GeofenceAuthoring, PolygonDraft, ShapeChanged, ShapePreview,
};
pub use convex_hull::hull_reduce;
pub use map_surface::{MapSurface, RenderScene};
pub use serializer::{GeofenceRecordWire, GeofenceWire};
pub use session::{AuthoringSession, SaveOutcome};
pub use store::{GeofenceStore, InMemoryGeofenceStore};
