//! Persistence seam for geofences.
//!
//! Storage lives outside the core. The dashboard talks to it over REST; tests
//! and offline tooling use [`InMemoryGeofenceStore`].

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Mutex;
use validator::Validate;

use crate::error::GeofenceError;
use crate::models::{
    Geofence, GeofenceDraft, GeofenceId, GeofenceUpdate, IdentityContext, ListScope,
    OrganizationId,
};

/// Geofence persistence operations, scoped by the acting identity.
#[async_trait::async_trait]
pub trait GeofenceStore: Send + Sync {
    /// Persists a new geofence owned by `identity.manager_id`.
    async fn create(
        &self,
        identity: &IdentityContext,
        draft: &GeofenceDraft,
    ) -> Result<Geofence, GeofenceError>;

    /// Renames and/or reclassifies a geofence.
    async fn update(
        &self,
        identity: &IdentityContext,
        geofence_id: GeofenceId,
        update: &GeofenceUpdate,
    ) -> Result<Geofence, GeofenceError>;

    async fn delete(
        &self,
        identity: &IdentityContext,
        geofence_id: GeofenceId,
    ) -> Result<(), GeofenceError>;

    /// Lists the geofences visible to `identity`.
    async fn list(&self, identity: &IdentityContext) -> Result<Vec<Geofence>, GeofenceError>;

    /// Looks up one geofence visible to `identity`.
    ///
    /// The default scans [`GeofenceStore::list`]; stores with a direct lookup
    /// should override it.
    async fn find(
        &self,
        identity: &IdentityContext,
        geofence_id: GeofenceId,
    ) -> Result<Option<Geofence>, GeofenceError> {
        Ok(self
            .list(identity)
            .await?
            .into_iter()
            .find(|g| g.geofence_id == geofence_id))
    }
}

#[derive(Debug, Clone)]
struct StoredGeofence {
    organization_id: Option<OrganizationId>,
    geofence: Geofence,
}

#[derive(Debug, Default)]
struct StoreState {
    next_id: GeofenceId,
    rows: Vec<StoredGeofence>,
}

/// In-process geofence store.
#[derive(Debug, Default)]
pub struct InMemoryGeofenceStore {
    state: Mutex<StoreState>,
    /// Whether to simulate collaborator failures for testing.
    simulate_failure: AtomicBool,
}

/// Failure raised by [`InMemoryGeofenceStore`] when simulating an outage.
#[derive(Debug, thiserror::Error)]
#[error("simulated persistence failure")]
pub struct SimulatedFailure;

impl InMemoryGeofenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store whose operations fail with a transport error.
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
            tracing::warn!("In-memory geofence store simulating failure");
            return Err(GeofenceError::transport(SimulatedFailure));
        }
        Ok(())
    }

    fn visible(identity: &IdentityContext, row: &StoredGeofence) -> bool {
        match identity.list_scope() {
            ListScope::Manager(manager_id) => row.geofence.manager_id == manager_id,
            ListScope::Organization(org) => row.organization_id == Some(org),
        }
    }
}

#[async_trait::async_trait]
impl GeofenceStore for InMemoryGeofenceStore {
    async fn create(
        &self,
        identity: &IdentityContext,
        draft: &GeofenceDraft,
    ) -> Result<Geofence, GeofenceError> {
        self.check_available()?;

        let mut state = self.state.lock().await;
        state.next_id += 1;
        let geofence = Geofence::from_draft(state.next_id, identity.manager_id, draft.clone());
        state.rows.push(StoredGeofence {
            organization_id: identity.organization_id,
            geofence: geofence.clone(),
        });
        Ok(geofence)
    }

    async fn update(
        &self,
        identity: &IdentityContext,
        geofence_id: GeofenceId,
        update: &GeofenceUpdate,
    ) -> Result<Geofence, GeofenceError> {
        self.check_available()?;
        update.validate()?;

        let mut state = self.state.lock().await;
        let row = state
            .rows
            .iter_mut()
            .find(|row| row.geofence.geofence_id == geofence_id && Self::visible(identity, row))
            .ok_or_else(|| GeofenceError::NotFound(format!("Geofence {}", geofence_id)))?;

        row.geofence.apply(update);
        Ok(row.geofence.clone())
    }

    async fn delete(
        &self,
        identity: &IdentityContext,
        geofence_id: GeofenceId,
    ) -> Result<(), GeofenceError> {
        self.check_available()?;

        let mut state = self.state.lock().await;
        let before = state.rows.len();
        state
            .rows
            .retain(|row| !(row.geofence.geofence_id == geofence_id && Self::visible(identity, row)));

        if state.rows.len() == before {
            return Err(GeofenceError::NotFound(format!("Geofence {}", geofence_id)));
        }
        Ok(())
    }

    async fn list(&self, identity: &IdentityContext) -> Result<Vec<Geofence>, GeofenceError> {
        self.check_available()?;

        let state = self.state.lock().await;
        Ok(state
            .rows
            .iter()
            .filter(|row| Self::visible(identity, row))
            .map(|row| row.geofence.clone())
            .collect())
    }

    async fn find(
        &self,
        identity: &IdentityContext,
        geofence_id: GeofenceId,
    ) -> Result<Option<Geofence>, GeofenceError> {
        self.check_available()?;

        let state = self.state.lock().await;
        Ok(state
            .rows
            .iter()
            .find(|row| row.geofence.geofence_id == geofence_id && Self::visible(identity, row))
            .map(|row| row.geofence.clone()))
    }
}
