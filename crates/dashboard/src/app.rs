//! Operator-side runtime.
//!
//! Wires one authoring session and one assignment service to the
//! persistence stores for a single acting identity.

use std::sync::Arc;

use domain::models::{Geofence, IdentityContext, VehicleId};
use domain::services::{
    AssignmentService, AssociationStore, AuthoringSession, GeofenceStore, MapSurface,
};
use domain::GeofenceError;
use tracing::info;

use crate::config::Config;
use crate::error::ApiClientError;
use crate::services::{PersistenceClient, RestAssociationStore, RestGeofenceStore};

/// A stored geofence with the vehicles currently assigned to it.
#[derive(Debug, Clone, PartialEq)]
pub struct GeofenceOverview {
    pub geofence: Geofence,
    pub active_vehicles: Vec<VehicleId>,
}

pub struct Dashboard {
    identity: IdentityContext,
    geofences: Arc<dyn GeofenceStore>,
    session: AuthoringSession,
    assignments: AssignmentService,
}

impl Dashboard {
    /// Builds a dashboard backed by the REST persistence API.
    pub fn connect(config: &Config) -> Result<Self, ApiClientError> {
        let api = PersistenceClient::new(&config.api)?;
        info!(
            base_url = api.base_url(),
            manager_id = config.identity.manager_id,
            "Persistence API client ready"
        );

        Ok(Self::with_stores(
            Arc::new(RestGeofenceStore::with_client(api.clone())),
            Arc::new(RestAssociationStore::with_client(api)),
            config.identity.context(),
        ))
    }

    pub fn with_stores(
        geofences: Arc<dyn GeofenceStore>,
        associations: Arc<dyn AssociationStore>,
        identity: IdentityContext,
    ) -> Self {
        Self {
            identity,
            session: AuthoringSession::new(geofences.clone(), identity),
            assignments: AssignmentService::new(geofences.clone(), associations, identity),
            geofences,
        }
    }

    pub fn identity(&self) -> &IdentityContext {
        &self.identity
    }

    pub fn session(&self) -> &AuthoringSession {
        &self.session
    }

    pub fn assignments(&self) -> &AssignmentService {
        &self.assignments
    }

    /// Visible geofences with their active vehicles.
    pub async fn overview(&self) -> Result<Vec<GeofenceOverview>, GeofenceError> {
        let geofences = self.geofences.list(&self.identity).await?;

        let mut overview = Vec::with_capacity(geofences.len());
        for geofence in geofences {
            let active_vehicles = self
                .assignments
                .list_for_geofence(geofence.geofence_id)
                .await?
                .into_iter()
                .filter(|a| a.is_active())
                .map(|a| a.vehicle_id)
                .collect();
            overview.push(GeofenceOverview {
                geofence,
                active_vehicles,
            });
        }

        info!(count = overview.len(), "Loaded geofence overview");
        Ok(overview)
    }

    /// Reloads the visible geofences and draws them with the current preview.
    pub async fn refresh(&self, surface: &dyn MapSurface) -> Result<Vec<Geofence>, GeofenceError> {
        let geofences = self.geofences.list(&self.identity).await?;
        self.session.render(surface, &geofences).await;
        Ok(geofences)
    }
}
