//! REST client for vehicle to geofence associations.
//!
//! Associations travel as their camelCase JSON records. Deactivation is a
//! `PUT` of the updated record; the API never deletes associations.

use async_trait::async_trait;
use domain::models::{GeofenceId, IdentityContext, VehicleGeofence, VehicleId};
use domain::services::AssociationStore;
use domain::GeofenceError;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::client::PersistenceClient;

/// Response for listing associations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAssociationsResponse {
    pub associations: Vec<VehicleGeofence>,
    pub total: usize,
}

pub fn vehicle_geofences_path(vehicle_id: VehicleId) -> String {
    format!("/api/v1/vehicles/{}/geofences", vehicle_id)
}

pub fn geofence_vehicles_path(geofence_id: GeofenceId) -> String {
    format!("/api/v1/geofences/{}/vehicles", geofence_id)
}

pub fn association_path(association_id: Uuid) -> String {
    format!("/api/v1/vehicle-geofences/{}", association_id)
}

/// HTTP-backed association store.
pub struct RestAssociationStore {
    api: PersistenceClient,
}

impl RestAssociationStore {
    pub fn with_client(api: PersistenceClient) -> Self {
        Self { api }
    }

    async fn list(
        &self,
        operation: &'static str,
        path: &str,
    ) -> Result<Vec<VehicleGeofence>, GeofenceError> {
        let request = self.api.request(Method::GET, path);
        let response: ListAssociationsResponse = self.api.execute_json(operation, request).await?;
        Ok(response.associations)
    }
}

#[async_trait]
impl AssociationStore for RestAssociationStore {
    async fn create(
        &self,
        _identity: &IdentityContext,
        association: &VehicleGeofence,
    ) -> Result<VehicleGeofence, GeofenceError> {
        let request = self
            .api
            .request(Method::POST, &vehicle_geofences_path(association.vehicle_id))
            .json(association);
        Ok(self.api.execute_json("create_association", request).await?)
    }

    async fn update(
        &self,
        _identity: &IdentityContext,
        association: &VehicleGeofence,
    ) -> Result<VehicleGeofence, GeofenceError> {
        let request = self
            .api
            .request(Method::PUT, &association_path(association.association_id))
            .json(association);
        Ok(self.api.execute_json("update_association", request).await?)
    }

    async fn find_by_id(
        &self,
        _identity: &IdentityContext,
        association_id: Uuid,
    ) -> Result<Option<VehicleGeofence>, GeofenceError> {
        let request = self.api.request(Method::GET, &association_path(association_id));
        Ok(self.api.fetch_optional("find_association", request).await?)
    }

    async fn list_by_vehicle(
        &self,
        _identity: &IdentityContext,
        vehicle_id: VehicleId,
    ) -> Result<Vec<VehicleGeofence>, GeofenceError> {
        self.list("list_vehicle_associations", &vehicle_geofences_path(vehicle_id))
            .await
    }

    async fn list_by_geofence(
        &self,
        _identity: &IdentityContext,
        geofence_id: GeofenceId,
    ) -> Result<Vec<VehicleGeofence>, GeofenceError> {
        self.list("list_geofence_associations", &geofence_vehicles_path(geofence_id))
            .await
    }
}
