//! REST client for the geofence persistence API.
//!
//! Implements [`GeofenceStore`] over HTTP. Request bodies use the GeoJSON
//! wire format from `domain::services::serializer`; failures are handed back
//! as transport errors without retrying.

use async_trait::async_trait;
use domain::models::{
    Geofence, GeofenceDraft, GeofenceId, GeofenceUpdate, IdentityContext, ListScope, Shape,
};
use domain::services::serializer::{record_from_wire, to_wire, GeofenceRecordWire};
use domain::services::GeofenceStore;
use domain::GeofenceError;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::client::PersistenceClient;
use crate::config::ApiConfig;
use crate::error::ApiClientError;

/// Response for listing geofences.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListGeofencesResponse {
    pub geofences: Vec<GeofenceRecordWire>,
    pub total: usize,
}

/// Path of the creation endpoint for a draft's shape.
pub fn create_path(identity: &IdentityContext, draft: &GeofenceDraft) -> String {
    let kind = match draft.shape {
        Shape::Circle(_) => "circle",
        Shape::Polygon(_) => "polygon",
    };
    format!("/api/v1/managers/{}/geofences/{}", identity.manager_id, kind)
}

/// Path of the listing endpoint visible to `identity`.
pub fn list_path(identity: &IdentityContext) -> String {
    match identity.list_scope() {
        ListScope::Manager(manager_id) => format!("/api/v1/managers/{}/geofences", manager_id),
        ListScope::Organization(org) => format!("/api/v1/organizations/{}/geofences", org),
    }
}

pub fn geofence_path(geofence_id: GeofenceId) -> String {
    format!("/api/v1/geofences/{}", geofence_id)
}

/// HTTP-backed geofence store.
pub struct RestGeofenceStore {
    api: PersistenceClient,
}

impl RestGeofenceStore {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiClientError> {
        Ok(Self::with_client(PersistenceClient::new(config)?))
    }

    pub fn with_client(api: PersistenceClient) -> Self {
        Self { api }
    }

    pub fn base_url(&self) -> &str {
        self.api.base_url()
    }

    fn decode(record: &GeofenceRecordWire) -> Result<Geofence, ApiClientError> {
        record_from_wire(record).map_err(|e| ApiClientError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl GeofenceStore for RestGeofenceStore {
    async fn create(
        &self,
        identity: &IdentityContext,
        draft: &GeofenceDraft,
    ) -> Result<Geofence, GeofenceError> {
        let request = self
            .api
            .request(Method::POST, &create_path(identity, draft))
            .json(&to_wire(draft));

        let record: GeofenceRecordWire = self.api.execute_json("create_geofence", request).await?;
        Ok(Self::decode(&record)?)
    }

    async fn update(
        &self,
        _identity: &IdentityContext,
        geofence_id: GeofenceId,
        update: &GeofenceUpdate,
    ) -> Result<Geofence, GeofenceError> {
        update.validate()?;
        if update.is_empty() {
            return Err(GeofenceError::Validation(
                "Nothing to update: provide a name or a status".into(),
            ));
        }

        let request = self
            .api
            .request(Method::PUT, &geofence_path(geofence_id))
            .json(update);

        let record: GeofenceRecordWire = self.api.execute_json("update_geofence", request).await?;
        Ok(Self::decode(&record)?)
    }

    async fn delete(
        &self,
        _identity: &IdentityContext,
        geofence_id: GeofenceId,
    ) -> Result<(), GeofenceError> {
        let request = self.api.request(Method::DELETE, &geofence_path(geofence_id));
        self.api.execute("delete_geofence", request).await?;
        Ok(())
    }

    async fn list(&self, identity: &IdentityContext) -> Result<Vec<Geofence>, GeofenceError> {
        let request = self.api.request(Method::GET, &list_path(identity));
        let response: ListGeofencesResponse =
            self.api.execute_json("list_geofences", request).await?;

        let geofences = response
            .geofences
            .iter()
            .map(Self::decode)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(geofences)
    }

    async fn find(
        &self,
        _identity: &IdentityContext,
        geofence_id: GeofenceId,
    ) -> Result<Option<Geofence>, GeofenceError> {
        let request = self.api.request(Method::GET, &geofence_path(geofence_id));
        let record: Option<GeofenceRecordWire> =
            self.api.fetch_optional("find_geofence", request).await?;

        match record {
            Some(record) => Ok(Some(Self::decode(&record)?)),
            None => Ok(None),
        }
    }
}
