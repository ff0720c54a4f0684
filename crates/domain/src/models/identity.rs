//! Acting identity threaded through every core operation.

use serde::{Deserialize, Serialize};

use super::geofence::ManagerId;

/// Organization identifier.
pub type OrganizationId = i64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorRole {
    #[default]
    Manager,
    Admin,
}

/// Who is acting. Determines ownership of new geofences and the scope of
/// geofence listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityContext {
    pub manager_id: ManagerId,
    pub organization_id: Option<OrganizationId>,
    pub role: ActorRole,
}

/// Listing scope derived from an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    Manager(ManagerId),
    Organization(OrganizationId),
}

impl IdentityContext {
    pub fn manager(manager_id: ManagerId) -> Self {
        Self {
            manager_id,
            organization_id: None,
            role: ActorRole::Manager,
        }
    }

    pub fn admin(manager_id: ManagerId, organization_id: OrganizationId) -> Self {
        Self {
            manager_id,
            organization_id: Some(organization_id),
            role: ActorRole::Admin,
        }
    }

    /// Admins with an organization see the whole organization; everyone else
    /// sees the geofences they own.
    pub fn list_scope(&self) -> ListScope {
        match (self.role, self.organization_id) {
            (ActorRole::Admin, Some(org)) => ListScope::Organization(org),
            _ => ListScope::Manager(self.manager_id),
        }
    }
}
