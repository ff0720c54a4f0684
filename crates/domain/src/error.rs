//! Domain error taxonomy for geofence authoring and vehicle assignment.

use thiserror::Error;

/// Boxed error raised by an external collaborator (transport, storage).
pub type CollaboratorError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by the geofence core.
///
/// `Validation`, `Conflict` and `NotFound` never mutate state. `Transport`
/// carries a collaborator failure through untouched.
#[derive(Debug, Error)]
pub enum GeofenceError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Transport(CollaboratorError),
}

impl GeofenceError {
    /// Wraps a collaborator failure without altering it.
    pub fn transport<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        GeofenceError::Transport(Box::new(err))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, GeofenceError::Validation(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, GeofenceError::Conflict(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, GeofenceError::NotFound(_))
    }
}

impl From<validator::ValidationError> for GeofenceError {
    fn from(err: validator::ValidationError) -> Self {
        let message = err
            .message
            .map(|m| m.to_string())
            .unwrap_or_else(|| err.code.to_string());
        GeofenceError::Validation(message)
    }
}

impl From<validator::ValidationErrors> for GeofenceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    e.message
                        .clone()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field))
                })
            })
            .collect();

        let message = if messages.len() == 1 {
            messages[0].clone()
        } else {
            format!("{} validation errors", messages.len())
        };

        GeofenceError::Validation(message)
    }
}
