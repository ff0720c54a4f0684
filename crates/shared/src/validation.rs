//! Common validation utilities.

use validator::ValidationError;

/// Maximum length of a geofence name, counted after trimming.
pub const MAX_GEOFENCE_NAME_LENGTH: usize = 100;

/// Maximum length of free-form assignment notes.
pub const MAX_NOTES_LENGTH: usize = 500;

/// Validates that a latitude value is within valid range (-90 to 90).
pub fn validate_latitude(lat: f64) -> Result<(), ValidationError> {
    if (-90.0..=90.0).contains(&lat) {
        Ok(())
    } else {
        let mut err = ValidationError::new("latitude_range");
        err.message = Some("Latitude must be between -90 and 90".into());
        Err(err)
    }
}

/// Validates that a longitude value is within valid range (-180 to 180).
pub fn validate_longitude(lon: f64) -> Result<(), ValidationError> {
    if (-180.0..=180.0).contains(&lon) {
        Ok(())
    } else {
        let mut err = ValidationError::new("longitude_range");
        err.message = Some("Longitude must be between -180 and 180".into());
        Err(err)
    }
}

/// Validates a geofence display name.
/// - Must contain at least one non-whitespace character
/// - Must not exceed 100 characters once trimmed
pub fn validate_geofence_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        let mut err = ValidationError::new("name_blank");
        err.message = Some("Geofence name is required".into());
        return Err(err);
    }

    if trimmed.chars().count() > MAX_GEOFENCE_NAME_LENGTH {
        let mut err = ValidationError::new("name_length");
        err.message = Some("Geofence name must be at most 100 characters".into());
        return Err(err);
    }

    Ok(())
}

/// Validates that a circle radius is finite and strictly positive.
pub fn validate_radius(radius_meters: f64) -> Result<(), ValidationError> {
    if radius_meters.is_finite() && radius_meters > 0.0 {
        Ok(())
    } else {
        let mut err = ValidationError::new("radius_range");
        err.message = Some("Radius must be greater than 0 meters".into());
        Err(err)
    }
}

/// Validates the length of assignment notes.
pub fn validate_notes(notes: &str) -> Result<(), ValidationError> {
    if notes.chars().count() <= MAX_NOTES_LENGTH {
        Ok(())
    } else {
        let mut err = ValidationError::new("notes_length");
        err.message = Some("Notes must be at most 500 characters".into());
        Err(err)
    }
}
