//! Headless map surface.
//!
//! The binary has no map widget; it draws scenes into the log instead.

use domain::services::{MapSurface, RenderScene, ShapePreview};
use tracing::{debug, info};

#[derive(Debug, Default, Clone, Copy)]
pub struct LogMapSurface;

impl MapSurface for LogMapSurface {
    fn render(&self, scene: &RenderScene<'_>) {
        match &scene.preview {
            ShapePreview::None => debug!("No shape being drawn"),
            ShapePreview::Circle {
                center,
                radius_meters,
            } => info!(?center, ?radius_meters, "Drawing circle preview"),
            ShapePreview::Polygon { vertices } => {
                info!(vertices = vertices.len(), "Drawing polygon preview")
            }
        }

        for geofence in scene.geofences {
            info!(
                geofence_id = geofence.geofence_id,
                name = %geofence.name,
                status = %geofence.status,
                shape = geofence.shape.kind(),
                "Drawing geofence"
            );
        }
    }
}
