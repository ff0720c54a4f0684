//! Rendering seam towards the map surface.

use super::authoring::ShapePreview;
use crate::models::Geofence;

/// Everything the map draws: the live authoring outline plus stored zones.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderScene<'a> {
    pub preview: ShapePreview,
    pub geofences: &'a [Geofence],
}

/// A map widget able to draw a [`RenderScene`]. Clicks flow the other way,
/// into `AuthoringSession::record_click`.
pub trait MapSurface: Send + Sync {
    fn render(&self, scene: &RenderScene<'_>);
}
