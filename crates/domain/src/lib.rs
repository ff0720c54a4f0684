//! Domain layer for fleet geofencing.
//!
//! This crate contains:
//! - Geometry models (points, circles, convex polygons) and geofence entities
//! - Convex hull reduction of operator clicks
//! - The authoring state machine and its async persistence session
//! - The GeoJSON wire format
//! - Vehicle to geofence association rules, persistence seam and workflow
//! - Domain error types

pub mod error;
pub mod models;
pub mod services;

pub use error::GeofenceError;
