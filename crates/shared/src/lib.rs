//! Shared utilities and common types for the fleet geofence workspace.
//!
//! This crate provides common functionality used across all other crates:
//! - Coordinate validation
//! - Geofence name, radius and notes validation

pub mod validation;
