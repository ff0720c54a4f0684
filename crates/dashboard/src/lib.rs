pub mod app;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod services;
pub mod surface;
