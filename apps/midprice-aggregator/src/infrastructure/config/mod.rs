//! Configuration Module
//!
//! Environment-driven service configuration.

pub mod settings;

pub use settings::{ReconnectSettings, ServerSettings, ServiceConfig, VenueEndpoints};
