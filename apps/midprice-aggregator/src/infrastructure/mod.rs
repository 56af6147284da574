//! Infrastructure Layer
//!
//! External-world adapters: venue WebSocket clients, the client
//! registry, the HTTP API server, configuration, metrics, and
//! telemetry.

pub mod config;
pub mod http;
pub mod metrics;
pub mod registry;
pub mod telemetry;
pub mod venues;
