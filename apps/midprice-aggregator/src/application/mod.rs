//! Application Layer - Use cases and port definitions.
//!
//! This layer contains the aggregation service and the port interface
//! that venue adapters implement.

/// Port interfaces for market data sources.
pub mod ports;

/// Application services (cross-venue aggregation).
pub mod services;
