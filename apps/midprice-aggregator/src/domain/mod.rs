//! Domain Layer - Core quote and aggregation types.
//!
//! This layer contains the core domain types for multi-venue quote
//! tracking with no I/O dependencies. All types here are pure Rust
//! with serialization support.

/// Per-venue quote snapshot and single-writer quote store.
pub mod quote;

/// Connection lifecycle state machine and shared tracker.
pub mod connection;

/// Cross-venue aggregation result types and averaging math.
pub mod aggregate;
