//! Application Services

/// Cross-venue mid-price aggregation.
pub mod aggregator;

pub use aggregator::Aggregator;
