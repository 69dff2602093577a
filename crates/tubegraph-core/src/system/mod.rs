//! System utilities and metrics

/// Metrics collection
pub mod metrics;
