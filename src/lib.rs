//! Tubegraph - relationship core of a video-sharing platform
//!
//! The platform logic lives in `tubegraph-core`. This crate attaches it to a
//! filesystem (snapshots, reconciliation journal, media directory), loads
//! configuration and installs logging and metrics for the maintenance binary.
#![warn(missing_docs)]

// Core foundational modules
pub mod core;

// Persistence adapters
pub mod storage;

// Commands run by the binary
pub mod maintenance;

// Re-export commonly used items for convenience
pub use crate::core::{AppState, Config, Error, Result};

use crate::core::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Crate version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Initialize tracing and the metrics registry
///
/// `RUST_LOG` wins over the configured level when set. Calling this twice is
/// harmless: the second subscriber is simply not installed.
pub fn init(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .map_err(|e| Error::config(format!("Invalid log filter: {}", e)))?;

    let installed = match logging.format.as_str() {
        "json" => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init(),
        _ => tracing_subscriber::fmt()
            .pretty()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init(),
    };
    if installed.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }

    tracing::info!("Initializing {} v{}", NAME, VERSION);

    // Initialize metrics registry
    tubegraph_core::system::metrics::init_registry();

    Ok(())
}
