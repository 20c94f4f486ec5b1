//!
//! Pedigree Server - HTTP host for pedigree chart editing sessions
//!
//! Each session owns one chart, its lineage ledger and its selection; the
//! API exposes the port-click, delete-prompt and editor interactions.

/// API module
pub mod api;

/// Server module
pub mod server;

/// Configuration module
pub mod config;

/// Error module
pub mod error;

// Re-export key types
pub use config::{LoadedConfig, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use server::{PedigreeServer, SessionSummary, SharedSession};

/// Run function
pub async fn run(config: ServerConfig) -> ServerResult<()> {
    config.validate()?;
    tracing::info!(
        max_sessions = config.max_sessions,
        "Pedigree server configured"
    );
    PedigreeServer::new(config).run().await
}
