//! Logging and metrics for the pedigree services.

use serde::{Deserialize, Serialize};
use tracing::info;

pub mod logging;
pub mod metrics;

/// Configuration for initializing the monitoring system
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    /// Service name attached to the startup log line
    pub service_name: String,
    /// Log level filter (e.g., "info,pedigree_core=debug"); `RUST_LOG` wins when set
    pub log_filter: String,
    /// Environment (dev, staging, prod)
    pub environment: String,
    /// Emit JSON lines instead of pretty output
    pub enable_json_logging: bool,
    /// Also write JSON logs to this file, rotated daily
    pub log_file: Option<String>,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            service_name: "pedigree".to_string(),
            log_filter: "info".to_string(),
            environment: "dev".to_string(),
            enable_json_logging: false,
            log_file: None,
        }
    }
}

/// Initialize monitoring system
pub fn init(config: MonitoringConfig) -> anyhow::Result<()> {
    logging::init_logging(&config)?;
    info!(
        service_name = %config.service_name,
        environment = %config.environment,
        "Monitoring initialized"
    );
    Ok(())
}

/// Shutdown the monitoring system
pub fn shutdown() {
    info!("Shutting down monitoring system");
}

pub use crate::logging::LogExt;
pub use crate::metrics::PedigreeMetrics;
