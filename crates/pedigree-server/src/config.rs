//! Configuration for the Pedigree Server
//!
//! Defaults, then an optional file named by `PEDIGREE_CONFIG`, then
//! environment overrides.

use serde::{Deserialize, Serialize};
use std::env;
use std::net::SocketAddr;
use tracing::{info, warn};

use pedigree_core::ExpansionLayout;
use pedigree_monitoring::MonitoringConfig;

use crate::error::{ServerError, ServerResult};

/// Server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Host to bind to
    #[serde(default = "default_host")]
    pub bind_address: String,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON log lines
    #[serde(default)]
    pub json_logging: bool,

    /// Optional daily-rolling log file
    #[serde(default)]
    pub log_file: Option<String>,

    /// Upper bound on concurrently open editing sessions
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Expansion geometry for new sessions
    #[serde(default)]
    pub layout: ExpansionLayout,
}

fn default_port() -> u16 {
    8080
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_sessions() -> usize {
    64
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_address: default_host(),
            log_level: default_log_level(),
            json_logging: false,
            log_file: None,
            max_sessions: default_max_sessions(),
            layout: ExpansionLayout::default(),
        }
    }
}

/// A loaded configuration and the notes gathered while reading it.
///
/// Loading runs before the subscriber exists, so the notes are held here
/// and written by [`LoadedConfig::log`] once logging is initialized.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConfig {
    /// The validated configuration
    pub config: ServerConfig,
    /// File the configuration was read from, if any
    pub source: Option<String>,
    /// Overrides that were rejected
    pub warnings: Vec<String>,
}

impl LoadedConfig {
    /// Write the gathered notes to the log
    pub fn log(&self) {
        for warning in &self.warnings {
            warn!("{}", warning);
        }
        info!(
            source = self.source.as_deref().unwrap_or("defaults"),
            port = self.config.port,
            max_sessions = self.config.max_sessions,
            "Configuration loaded"
        );
    }
}

impl ServerConfig {
    /// Load configuration from the optional config file and environment variables
    pub fn load() -> ServerResult<LoadedConfig> {
        let source = env::var("PEDIGREE_CONFIG").ok();
        let mut config = match &source {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        let warnings = config.apply_overrides(|key| env::var(key).ok());
        config.validate()?;
        Ok(LoadedConfig {
            config,
            source,
            warnings,
        })
    }

    /// Read a TOML, YAML or JSON file; missing keys fall back to defaults
    pub fn from_file(path: &str) -> ServerResult<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?
            .try_deserialize::<ServerConfig>()?;
        Ok(config)
    }

    /// Apply `SERVER_PORT`, `SERVER_HOST`, `LOG_LEVEL`, `LOG_JSON`, `LOG_FILE` and
    /// `MAX_SESSIONS`. Unparseable values are skipped and reported in the
    /// returned list.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Vec<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut warnings = Vec::new();

        if let Some(port) = lookup("SERVER_PORT") {
            match port.parse() {
                Ok(port) => self.port = port,
                Err(_) => warnings.push(format!("Invalid SERVER_PORT value: {}", port)),
            }
        }

        if let Some(host) = lookup("SERVER_HOST") {
            self.bind_address = host;
        }

        if let Some(level) = lookup("LOG_LEVEL") {
            self.log_level = level;
        }

        if let Some(json) = lookup("LOG_JSON") {
            match json.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => self.json_logging = true,
                "0" | "false" | "no" => self.json_logging = false,
                _ => warnings.push(format!("Invalid LOG_JSON value: {}", json)),
            }
        }

        if let Some(path) = lookup("LOG_FILE") {
            self.log_file = if path.is_empty() { None } else { Some(path) };
        }

        if let Some(max) = lookup("MAX_SESSIONS") {
            match max.parse() {
                Ok(max) => self.max_sessions = max,
                Err(_) => warnings.push(format!("Invalid MAX_SESSIONS value: {}", max)),
            }
        }

        warnings
    }

    /// Check the values a server cannot start with
    pub fn validate(&self) -> ServerResult<()> {
        self.socket_addr()?;
        if self.max_sessions == 0 {
            return Err(ServerError::ConfigError(
                "max_sessions must be at least 1".to_string(),
            ));
        }
        self.layout
            .validate()
            .map_err(|err| ServerError::ConfigError(err.to_string()))
    }

    /// Address the listener binds to
    pub fn socket_addr(&self) -> ServerResult<SocketAddr> {
        format!("{}:{}", self.bind_address, self.port)
            .parse()
            .map_err(|_| {
                ServerError::ConfigError(format!(
                    "Invalid bind address {}:{}",
                    self.bind_address, self.port
                ))
            })
    }

    /// Logging settings derived from this configuration
    pub fn monitoring(&self) -> MonitoringConfig {
        MonitoringConfig {
            service_name: "pedigree-server".to_string(),
            log_filter: self.log_level.clone(),
            enable_json_logging: self.json_logging,
            log_file: self.log_file.clone(),
            ..MonitoringConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.bind_address, "0.0.0.0");
        assert_eq!(config.max_sessions, 64);
        assert_eq!(config.layout, ExpansionLayout::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let mut config = ServerConfig::default();
        let warnings = config.apply_overrides(lookup(&[
            ("SERVER_PORT", "9000"),
            ("SERVER_HOST", "127.0.0.1"),
            ("LOG_JSON", "true"),
            ("LOG_FILE", "/var/log/pedigree.log"),
            ("MAX_SESSIONS", "3"),
        ]));

        assert_eq!(config.port, 9000);
        assert_eq!(config.bind_address, "127.0.0.1");
        assert!(config.json_logging);
        assert_eq!(config.log_file.as_deref(), Some("/var/log/pedigree.log"));
        assert_eq!(config.max_sessions, 3);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_invalid_override_keeps_previous_value() {
        let mut config = ServerConfig::default();
        let warnings =
            config.apply_overrides(lookup(&[("SERVER_PORT", "eighty"), ("MAX_SESSIONS", "-1")]));
        assert_eq!(config, ServerConfig::default());
        assert_eq!(
            warnings,
            vec![
                "Invalid SERVER_PORT value: eighty".to_string(),
                "Invalid MAX_SESSIONS value: -1".to_string(),
            ]
        );
    }

    #[test]
    fn test_load_holds_warnings_for_later_logging() {
        env::set_var("LOG_JSON", "sometimes");
        let loaded = ServerConfig::load();
        env::remove_var("LOG_JSON");

        let loaded = loaded.unwrap();
        assert_eq!(
            loaded.warnings,
            vec!["Invalid LOG_JSON value: sometimes".to_string()]
        );
        assert!(!loaded.config.json_logging);
        assert_eq!(loaded.source, None);
        loaded.log();
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = ServerConfig {
            bind_address: "not an address".to_string(),
            ..ServerConfig::default()
        };
        assert!(matches!(config.validate(), Err(ServerError::ConfigError(_))));

        let config = ServerConfig {
            max_sessions: 0,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.layout.generation_gap = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ServerConfig =
            serde_json::from_str(r#"{"port": 3000, "layout": {"sibling_offset": 250.0}}"#).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.max_sessions, 64);
        assert_eq!(config.layout.sibling_offset, 250.0);
        assert_eq!(config.layout.generation_gap, 150.0);
    }
}
