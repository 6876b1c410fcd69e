//! Configuration loading
//!
//! Service settings are resolved in priority order:
//! 1. Command-line argument (highest priority, clap also maps `LIVEPOLL_*` env vars here)
//! 2. `PORT` environment variable (port only)
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing or malformed config file never aborts startup; it logs a
//! warning and the next tier applies.

use crate::events::DEFAULT_EVENT_CAPACITY;
use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Compiled default port
pub const DEFAULT_PORT: u16 = 3000;

/// Compiled default bind address
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";

/// Config file looked up in the working directory before the user config dir
pub const LOCAL_CONFIG_FILE: &str = "livepoll.toml";

/// Resolved settings for one livepoll service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub bind_address: String,
    pub port: u16,
    /// EventBus capacity (push channel only)
    pub event_capacity: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            port: DEFAULT_PORT,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl ServiceConfig {
    /// `host:port` string suitable for `TcpListener::bind`
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

/// Contents of a livepoll TOML config file; every key is optional
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct TomlConfig {
    pub port: Option<u16>,
    pub bind_address: Option<String>,
    pub event_capacity: Option<usize>,
}

impl TomlConfig {
    /// Read and parse a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub port: Option<u16>,
    pub bind_address: Option<String>,
    pub config_file: Option<PathBuf>,
}

/// Resolves a [`ServiceConfig`] from CLI, environment, file and defaults
pub struct ConfigResolver {
    service_name: String,
}

impl ConfigResolver {
    pub fn new(service_name: &str) -> Self {
        Self {
            service_name: service_name.to_string(),
        }
    }

    pub fn resolve(&self, cli: &CliOverrides) -> ServiceConfig {
        let file = self.load_file(cli.config_file.as_deref());
        let defaults = ServiceConfig::default();

        // Priority 1: CLI, Priority 2: PORT env, Priority 3: TOML
        let port = cli
            .port
            .or_else(port_from_env)
            .or(file.port)
            .unwrap_or(defaults.port);

        let bind_address = cli
            .bind_address
            .clone()
            .or(file.bind_address)
            .unwrap_or(defaults.bind_address);

        let event_capacity = match file.event_capacity {
            Some(0) => {
                warn!("event_capacity must be positive, using {}", defaults.event_capacity);
                defaults.event_capacity
            }
            Some(capacity) => capacity,
            None => defaults.event_capacity,
        };

        let config = ServiceConfig {
            bind_address,
            port,
            event_capacity,
        };
        debug!("{} resolved config: {:?}", self.service_name, config);
        config
    }

    fn load_file(&self, explicit: Option<&Path>) -> TomlConfig {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => default_config_file(),
        };

        let Some(path) = path else {
            debug!("No config file found, using defaults");
            return TomlConfig::default();
        };

        match TomlConfig::load(&path) {
            Ok(config) => {
                info!("Loaded config file {}", path.display());
                config
            }
            Err(e) => {
                warn!("Ignoring config file: {}", e);
                TomlConfig::default()
            }
        }
    }
}

fn port_from_env() -> Option<u16> {
    let value = std::env::var("PORT").ok()?;
    match value.trim().parse() {
        Ok(port) => Some(port),
        Err(e) => {
            warn!("Invalid PORT value {:?}: {}", value, e);
            None
        }
    }
}

/// `./livepoll.toml`, then `<config_dir>/livepoll/config.toml`
fn default_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.exists() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|d| d.join("livepoll").join("config.toml"))
        .filter(|path| path.exists())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServiceConfig::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.bind_address, "0.0.0.0");
        assert_eq!(config.listen_address(), "0.0.0.0:3000");
    }

    #[test]
    fn test_toml_partial_keys() {
        let config: TomlConfig = toml::from_str("port = 8080").unwrap();
        assert_eq!(config.port, Some(8080));
        assert_eq!(config.bind_address, None);
        assert_eq!(config.event_capacity, None);
    }
}
