use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use super::errors::ConfigError;
use super::features::FeatureToggles;
use super::logging::LoggingConfig;
use super::mail::MailConfig;
use super::proxy::ProxyConfig;
use super::server::ServerConfig;
use super::transfer::TransferConfig;
use crate::{BackendAddr, RouteEntry};

/// Main configuration structure for the reverse proxy
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Listener configuration (address, port, workers)
    #[serde(default)]
    pub server: ServerConfig,

    /// Default backend, routes and backend timeout
    #[serde(default)]
    pub proxy: ProxyConfig,

    #[serde(default)]
    pub transfer: TransferConfig,

    /// Zones answered with a synthesized, signed MX record
    #[serde(default)]
    pub mail: MailConfig,

    #[serde(default)]
    pub features: FeatureToggles,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file or use defaults
    ///
    /// Priority order:
    /// 1. Explicitly provided path
    /// 2. ferrous-rproxy.toml in current directory
    /// 3. /etc/ferrous-rproxy/config.toml
    /// 4. Default configuration
    pub fn load(path: Option<&str>, cli_overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = path {
            Self::from_file(path)?
        } else if let Some(found) = Self::get_config_path() {
            Self::from_file(&found)?
        } else {
            Self::default()
        };

        config.apply_cli_overrides(cli_overrides);
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        Self::from_toml(&contents)
    }

    /// Apply command-line overrides to configuration
    fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if let Some(bind) = overrides.bind_address {
            self.server.bind_address = bind;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(backend) = overrides.default_backend {
            self.proxy.default_backend = Some(backend);
        }
        if let Some(dir) = overrides.key_directory {
            self.mail.key_directory = Some(dir);
        }
        if let Some(clients) = overrides.allow_transfer {
            self.transfer.allow_transfer = clients;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("DNS port cannot be 0".to_string()));
        }
        if self.server.udp_workers == 0 {
            return Err(ConfigError::Validation(
                "udp_workers must be at least 1".to_string(),
            ));
        }

        self.proxy.validate()?;
        self.mail.validate()?;

        if self.features.mx_synthesis
            && !self.mail.zones.is_empty()
            && self.mail.key_directory.is_none()
        {
            return Err(ConfigError::Validation(
                "Mail zones are configured but no key_directory is set".to_string(),
            ));
        }

        Ok(())
    }

    /// Every route in precedence order: explicit routes first, then the
    /// expanded templates when reverse-zone auto-routing is on.
    pub fn route_entries(&self) -> Result<Vec<RouteEntry>, ConfigError> {
        let mut entries: Vec<RouteEntry> =
            self.proxy.routes.iter().map(|r| r.to_entry()).collect();

        if self.features.reverse_auto_routing {
            for template in &self.proxy.route_templates {
                entries.extend(template.expand()?);
            }
        }

        Ok(entries)
    }

    /// Normalized names of the zones answered by MX synthesis, empty when
    /// the feature is off.
    pub fn mail_zone_names(&self) -> Vec<String> {
        if !self.features.mx_synthesis {
            return vec![];
        }
        self.mail.zones.iter().map(|z| z.zone_name()).collect()
    }

    /// Get the path to the configuration file being used
    pub fn get_config_path() -> Option<String> {
        if std::path::Path::new("ferrous-rproxy.toml").exists() {
            Some("ferrous-rproxy.toml".to_string())
        } else if std::path::Path::new("/etc/ferrous-rproxy/config.toml").exists() {
            Some("/etc/ferrous-rproxy/config.toml".to_string())
        } else {
            None
        }
    }
}

/// Command-line overrides for configuration
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub default_backend: Option<BackendAddr>,
    pub key_directory: Option<PathBuf>,
    pub allow_transfer: Option<Vec<IpAddr>>,
    pub log_level: Option<String>,
}
