use serde::{Deserialize, Serialize};

use super::errors::ConfigError;
use crate::dns_query::{is_valid_domain_name, normalize_fqdn};
use crate::{BackendAddr, RouteEntry};

/// Placeholder substituted by each value of a template's range.
pub const TEMPLATE_PLACEHOLDER: &str = "{n}";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    pub suffix: String,

    pub backends: Vec<BackendAddr>,
}

impl RouteConfig {
    pub fn to_entry(&self) -> RouteEntry {
        RouteEntry::new(&self.suffix, self.backends.clone())
    }
}

/// Generates one route per value of `from..=to`, e.g. a backend per /16 of
/// a reverse zone.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteTemplate {
    pub suffix: String,

    pub backend: String,

    #[serde(default)]
    pub from: u8,

    #[serde(default = "default_template_to")]
    pub to: u8,
}

impl RouteTemplate {
    pub fn expand(&self) -> Result<Vec<RouteEntry>, ConfigError> {
        self.check()?;
        (self.from..=self.to)
            .map(|n| {
                let value = n.to_string();
                let suffix = self.suffix.replace(TEMPLATE_PLACEHOLDER, &value);
                let backend = self
                    .backend
                    .replace(TEMPLATE_PLACEHOLDER, &value)
                    .parse::<BackendAddr>()
                    .map_err(|e| self.template_error(e.to_string()))?;
                Ok(RouteEntry::new(&suffix, vec![backend]))
            })
            .collect()
    }

    fn check(&self) -> Result<(), ConfigError> {
        if !self.suffix.contains(TEMPLATE_PLACEHOLDER)
            || !self.backend.contains(TEMPLATE_PLACEHOLDER)
        {
            return Err(self.template_error(format!(
                "{} must appear in both suffix and backend '{}'",
                TEMPLATE_PLACEHOLDER, self.backend
            )));
        }
        if self.from > self.to {
            return Err(self.template_error(format!(
                "empty range {}..={}",
                self.from, self.to
            )));
        }
        Ok(())
    }

    fn template_error(&self, reason: String) -> ConfigError {
        ConfigError::Template {
            suffix: self.suffix.clone(),
            reason,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProxyConfig {
    /// Authoritative server for DS and IXFR queries and for names without a
    /// route.
    #[serde(default)]
    pub default_backend: Option<BackendAddr>,

    /// Per-step backend timeout in milliseconds.
    #[serde(default = "default_query_timeout")]
    pub query_timeout: u64,

    #[serde(default)]
    pub routes: Vec<RouteConfig>,

    #[serde(default)]
    pub route_templates: Vec<RouteTemplate>,
}

impl ProxyConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.query_timeout == 0 {
            return Err(ConfigError::Validation(
                "query_timeout cannot be 0".to_string(),
            ));
        }

        for route in &self.routes {
            let suffix = normalize_fqdn(&route.suffix);
            if !is_valid_domain_name(&suffix) {
                return Err(ConfigError::Validation(format!(
                    "Route suffix '{}' is not a valid domain name",
                    route.suffix
                )));
            }
            if route.backends.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "Route '{}' has no backends",
                    route.suffix
                )));
            }
        }

        for template in &self.route_templates {
            for entry in template.expand()? {
                if !is_valid_domain_name(&entry.suffix) {
                    return Err(ConfigError::Validation(format!(
                        "Route template '{}' produces invalid suffix '{}'",
                        template.suffix, entry.suffix
                    )));
                }
            }
        }

        Ok(())
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            default_backend: None,
            query_timeout: default_query_timeout(),
            routes: vec![],
            route_templates: vec![],
        }
    }
}

fn default_query_timeout() -> u64 {
    2000
}

fn default_template_to() -> u8 {
    255
}
