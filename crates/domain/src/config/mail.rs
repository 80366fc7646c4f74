use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, Ipv6Addr};
use std::path::PathBuf;

use super::errors::ConfigError;
use crate::dns_query::{is_valid_domain_name, normalize_fqdn};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MailConfig {
    /// Directory holding BIND `K<zone>+<alg>+<tag>.private` files.
    #[serde(default)]
    pub key_directory: Option<PathBuf>,

    #[serde(default)]
    pub zones: Vec<MailZoneConfig>,
}

/// A zone whose MX query is answered locally: `zone IN MX 10 mail.<zone>`
/// plus glue for the mail host.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MailZoneConfig {
    pub zone: String,

    #[serde(default)]
    pub ipv4: Option<Ipv4Addr>,

    #[serde(default)]
    pub ipv6: Option<Ipv6Addr>,

    #[serde(default = "default_ttl")]
    pub ttl: u32,
}

impl MailZoneConfig {
    pub fn zone_name(&self) -> String {
        normalize_fqdn(&self.zone)
    }

    pub fn mail_host(&self) -> String {
        format!("mail.{}", self.zone_name())
    }
}

impl MailConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for zone in &self.zones {
            let name = zone.zone_name();
            if name == "." || !is_valid_domain_name(&name) {
                return Err(ConfigError::Validation(format!(
                    "Mail zone '{}' is not a valid domain name",
                    zone.zone
                )));
            }
            let host = zone.mail_host();
            if !is_valid_domain_name(&host) {
                return Err(ConfigError::Validation(format!(
                    "Mail host '{}' of zone '{}' is not a valid domain name",
                    host, zone.zone
                )));
            }
            if zone.ipv4.is_none() && zone.ipv6.is_none() {
                return Err(ConfigError::Validation(format!(
                    "Mail zone '{}' needs an ipv4 or ipv6 glue address",
                    zone.zone
                )));
            }
        }
        Ok(())
    }
}

fn default_ttl() -> u32 {
    3600
}
