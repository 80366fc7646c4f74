pub mod errors;
pub mod features;
pub mod logging;
pub mod mail;
pub mod proxy;
pub mod root;
pub mod server;
pub mod transfer;

pub use errors::ConfigError;
pub use features::FeatureToggles;
pub use logging::{LogFormat, LoggingConfig};
pub use mail::{MailConfig, MailZoneConfig};
pub use proxy::{ProxyConfig, RouteConfig, RouteTemplate};
pub use root::{CliOverrides, Config};
pub use server::ServerConfig;
pub use transfer::TransferConfig;
