//! Ferrous reverse proxy domain layer
pub mod backend;
pub mod config;
pub mod dns_protocol;
pub mod dns_query;
pub mod errors;
pub mod query_category;
pub mod record_type;
pub mod route;
pub mod signing_key;

pub use backend::BackendAddr;
pub use config::{CliOverrides, Config, ConfigError};
pub use dns_protocol::ClientTransport;
pub use dns_query::{normalize_fqdn, DnsQuery, DnsQuestion};
pub use errors::DomainError;
pub use query_category::QueryCategory;
pub use record_type::RecordType;
pub use route::RouteEntry;
pub use signing_key::SigningKey;
