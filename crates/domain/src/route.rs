use crate::dns_query::normalize_fqdn;
use crate::BackendAddr;
use std::sync::Arc;

/// A configured suffix and the backends serving it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub suffix: Arc<str>,
    pub backends: Arc<[BackendAddr]>,
}

impl RouteEntry {
    pub fn new(suffix: &str, backends: Vec<BackendAddr>) -> Self {
        Self {
            suffix: normalize_fqdn(suffix).into(),
            backends: backends.into(),
        }
    }
}
