use ferrous_rproxy_application::services::{KeyStore, QueryClassifier, RouteTable};
use ferrous_rproxy_application::use_cases::DispatchQueryUseCase;
use ferrous_rproxy_domain::Config;
use ferrous_rproxy_infrastructure::dns::{
    BackendExchanger, DnsServerHandler, MxSynthesizer, TcpTransferRelay,
};
use ferrous_rproxy_infrastructure::keys::BindKeyLoader;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub struct DnsServices {
    pub handler: DnsServerHandler,
}

impl DnsServices {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        info!("Initializing DNS proxy services");

        let routes = Arc::new(RouteTable::new(config.route_entries()?));
        if routes.is_empty() && config.proxy.default_backend.is_none() {
            warn!("No routes and no default backend configured, every query will fail");
        }

        let classifier = Arc::new(QueryClassifier::new(config.mail_zone_names()));
        let timeout = Duration::from_millis(config.proxy.query_timeout);

        let mut use_case = DispatchQueryUseCase::new(
            Arc::new(config.clone()),
            Arc::clone(&routes),
            classifier,
            Arc::new(BackendExchanger::new(timeout)),
            Arc::new(TcpTransferRelay::new(timeout)),
        );

        if let Some(synthesizer) = Self::build_synthesizer(config)? {
            use_case = use_case.with_synthesizer(Arc::new(synthesizer));
        }

        info!(
            routes = routes.len(),
            default_backend = ?config.proxy.default_backend.as_ref().map(|b| b.to_string()),
            transfer_relay = config.features.transfer_relay,
            allowed_transfer_clients = config.transfer.allow_transfer.len(),
            "DNS proxy services ready"
        );

        Ok(Self {
            handler: DnsServerHandler::new(
                Arc::new(use_case),
                Duration::from_secs(config.server.tcp_idle_timeout),
            ),
        })
    }

    fn build_synthesizer(config: &Config) -> anyhow::Result<Option<MxSynthesizer>> {
        if !config.features.mx_synthesis || config.mail.zones.is_empty() {
            return Ok(None);
        }

        let keys = match &config.mail.key_directory {
            Some(dir) => BindKeyLoader::load(dir)?,
            None => KeyStore::empty(),
        };

        for zone in &config.mail.zones {
            if !keys.contains_zone(&zone.zone_name()) {
                warn!(
                    zone = %zone.zone_name(),
                    "No signing key for mail zone, MX queries will be proxied"
                );
            }
        }

        let synthesizer = MxSynthesizer::new(&config.mail.zones, Arc::new(keys))?;
        info!(zones = synthesizer.zone_count(), "MX synthesis enabled");
        Ok(Some(synthesizer))
    }
}
