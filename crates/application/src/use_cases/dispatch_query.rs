use crate::ports::{AnswerSynthesizer, TransferRelay, TransferSink, UpstreamExchange};
use crate::services::{pick_backend, QueryClassifier, RouteTable};
use ferrous_rproxy_domain::{
    BackendAddr, ClientTransport, Config, DnsQuery, DomainError, QueryCategory, RecordType,
};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// A decoded client query together with the bytes it arrived as.
pub struct ProxyRequest<'a> {
    pub query: &'a DnsQuery,
    pub wire: &'a [u8],
    pub transport: ClientTransport,
    pub client_ip: IpAddr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Backend response, relayed unmodified.
    Answer(Vec<u8>),
    /// Locally built and signed response.
    Synthesized(Vec<u8>),
    /// Transfer messages already written to the client.
    Streamed { messages: usize },
}

pub struct DispatchQueryUseCase {
    config: Arc<Config>,
    routes: Arc<RouteTable>,
    classifier: Arc<QueryClassifier>,
    upstream: Arc<dyn UpstreamExchange>,
    transfer: Arc<dyn TransferRelay>,
    synthesizer: Option<Arc<dyn AnswerSynthesizer>>,
}

impl DispatchQueryUseCase {
    pub fn new(
        config: Arc<Config>,
        routes: Arc<RouteTable>,
        classifier: Arc<QueryClassifier>,
        upstream: Arc<dyn UpstreamExchange>,
        transfer: Arc<dyn TransferRelay>,
    ) -> Self {
        Self {
            config,
            routes,
            classifier,
            upstream,
            transfer,
            synthesizer: None,
        }
    }

    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn AnswerSynthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    pub async fn execute(
        &self,
        request: &ProxyRequest<'_>,
        sink: Option<&mut dyn TransferSink>,
    ) -> Result<DispatchOutcome, DomainError> {
        let start = Instant::now();
        let category = self.classifier.classify(request.query)?;
        let name = request
            .query
            .first()
            .map(|q| Arc::clone(&q.name))
            .unwrap_or_else(|| Arc::from("."));

        debug!(
            id = request.query.id,
            domain = %name,
            category = %category,
            transport = %request.transport,
            client = %request.client_ip,
            "Dispatching query"
        );

        let outcome = match category {
            QueryCategory::Transfer => self.relay_transfer(request, &name, sink).await?,
            QueryCategory::DelegationSigner => {
                let backend = self.default_backend(&name)?;
                self.proxy(backend, request).await?
            }
            QueryCategory::MailExchange => match self.synthesize(&name, request.wire) {
                Some(response) => DispatchOutcome::Synthesized(response),
                None => self.proxy_routed(&name, request).await?,
            },
            QueryCategory::Normal => self.proxy_routed(&name, request).await?,
        };

        debug!(
            id = request.query.id,
            domain = %name,
            elapsed_us = start.elapsed().as_micros() as u64,
            "Query dispatched"
        );

        Ok(outcome)
    }

    async fn relay_transfer(
        &self,
        request: &ProxyRequest<'_>,
        name: &str,
        sink: Option<&mut dyn TransferSink>,
    ) -> Result<DispatchOutcome, DomainError> {
        if !self.config.features.transfer_relay {
            return Err(DomainError::DisallowedOperation(
                "zone transfer relay is disabled".to_string(),
            ));
        }

        if !request.transport.is_stream() {
            warn!(domain = %name, client = %request.client_ip, "Zone transfer over UDP refused");
            return Err(DomainError::DisallowedOperation(
                "zone transfer requires TCP".to_string(),
            ));
        }

        if !self.config.transfer.is_allowed(request.client_ip) {
            warn!(domain = %name, client = %request.client_ip, "Zone transfer not allowed for client");
            return Err(DomainError::DisallowedOperation(format!(
                "zone transfer not allowed for {}",
                request.client_ip
            )));
        }

        let sink = sink.ok_or_else(|| {
            DomainError::DisallowedOperation("no stream to relay the transfer into".to_string())
        })?;

        // Incremental transfers always go to the primary.
        let backend = if request.query.has_type(RecordType::IXFR) {
            self.default_backend(name)?
        } else {
            self.route_or_default(name)?
        };

        debug!(domain = %name, backend = %backend, "Relaying zone transfer");
        let messages = self
            .transfer
            .relay(backend, request.query, request.wire, sink)
            .await?;

        Ok(DispatchOutcome::Streamed { messages })
    }

    fn synthesize(&self, zone: &str, wire: &[u8]) -> Option<Vec<u8>> {
        let synthesizer = self.synthesizer.as_ref()?;
        match synthesizer.synthesize(zone, wire) {
            Ok(response) => Some(response),
            Err(DomainError::SigningUnavailable(reason)) => {
                debug!(zone = %zone, reason = %reason, "No signing key, proxying MX query");
                None
            }
            Err(e) => {
                warn!(zone = %zone, error = %e, "MX synthesis failed, proxying instead");
                None
            }
        }
    }

    async fn proxy_routed(
        &self,
        name: &str,
        request: &ProxyRequest<'_>,
    ) -> Result<DispatchOutcome, DomainError> {
        let backend = self.route_or_default(name)?;
        self.proxy(backend, request).await
    }

    async fn proxy(
        &self,
        backend: &BackendAddr,
        request: &ProxyRequest<'_>,
    ) -> Result<DispatchOutcome, DomainError> {
        let response = self
            .upstream
            .exchange(backend, request.transport, request.wire)
            .await?;
        Ok(DispatchOutcome::Answer(response))
    }

    fn route_or_default(&self, name: &str) -> Result<&BackendAddr, DomainError> {
        if let Some(backends) = self.routes.backends_for(name) {
            if let Some(backend) = pick_backend(backends) {
                return Ok(backend);
            }
        }
        self.default_backend(name)
    }

    fn default_backend(&self, name: &str) -> Result<&BackendAddr, DomainError> {
        self.config
            .proxy
            .default_backend
            .as_ref()
            .ok_or_else(|| DomainError::NoRouteAvailable(name.to_string()))
    }
}
