#![allow(dead_code)]

use async_trait::async_trait;
use ferrous_rproxy_application::ports::{
    AnswerSynthesizer, TransferRelay, TransferSink, UpstreamExchange,
};
use ferrous_rproxy_domain::{BackendAddr, ClientTransport, DnsQuery, DomainError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeCall {
    pub backend: String,
    pub transport: ClientTransport,
    pub request: Vec<u8>,
}

/// Echoes the request back prefixed with the backend's address, or fails
/// for backends registered with an error.
#[derive(Clone, Default)]
pub struct MockUpstream {
    calls: Arc<Mutex<Vec<ExchangeCall>>>,
    failures: Arc<Mutex<HashMap<String, DomainError>>>,
    delay: Option<Duration>,
}

impl MockUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn fail_for(&self, backend: &str, error: DomainError) {
        self.failures
            .lock()
            .unwrap()
            .insert(backend.to_string(), error);
    }

    pub fn calls(&self) -> Vec<ExchangeCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn answer_from(backend: &str, request: &[u8]) -> Vec<u8> {
        let mut response = backend.as_bytes().to_vec();
        response.push(b'|');
        response.extend_from_slice(request);
        response
    }
}

#[async_trait]
impl UpstreamExchange for MockUpstream {
    async fn exchange(
        &self,
        backend: &BackendAddr,
        transport: ClientTransport,
        request: &[u8],
    ) -> Result<Vec<u8>, DomainError> {
        let backend = backend.to_string();
        self.calls.lock().unwrap().push(ExchangeCall {
            backend: backend.clone(),
            transport,
            request: request.to_vec(),
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let failure = self.failures.lock().unwrap().get(&backend).cloned();
        if let Some(error) = failure {
            return Err(error);
        }

        Ok(Self::answer_from(&backend, request))
    }
}

/// Sends a fixed list of messages into the sink.
#[derive(Clone, Default)]
pub struct MockTransferRelay {
    messages: Vec<Vec<u8>>,
    backends: Arc<Mutex<Vec<String>>>,
}

impl MockTransferRelay {
    pub fn new(messages: Vec<Vec<u8>>) -> Self {
        Self {
            messages,
            backends: Arc::default(),
        }
    }

    pub fn backends(&self) -> Vec<String> {
        self.backends.lock().unwrap().clone()
    }
}

#[async_trait]
impl TransferRelay for MockTransferRelay {
    async fn relay(
        &self,
        backend: &BackendAddr,
        _query: &DnsQuery,
        _request: &[u8],
        sink: &mut dyn TransferSink,
    ) -> Result<usize, DomainError> {
        self.backends.lock().unwrap().push(backend.to_string());
        for message in &self.messages {
            sink.send(message).await?;
        }
        Ok(self.messages.len())
    }
}

#[derive(Default)]
pub struct CollectingSink {
    pub messages: Vec<Vec<u8>>,
}

#[async_trait]
impl TransferSink for CollectingSink {
    async fn send(&mut self, message: &[u8]) -> Result<(), DomainError> {
        self.messages.push(message.to_vec());
        Ok(())
    }
}

pub enum SynthesisBehavior {
    Answer(Vec<u8>),
    Fail(DomainError),
}

pub struct MockSynthesizer {
    behavior: SynthesisBehavior,
    zones: Mutex<Vec<String>>,
}

impl MockSynthesizer {
    pub fn answering(response: &[u8]) -> Self {
        Self {
            behavior: SynthesisBehavior::Answer(response.to_vec()),
            zones: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: DomainError) -> Self {
        Self {
            behavior: SynthesisBehavior::Fail(error),
            zones: Mutex::new(Vec::new()),
        }
    }

    pub fn zones(&self) -> Vec<String> {
        self.zones.lock().unwrap().clone()
    }
}

impl AnswerSynthesizer for MockSynthesizer {
    fn synthesize(&self, zone: &str, _request: &[u8]) -> Result<Vec<u8>, DomainError> {
        self.zones.lock().unwrap().push(zone.to_string());
        match &self.behavior {
            SynthesisBehavior::Answer(response) => Ok(response.clone()),
            SynthesisBehavior::Fail(error) => Err(error.clone()),
        }
    }
}
