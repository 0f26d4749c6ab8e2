use crate::domain_model::*;
use crate::domain_port::*;
use std::sync::Mutex;
use std::time::Duration;

type Responder = dyn Fn(&ApiRequest) -> Result<ApiResponse, TransportError> + Send + Sync;

/// Answers requests from a closure and records what was sent.
///
/// A non-zero latency makes every call suspend, so concurrent requests
/// interleave the way they do over a real network.
pub struct FakeHttpTransport {
    responder: Box<Responder>,
    latency: Duration,
    calls: Mutex<Vec<ApiRequest>>,
}

impl FakeHttpTransport {
    pub fn new(
        responder: impl Fn(&ApiRequest) -> Result<ApiResponse, TransportError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            latency: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self) -> Vec<ApiRequest> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn calls_to(&self, path: &str) -> Vec<ApiRequest> {
        self.calls()
            .into_iter()
            .filter(|request| request.path == path)
            .collect()
    }
}

#[async_trait::async_trait]
impl HttpTransport for FakeHttpTransport {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        (self.responder)(request)
    }
}
