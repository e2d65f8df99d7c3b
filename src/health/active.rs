//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe every registered endpoint at `{base_url}/health`
//! - Probe newly registered endpoints as soon as their id arrives on the wake channel
//! - Update endpoint health, latency and error rate in the registry

use axum::body::Body;
use axum::http::{Request, Uri};
use futures_util::future::join_all;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{self, MissedTickBehavior};

use crate::config::LoadBalancerConfig;
use crate::observability::metrics;
use crate::registry::{HealthState, ServiceEndpoint, ServiceRegistry};

/// Why a probe counted as a failure. Only ever logged.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("non-success status {0}")]
    Status(u16),

    #[error("connection error: {0}")]
    Transport(String),

    #[error("invalid probe request: {0}")]
    Request(String),
}

/// Outcome of a single probe.
#[derive(Debug)]
pub struct ProbeResult {
    pub elapsed_ms: u64,
    pub outcome: Result<(), ProbeError>,
}

pub struct HealthMonitor {
    registry: Arc<ServiceRegistry>,
    interval: Duration,
    timeout: Duration,
    path: String,
    client: Client<HttpConnector, Body>,
}

impl HealthMonitor {
    pub fn new(registry: Arc<ServiceRegistry>, config: &LoadBalancerConfig) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Self {
            registry,
            interval: config.health_check_interval(),
            timeout: config.health_check_timeout(),
            path: config.health_check_path.clone(),
            client,
        }
    }

    /// Probe loop. Ids received on `wake` are probed immediately.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>, mut wake: mpsc::UnboundedReceiver<String>) {
        tracing::info!(
            interval_ms = self.interval.as_millis() as u64,
            timeout_ms = self.timeout.as_millis() as u64,
            path = %self.path,
            "Health monitor starting"
        );

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.check_all().await;
                }
                Some(id) = wake.recv() => {
                    self.check_one(&id).await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Probe every registered endpoint concurrently and record the results.
    pub async fn check_all(&self) {
        let endpoints = self.registry.list();
        let probes = endpoints.iter().map(|endpoint| async move {
            let result = self.probe(endpoint).await;
            self.apply(endpoint, result);
        });
        join_all(probes).await;
    }

    /// Probe a single endpoint by id. Unknown ids are ignored.
    pub async fn check_one(&self, id: &str) {
        if let Some(endpoint) = self.registry.get(id) {
            let result = self.probe(&endpoint).await;
            self.apply(&endpoint, result);
        }
    }

    /// Issue one probe bounded by the configured timeout.
    pub async fn probe(&self, endpoint: &ServiceEndpoint) -> ProbeResult {
        let url = endpoint.probe_url(&self.path);
        let start = Instant::now();

        let request = url
            .parse::<Uri>()
            .map_err(|e| ProbeError::Request(e.to_string()))
            .and_then(|uri| {
                Request::builder()
                    .method("GET")
                    .uri(uri)
                    .header("user-agent", "api-gateway-health-check")
                    .body(Body::empty())
                    .map_err(|e| ProbeError::Request(e.to_string()))
            });

        let outcome = match request {
            Err(e) => Err(e),
            Ok(request) => match time::timeout(self.timeout, self.client.request(request)).await {
                Ok(Ok(response)) if response.status().is_success() => Ok(()),
                Ok(Ok(response)) => Err(ProbeError::Status(response.status().as_u16())),
                Ok(Err(e)) => Err(ProbeError::Transport(e.to_string())),
                Err(_) => Err(ProbeError::Timeout(self.timeout)),
            },
        };

        let elapsed_ms = match &outcome {
            Err(ProbeError::Timeout(timeout)) => timeout.as_millis() as u64,
            _ => start.elapsed().as_millis() as u64,
        };

        ProbeResult { elapsed_ms, outcome }
    }

    fn apply(&self, endpoint: &ServiceEndpoint, result: ProbeResult) {
        let healthy = match &result.outcome {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    service_id = %endpoint.id,
                    url = %endpoint.probe_url(&self.path),
                    error = %e,
                    "Health check failed"
                );
                false
            }
        };

        let state = if healthy { HealthState::Healthy } else { HealthState::Unhealthy };
        // Endpoint may have been removed while the probe was in flight.
        if self.registry.update_health(&endpoint.id, state, result.elapsed_ms, healthy) {
            metrics::record_service_health(&endpoint.id, healthy);
            metrics::record_probe_duration(&endpoint.id, result.elapsed_ms);
        }
    }
}
