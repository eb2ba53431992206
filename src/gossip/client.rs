//! The outbound half of the gossip protocol: reading a leader's view,
//! registering with a peer, and running the bandwidth probe.

use std::time::{Duration, Instant};

use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::errors::GossipError;
use crate::metrics::MetricRing;
use crate::types::{BandwidthExperimentResult, Glimpse};

/// The HTTP requests the heartbeat and bandwidth-experiment loops issue
/// against other nodes. Pulled out as a trait so both loops can be tested
/// against a fake transport rather than a real socket.
#[async_trait::async_trait]
pub trait GossipTransport: Send + Sync {
    /// `GET http://<leader_address>/peers`
    async fn read_leader(&self, leader_address: &str) -> Result<Vec<Glimpse>, GossipError>;

    /// `POST http://<host>:<port>/peers` with no body
    async fn post_and_read_snapshot(&self, host: &str) -> Result<Vec<Glimpse>, GossipError>;

    /// `POST http://<host>:<port>/bandwidth` with `payload_size` random bytes
    async fn test_bandwidth(
        &self,
        host: &str,
        payload_size: usize,
    ) -> Result<BandwidthExperimentResult, GossipError>;
}

/// A `reqwest`-backed [`GossipTransport`]. One client is built at startup and
/// shared across every call so connections are pooled.
pub struct HttpGossipClient {
    http: reqwest::Client,
    port: u16,
    metrics: std::sync::Arc<MetricRing>,
}

/// Calls slower than this are logged at info, as a liveness signal rather
/// than an error.
const SLOW_CALL_THRESHOLD: Duration = Duration::from_secs(1);

impl HttpGossipClient {
    /// Build a client bound to `port` (the port every peer is assumed to
    /// listen on) with a conservative request timeout for liveness.
    pub fn new(port: u16, metrics: std::sync::Arc<MetricRing>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client configuration is static and always valid");
        Self { http, port, metrics }
    }

    fn record_round_trip(&self, elapsed: Duration, peer: &str) {
        self.metrics.report("round_trip", elapsed.as_secs_f64());
        if elapsed > SLOW_CALL_THRESHOLD {
            info!(peer, seconds = elapsed.as_secs_f64(), "slow gossip call");
        }
    }

    async fn get_glimpses(&self, host: &str, url: String, method: reqwest::Method) -> Result<Vec<Glimpse>, GossipError> {
        let started = Instant::now();
        let response = self
            .http
            .request(method, &url)
            .send()
            .await
            .map_err(|source| GossipError::Transport { host: host.to_string(), source })?;

        let glimpses = response
            .json::<Vec<Glimpse>>()
            .await
            .map_err(|source| GossipError::Decode { host: host.to_string(), source })?;

        self.record_round_trip(started.elapsed(), host);
        Ok(glimpses)
    }
}

#[async_trait::async_trait]
impl GossipTransport for HttpGossipClient {
    async fn read_leader(&self, leader_address: &str) -> Result<Vec<Glimpse>, GossipError> {
        let url = format!("http://{leader_address}/peers");
        self.get_glimpses(leader_address, url, reqwest::Method::GET).await
    }

    async fn post_and_read_snapshot(&self, host: &str) -> Result<Vec<Glimpse>, GossipError> {
        let url = format!("http://{host}:{port}/peers", port = self.port);
        self.get_glimpses(host, url, reqwest::Method::POST).await
    }

    async fn test_bandwidth(
        &self,
        host: &str,
        payload_size: usize,
    ) -> Result<BandwidthExperimentResult, GossipError> {
        let mut payload = vec![0u8; payload_size];
        rand::thread_rng().fill_bytes(&mut payload);
        let sent_digest = hex::encode(Sha256::digest(&payload));

        let url = format!("http://{host}:{port}/bandwidth", port = self.port);
        let started = Instant::now();
        let response = self
            .http
            .post(&url)
            .body(payload)
            .send()
            .await
            .map_err(|source| GossipError::Transport { host: host.to_string(), source })?;

        let result = response
            .json::<BandwidthExperimentResult>()
            .await
            .map_err(|source| GossipError::Decode { host: host.to_string(), source })?;

        self.record_round_trip(started.elapsed(), host);

        if result.sha256 != sent_digest {
            return Err(GossipError::Integrity {
                host: host.to_string(),
                sent: sent_digest,
                reported: result.sha256,
            });
        }

        Ok(result)
    }
}
