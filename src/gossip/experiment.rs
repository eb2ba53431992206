//! The periodic loop that samples one peer and measures bandwidth to it.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::Rng;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::gossip::client::GossipTransport;
use crate::metrics::MetricRing;
use crate::peer_set::PeerSet;
use crate::worker::{rng_from_clock, Component, ShutdownRx};

/// Same scheduling skeleton as [`crate::gossip::Heartbeat`]: a randomized
/// startup stagger followed by a jittered recurring interval.
pub struct BandwidthExperiment {
    peers: Arc<PeerSet>,
    transport: Arc<dyn GossipTransport>,
    metrics: Arc<MetricRing>,
    payload_size: usize,
    check_interval: Duration,
}

impl BandwidthExperiment {
    /// Build a bandwidth experiment loop
    pub fn new(
        peers: Arc<PeerSet>,
        transport: Arc<dyn GossipTransport>,
        metrics: Arc<MetricRing>,
        payload_size: usize,
        check_interval: Duration,
    ) -> Self {
        Self { peers, transport, metrics, payload_size, check_interval }
    }

    async fn run_once(&self, rng: &mut StdRng) {
        let candidates = self.peers.snapshot();
        if candidates.is_empty() {
            debug!("no peers known; skipping bandwidth experiment");
            return;
        }

        let index = rng.gen_range(0..candidates.len());
        let target = &candidates[index].host;

        match self.transport.test_bandwidth(target, self.payload_size).await {
            Ok(result) => {
                self.metrics.report("bandwidth", result.avg_bandwidth);
                debug!(peer = %target, avg_bandwidth = result.avg_bandwidth, "bandwidth probe done");
            }
            Err(err) => warn!(peer = %target, error = %err, "bandwidth probe failed"),
        }
    }
}

#[async_trait::async_trait]
impl Component for BandwidthExperiment {
    fn name(&self) -> &'static str {
        "bandwidth-experiment"
    }

    async fn run(self: Arc<Self>, mut shutdown: ShutdownRx, ready: oneshot::Sender<()>) {
        let mut rng = rng_from_clock();
        let mut next_interval = Duration::from_secs(rng.gen_range(0..5));
        let _ = ready.send(());

        loop {
            tokio::select! {
                _ = shutdown.changed() => return,
                _ = tokio::time::sleep(next_interval) => {
                    self.run_once(&mut rng).await;
                }
            }

            let jitter = (rng.gen::<f64>() + 0.5) * self.check_interval.as_secs_f64() / 2.0;
            next_interval = Duration::from_secs(jitter as u64);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::GossipError;
    use crate::types::{BandwidthExperimentResult, Glimpse};

    struct FakeTransport;

    #[async_trait::async_trait]
    impl GossipTransport for FakeTransport {
        async fn read_leader(&self, _leader_address: &str) -> Result<Vec<Glimpse>, GossipError> {
            unimplemented!("not exercised by experiment tests")
        }

        async fn post_and_read_snapshot(&self, _host: &str) -> Result<Vec<Glimpse>, GossipError> {
            unimplemented!("not exercised by experiment tests")
        }

        async fn test_bandwidth(&self, _host: &str, _payload_size: usize) -> Result<BandwidthExperimentResult, GossipError> {
            Ok(BandwidthExperimentResult {
                num_bytes: 1024,
                duration_seconds: 0.5,
                avg_bandwidth: 2048.0,
                sha256: "deadbeef".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn run_once_reports_bandwidth_for_a_known_peer() {
        let peers = Arc::new(PeerSet::new(Duration::from_secs(30), "self".to_string()));
        peers.upsert("peer-a");
        let metrics = Arc::new(MetricRing::new(10));

        let experiment =
            BandwidthExperiment::new(peers, Arc::new(FakeTransport), metrics.clone(), 1024, Duration::from_secs(30));
        experiment.run_once(&mut rng_from_clock()).await;

        assert_eq!(metrics.snapshot()["bandwidth"], vec![2048.0]);
    }

    #[tokio::test]
    async fn run_once_is_a_noop_with_no_known_peers() {
        let peers = Arc::new(PeerSet::new(Duration::from_secs(30), String::new()));
        let metrics = Arc::new(MetricRing::new(10));

        let experiment =
            BandwidthExperiment::new(peers, Arc::new(FakeTransport), metrics.clone(), 1024, Duration::from_secs(30));
        experiment.run_once(&mut rng_from_clock()).await;

        assert!(metrics.snapshot().is_empty());
    }
}
