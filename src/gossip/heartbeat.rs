//! The periodic loop that keeps the local peer set fresh by gossiping with
//! the leader and a random subset of known peers.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use rand::rngs::StdRng;
use rand::Rng;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::gossip::client::GossipTransport;
use crate::peer_set::PeerSet;
use crate::worker::{rng_from_clock, Component, ShutdownRx};

/// Runs [`Heartbeat::check`] on a jittered schedule, staggered at startup
/// so nodes starting together don't stay in lock-step.
pub struct Heartbeat {
    leader: String,
    peers: Arc<PeerSet>,
    transport: Arc<dyn GossipTransport>,
    check_interval: Duration,
}

impl Heartbeat {
    /// Build a heartbeat loop. `leader` may be empty, disabling the
    /// leader-pull phase of each check.
    pub fn new(
        leader: String,
        peers: Arc<PeerSet>,
        transport: Arc<dyn GossipTransport>,
        check_interval: Duration,
    ) -> Self {
        Self { leader, peers, transport, check_interval }
    }

    async fn check(&self, rng: &mut StdRng) {
        if !self.leader.is_empty() {
            match self.transport.read_leader(&self.leader).await {
                Ok(leader_peers) => {
                    info!(leader = %self.leader, candidates = leader_peers.len(), "get-from-leader");
                    self.peers.upsert_untrusted(&leader_peers);
                }
                Err(err) => {
                    warn!(leader = %self.leader, error = %err, "get-from-leader failed");
                    return;
                }
            }
        }

        let ttl_threshold = self.check_interval.as_secs() as i64;
        let candidates = self.peers.snapshot();

        let push_set: Vec<String> = candidates
            .into_iter()
            .filter(|g| g.ttl <= ttl_threshold || rng.gen::<f32>() > 0.5)
            .map(|g| g.host)
            .collect();

        let pushes = push_set.into_iter().map(|host| {
            let peers = self.peers.clone();
            let transport = self.transport.clone();
            async move {
                match transport.post_and_read_snapshot(&host).await {
                    Ok(more_peers) => {
                        debug!(peer = %host, "post-to-peer");
                        peers.upsert(&host);
                        peers.upsert_untrusted(&more_peers);
                    }
                    Err(err) => warn!(peer = %host, error = %err, "post-to-peer failed"),
                }
            }
        });

        join_all(pushes).await;
        debug!("heartbeat check done");
    }
}

#[async_trait::async_trait]
impl Component for Heartbeat {
    fn name(&self) -> &'static str {
        "heartbeat"
    }

    async fn run(self: Arc<Self>, mut shutdown: ShutdownRx, ready: oneshot::Sender<()>) {
        let mut rng = rng_from_clock();
        let mut next_interval = Duration::from_secs(rng.gen_range(0..5));
        let _ = ready.send(());

        loop {
            tokio::select! {
                _ = shutdown.changed() => return,
                _ = tokio::time::sleep(next_interval) => {
                    self.check(&mut rng).await;
                }
            }

            let jitter = (rng.gen::<f64>() + 0.5) * self.check_interval.as_secs_f64() / 2.0;
            next_interval = Duration::from_secs(jitter as u64);
            debug!(seconds = next_interval.as_secs_f64(), "next-interval");
        }
    }
}
