//! The in-memory, TTL-keyed peer membership map
//!
//! A single exclusive-owner object, a mutex guarding the whole map, and
//! every read returning a fresh, independent sequence rather than a
//! reference into the map.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tokio::sync::oneshot;
use tokio::time::interval;
use tracing::debug;

use crate::types::Glimpse;
use crate::worker::{Component, ShutdownRx};

/// Owns the membership map and the parameters used to expire entries from it
#[derive(Debug)]
pub struct PeerSet {
    inner: Mutex<HashMap<String, Instant>>,
    default_ttl: Duration,
    local_host: String,
}

impl PeerSet {
    /// Create an empty peer set for the given local host and default TTL
    pub fn new(default_ttl: Duration, local_host: String) -> Self {
        Self { inner: Mutex::new(HashMap::new()), default_ttl, local_host: local_host.trim().to_string() }
    }

    /// Insert or refresh `host` with the default TTL, never shortening its
    /// existing lease (monotonic expiry).
    pub fn upsert(&self, host: &str) {
        self.upsert_with_ttl(host, self.default_ttl);
    }

    /// Insert or refresh a batch of glimpses learned from a peer rather than
    /// observed first-hand, halving each TTL (capped at the local default)
    /// so hearsay decays faster than direct observation.
    pub fn upsert_untrusted(&self, glimpses: &[Glimpse]) {
        for glimpse in glimpses {
            let capped = (glimpse.ttl.max(0) as u64).min(self.default_ttl.as_secs());
            self.upsert_with_ttl(&glimpse.host, Duration::from_secs(capped / 2));
        }
    }

    fn upsert_with_ttl(&self, host: &str, ttl: Duration) {
        let host = host.trim();
        if host.is_empty() {
            return;
        }
        let expiry = Instant::now() + ttl;
        let mut peers = self.inner.lock().unwrap();
        match peers.get(host) {
            Some(existing) if *existing >= expiry => {}
            _ => {
                peers.insert(host.to_string(), expiry);
            }
        }
    }

    /// Return every non-expired entry as a `Glimpse`, sorted ascending by
    /// remaining TTL (soonest to expire first).
    pub fn snapshot(&self) -> Vec<Glimpse> {
        let now = Instant::now();
        let peers = self.inner.lock().unwrap();
        let mut out: Vec<Glimpse> = peers
            .iter()
            .filter_map(|(host, expiry)| {
                let ttl = expiry.saturating_duration_since(now).as_secs() as i64;
                (ttl > 0).then(|| Glimpse { host: host.clone(), ttl })
            })
            .collect();
        out.sort_by_key(|g| g.ttl);
        out
    }

    /// Drop every entry that has expired, then re-register the local host
    /// with a fresh lease so it never expires in practice.
    pub fn cull(&self) {
        let now = Instant::now();
        let mut peers = self.inner.lock().unwrap();
        peers.retain(|_, expiry| *expiry > now);
        peers.insert(self.local_host.clone(), now + self.default_ttl);
    }
}

/// Periodically culls the peer set, at half the default TTL
pub struct Culler {
    peers: std::sync::Arc<PeerSet>,
    period: Duration,
}

impl Culler {
    /// Build a culler that runs at `default_ttl / 2`
    pub fn new(peers: std::sync::Arc<PeerSet>, default_ttl: Duration) -> Self {
        Self { peers, period: default_ttl / 2 }
    }
}

#[async_trait::async_trait]
impl Component for Culler {
    fn name(&self) -> &'static str {
        "culler"
    }

    async fn run(self: std::sync::Arc<Self>, mut shutdown: ShutdownRx, ready: oneshot::Sender<()>) {
        let mut ticker = interval(self.period);
        let _ = ready.send(());
        loop {
            tokio::select! {
                _ = shutdown.changed() => return,
                _ = ticker.tick() => {
                    self.peers.cull();
                    debug!("culled peer set");
                }
            }
        }
    }
}
