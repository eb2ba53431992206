use std::sync::Arc;

use clap::ValueEnum;
use tracing::info;

use peerwatch::config::{Config, LogLevel};
use peerwatch::gossip::{BandwidthExperiment, Heartbeat, HttpGossipClient};
use peerwatch::http::{AppState, HttpServer};
use peerwatch::metrics::MetricRing;
use peerwatch::peer_set::{Culler, PeerSet};
use peerwatch::worker::Supervisor;
use peerwatch::{local_ip, telemetry};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // A raw env read, ahead of clap, so Config::load's own logging has a
    // subscriber to go to.
    let provisional_level = std::env::var("LOG_LEVEL")
        .ok()
        .and_then(|raw| LogLevel::from_str(&raw, true).ok())
        .unwrap_or(LogLevel::Info);
    telemetry::init(provisional_level);

    let config = Config::load()?;

    let local_ip = local_ip::discover()?;
    info!(%local_ip, "resolved local address");

    let peers = Arc::new(PeerSet::new(config.ttl, local_ip.to_string()));
    let metrics = Arc::new(MetricRing::new(config.metric_max_capacity));
    let transport = Arc::new(HttpGossipClient::new(config.port, metrics.clone()));

    let state = AppState { peers: peers.clone(), metrics: metrics.clone(), allowed_peers: config.allowed_peers };

    let mut supervisor = Supervisor::new();
    supervisor.start(Arc::new(HttpServer::new(config.port, state))).await;
    supervisor.start(Arc::new(Culler::new(peers.clone(), config.ttl))).await;
    supervisor
        .start(Arc::new(Heartbeat::new(config.leader.clone(), peers.clone(), transport.clone(), config.check_interval())))
        .await;
    supervisor
        .start(Arc::new(BandwidthExperiment::new(
            peers,
            transport,
            metrics,
            config.payload_size,
            config.check_interval(),
        )))
        .await;

    info!("started");
    supervisor.run_until_interrupt().await
}
