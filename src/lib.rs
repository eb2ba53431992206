pub mod config;
pub mod errors;
pub mod gossip;
pub mod http;
pub mod local_ip;
pub mod metrics;
pub mod peer_set;
pub mod telemetry;
pub mod types;
pub mod worker;
