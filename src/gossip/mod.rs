//! Everything involved in talking to other nodes: the transport trait,
//! its HTTP implementation, and the two periodic loops built on top of it.

mod client;
mod experiment;
mod heartbeat;

pub use client::{GossipTransport, HttpGossipClient};
pub use experiment::BandwidthExperiment;
pub use heartbeat::Heartbeat;
