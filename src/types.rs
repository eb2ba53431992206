//! Wire types shared between the gossip client and the HTTP handlers

use serde::{Deserialize, Serialize};

/// A single peer observation as exchanged on the wire.
///
/// Field names are title-cased to match the protocol's existing wire
/// contract; this predates the rest of the lower_snake_case JSON in this
/// crate and is kept as-is rather than "fixed", since changing it would
/// break interop with any peer still speaking the old contract.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Glimpse {
    /// The peer's host, typically a bare IP address
    #[serde(rename = "Host")]
    pub host: String,
    /// Seconds remaining before the observing node forgets this peer
    #[serde(rename = "TTL")]
    pub ttl: i64,
}

/// The result of a single bandwidth probe between this node and a peer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BandwidthExperimentResult {
    /// Number of bytes received
    pub num_bytes: u64,
    /// Wall-clock seconds the transfer took
    pub duration_seconds: f64,
    /// `num_bytes / duration_seconds`
    pub avg_bandwidth: f64,
    /// Hex-encoded SHA-256 digest of the bytes received
    pub sha256: String,
}

/// The JSON body returned alongside non-2xx responses
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// A short, machine-stable description of what went wrong
    pub error: String,
}

impl ErrorBody {
    /// Build an error body from any displayable message
    pub fn new(msg: impl Into<String>) -> Self {
        Self { error: msg.into() }
    }
}
