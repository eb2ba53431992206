//! Crate-level error taxonomy
//!
//! One error kind per failure mode (transport, decode, integrity, ...);
//! a background loop's iteration error is logged and never allowed to
//! escape the loop. A single enum per concern rather than one per module,
//! since this crate is a single binary rather than a multi-crate workspace.

use thiserror::Error;

/// Errors raised while the node gossips with a peer or the bootstrap leader
#[derive(Debug, Error)]
pub enum GossipError {
    /// The underlying HTTP request failed (connect, timeout, non-2xx, ...)
    #[error("transport error contacting {host}: {source}")]
    Transport {
        /// The peer or leader address that was being contacted
        host: String,
        /// The underlying transport failure
        #[source]
        source: reqwest::Error,
    },

    /// The peer's response body could not be decoded as the expected JSON shape
    #[error("failed to decode response from {host}: {source}")]
    Decode {
        /// The peer or leader address whose response failed to decode
        host: String,
        /// The underlying decode failure
        #[source]
        source: reqwest::Error,
    },

    /// A bandwidth probe's received digest did not match the reported digest
    #[error("bandwidth probe integrity mismatch for {host}: sent sha256 {sent}, peer reported {reported}")]
    Integrity {
        /// The peer that was probed
        host: String,
        /// The digest computed locally over the bytes sent
        sent: String,
        /// The digest the peer reported back
        reported: String,
    },
}

/// Errors raised while loading configuration or resolving the local address
#[derive(Debug, Error)]
pub enum StartupError {
    /// An environment variable could not be parsed into its expected type
    #[error("unable to parse {var}: {reason}")]
    Config {
        /// The environment variable that failed to parse
        var: &'static str,
        /// A human-readable description of the parse failure
        reason: String,
    },

    /// No usable local network interface could be found
    #[error("unable to determine local IP address: {0}")]
    LocalIp(String),
}

/// Errors surfaced by the `/bandwidth` and `/peers` HTTP handlers
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The request body could not be fully read
    #[error("read-request-failed")]
    BodyRead,

    /// The remote address of the connection could not be parsed
    #[error("cannot parse remote address")]
    RemoteAddr,

    /// The remote address is outside the configured allow-list
    #[error("source ip not allowed")]
    Forbidden,
}
