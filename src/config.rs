//! Environment-backed configuration
//!
//! Each field is an `(env var, default, parser)` triple, declared via
//! `clap`'s derive API. [`Config::load`] additionally logs every resolved
//! value at info, which clap doesn't do for us.

use std::time::Duration;

use clap::{Parser, ValueEnum};
use ipnetwork::IpNetwork;
use serde::Deserialize;
use tracing::info;

use crate::errors::StartupError;

/// Log verbosity
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
#[clap(rename_all = "lower")]
pub enum LogLevel {
    /// Verbose per-tick and per-request detail
    Debug,
    /// Steady-state operational messages (the default)
    Info,
    /// Only failures
    Error,
    /// Only failures severe enough that the process is about to exit
    ///
    /// `tracing` has no level below `ERROR`; `Fatal` filters the same as
    /// `Error` and exists only to keep this a four-level config surface.
    Fatal,
}

impl LogLevel {
    /// The `tracing_subscriber` filter directive this level corresponds to
    pub fn as_filter_directive(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Error | LogLevel::Fatal => "error",
        }
    }
}

/// Node configuration, assembled once at startup from environment variables
#[derive(Parser, Debug, Clone)]
#[command(name = "peerwatch", about = "Gossip-based peer discovery and mesh bandwidth measurement")]
pub struct Config {
    /// Local HTTP bind port
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Default lifetime granted to upserted peers, e.g. "30s"
    #[arg(long, env = "TTL", default_value = "30s", value_parser = parse_duration)]
    pub ttl: Duration,

    /// The network from which `/peers` POSTs are accepted
    #[arg(long, env = "ALLOWED_PEERS", default_value = "0.0.0.0/0")]
    pub allowed_peers: IpNetwork,

    /// Bootstrap rendezvous host, `host[:port]`; empty disables leader gossip
    #[arg(long, env = "LEADER", default_value = "")]
    pub leader: String,

    /// Log verbosity
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Per-metric sample ring capacity
    #[arg(long, env = "METRIC_MAX_CAPACITY", default_value_t = 1000)]
    pub metric_max_capacity: usize,

    /// Bandwidth probe payload size, in bytes
    #[arg(long, env = "PAYLOAD_SIZE", default_value_t = 1_048_576)]
    pub payload_size: usize,

    /// Base period, in seconds, the heartbeat and experiment loops jitter around
    ///
    /// The jitter formula truncates to integer seconds, which for values
    /// below 4 can produce a zero-second next interval (a tight loop). That
    /// behavior is preserved rather than guarded against; deployments
    /// should set this to 8 or higher.
    #[arg(long, env = "CHECK_INTERVAL_SECONDS", default_value_t = 30)]
    pub check_interval_seconds: u64,
}

impl Config {
    /// Seconds form of [`Config::ttl`]
    pub fn ttl_seconds(&self) -> u64 {
        self.ttl.as_secs()
    }

    /// [`Config::check_interval_seconds`] as a [`Duration`]
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_seconds)
    }

    /// Load configuration from the process environment, resolving the
    /// `VCAP_APPLICATION` → `LEADER` fallback first, then parsing and
    /// logging every resolved value.
    pub fn load() -> Result<Self, StartupError> {
        seed_leader_from_vcap();

        let config = Config::try_parse().map_err(|err| StartupError::Config {
            var: "<config>",
            reason: err.to_string(),
        })?;

        info!(port = config.port, "parsed-config");
        info!(ttl_seconds = config.ttl_seconds(), "parsed-config");
        info!(allowed_peers = %config.allowed_peers, "parsed-config");
        info!(leader = %config.leader, "parsed-config");
        info!(log_level = ?config.log_level, "parsed-config");
        info!(metric_max_capacity = config.metric_max_capacity, "parsed-config");
        info!(payload_size = config.payload_size, "parsed-config");
        info!(check_interval_seconds = config.check_interval_seconds, "parsed-config");

        Ok(config)
    }
}

/// The subset of a Cloud Foundry `VCAP_APPLICATION` blob this node reads
#[derive(Debug, Deserialize)]
struct VcapApplication {
    #[serde(default, rename = "uris")]
    uris: Vec<String>,
}

/// If `LEADER` is unset or empty, seed it from the first URI in
/// `VCAP_APPLICATION`, if present. Run before argument parsing so that an
/// explicit `LEADER` always wins.
fn seed_leader_from_vcap() {
    let leader_set = std::env::var("LEADER").map(|v| !v.is_empty()).unwrap_or(false);
    if leader_set {
        return;
    }

    let Ok(raw) = std::env::var("VCAP_APPLICATION") else { return };
    let Ok(vcap) = serde_json::from_str::<VcapApplication>(&raw) else { return };
    if let Some(uri) = vcap.uris.into_iter().next() {
        std::env::set_var("LEADER", uri);
    }
}

/// Parse a duration written as an integer followed by an optional `s`,
/// `m`, or `h` suffix (bare integers are seconds), e.g. `"30s"`.
fn parse_duration(raw: &str) -> Result<Duration, String> {
    let raw = raw.trim();
    let (digits, multiplier) = match raw.strip_suffix('h') {
        Some(d) => (d, 3600),
        None => match raw.strip_suffix('m') {
            Some(d) => (d, 60),
            None => (raw.strip_suffix('s').unwrap_or(raw), 1),
        },
    };
    let value: u64 = digits.parse().map_err(|_| format!("{raw:?} is not a valid duration"))?;
    Ok(Duration::from_secs(value * multiplier))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_suffixed_durations() {
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("12").unwrap(), Duration::from_secs(12));
    }

    #[test]
    fn rejects_garbage_durations() {
        assert!(parse_duration("soon").is_err());
    }

    #[test]
    fn vcap_seeds_leader_when_unset() {
        std::env::remove_var("LEADER");
        std::env::set_var("VCAP_APPLICATION", r#"{"uris":["bootstrap.example.com"]}"#);
        seed_leader_from_vcap();
        assert_eq!(std::env::var("LEADER").unwrap(), "bootstrap.example.com");
        std::env::remove_var("LEADER");
        std::env::remove_var("VCAP_APPLICATION");
    }

    #[test]
    fn explicit_leader_wins_over_vcap() {
        std::env::set_var("LEADER", "explicit.example.com");
        std::env::set_var("VCAP_APPLICATION", r#"{"uris":["bootstrap.example.com"]}"#);
        seed_leader_from_vcap();
        assert_eq!(std::env::var("LEADER").unwrap(), "explicit.example.com");
        std::env::remove_var("LEADER");
        std::env::remove_var("VCAP_APPLICATION");
    }
}
