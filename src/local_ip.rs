//! Local address discovery used to self-identify in gossip exchanges
//!
//! An IPv4 address reachable by peers on the local network, not a
//! loopback or link-local one, since this is the address other nodes
//! learn about us through.

use std::net::{IpAddr, Ipv4Addr};

use tracing::warn;

use crate::errors::StartupError;

/// Find the local address to advertise to peers: the first non-loopback
/// IPv4 address among local interfaces, falling back to the first
/// non-loopback IPv6 address if no IPv4 one exists, and to loopback (with
/// a warning) if neither does.
///
/// Failure to enumerate interfaces at all — as opposed to enumerating
/// them and finding nothing usable — is fatal at startup.
pub fn discover() -> Result<IpAddr, StartupError> {
    let interfaces =
        local_ip_address::list_afinet_netifas().map_err(|err| StartupError::LocalIp(err.to_string()))?;

    if let Some(addr) = interfaces.iter().find_map(|(_, ip)| match ip {
        IpAddr::V4(v4) if !v4.is_loopback() => Some(IpAddr::V4(*v4)),
        _ => None,
    }) {
        return Ok(addr);
    }

    if let Some(addr) = interfaces.iter().find_map(|(_, ip)| match ip {
        IpAddr::V6(v6) if !v6.is_loopback() => Some(IpAddr::V6(*v6)),
        _ => None,
    }) {
        warn!(%addr, "no non-loopback IPv4 interface found; advertising IPv6 address instead");
        return Ok(addr);
    }

    warn!("no non-loopback network interface found; falling back to loopback");
    Ok(IpAddr::V4(Ipv4Addr::LOCALHOST))
}
