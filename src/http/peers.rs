//! `GET /peers` and `POST /peers`

use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, State};
use axum::http::StatusCode;
use axum::Json;

use crate::errors::HandlerError;
use crate::http::AppState;
use crate::types::{ErrorBody, Glimpse};

/// `GET /peers`: the current peer set snapshot.
pub async fn list(State(state): State<AppState>) -> Json<Vec<Glimpse>> {
    Json(state.peers.snapshot())
}

/// `POST /peers`: register the caller and return the same snapshot.
pub async fn upsert(
    State(state): State<AppState>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
) -> Result<Json<Vec<Glimpse>>, (StatusCode, Json<ErrorBody>)> {
    let client_ip = parse_remote_ip(&remote.to_string())
        .map_err(|err| (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorBody::new(err.to_string()))))?;

    if !state.allowed_peers.contains(client_ip) {
        return Err((StatusCode::FORBIDDEN, Json(ErrorBody::new(HandlerError::Forbidden.to_string()))));
    }

    state.peers.upsert(&client_ip.to_string());
    Ok(Json(state.peers.snapshot()))
}

/// Parse a `"host:port"` address, handling literal IPv6 addresses (which
/// contain colons of their own) by splitting on the *last* colon.
fn parse_remote_ip(addr: &str) -> Result<IpAddr, HandlerError> {
    let split = addr.rfind(':').ok_or(HandlerError::RemoteAddr)?;
    addr[..split].trim_start_matches('[').trim_end_matches(']').parse().map_err(|_| HandlerError::RemoteAddr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ipv4_with_port() {
        assert_eq!(parse_remote_ip("10.0.0.1:54321").unwrap(), "10.0.0.1".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn parses_bracketed_ipv6_with_port() {
        assert_eq!(parse_remote_ip("[::1]:54321").unwrap(), "::1".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn rejects_addresses_with_no_colon() {
        assert!(parse_remote_ip("10.0.0.1").is_err());
    }
}
