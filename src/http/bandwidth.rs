//! `POST /bandwidth`: the streaming probe target

use std::time::Instant;

use axum::body::Body;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use futures::StreamExt;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::errors::HandlerError;
use crate::http::AppState;
use crate::types::{BandwidthExperimentResult, ErrorBody};

/// Drain the request body through a SHA-256 hasher without buffering it in
/// full, so a caller's large payload doesn't need to fit in memory twice.
pub async fn handle(
    State(state): State<AppState>,
    body: Body,
) -> Result<Json<BandwidthExperimentResult>, (StatusCode, Json<ErrorBody>)> {
    let started = Instant::now();
    let mut hasher = Sha256::new();
    let mut num_bytes: u64 = 0;

    let mut stream = body.into_data_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk
            .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorBody::new(HandlerError::BodyRead.to_string()))))?;
        hasher.update(&chunk);
        num_bytes += chunk.len() as u64;
    }

    let duration_seconds = started.elapsed().as_secs_f64();
    let result = BandwidthExperimentResult {
        num_bytes,
        duration_seconds,
        avg_bandwidth: num_bytes as f64 / duration_seconds,
        sha256: hex::encode(hasher.finalize()),
    };

    state.metrics.report("bandwidth", result.avg_bandwidth);
    info!(num_bytes = result.num_bytes, avg_bandwidth = result.avg_bandwidth, "bandwidth probe served");

    Ok(Json(result))
}
