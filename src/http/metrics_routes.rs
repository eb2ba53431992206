//! `GET /metrics/data`, and the `GET /metrics` / `GET /` dashboard alias

use std::collections::HashMap;

use axum::extract::State;
use axum::response::Html;
use axum::Json;

use crate::http::AppState;

const DASHBOARD_HTML: &str = include_str!("dashboard.html");

/// `GET /metrics/data`: every metric series as it currently stands
pub async fn data(State(state): State<AppState>) -> Json<HashMap<String, Vec<f64>>> {
    Json(state.metrics.snapshot())
}

/// `GET /metrics` and `GET /`: the static dashboard page
pub async fn dashboard() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}
