//! The HTTP surface: peer list/upsert, the bandwidth probe target, and the
//! metrics dashboard.

mod bandwidth;
mod metrics_routes;
mod peers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use ipnetwork::IpNetwork;
use tokio::sync::oneshot;
use tracing::info;

use crate::metrics::MetricRing;
use crate::peer_set::PeerSet;
use crate::worker::{Component, ShutdownRx};

/// State shared across every handler
#[derive(Clone)]
pub struct AppState {
    pub peers: Arc<PeerSet>,
    pub metrics: Arc<MetricRing>,
    pub allowed_peers: IpNetwork,
}

/// Build the full router over the given shared state. Exposed so
/// integration tests can drive it directly without binding a socket.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/peers", get(peers::list).post(peers::upsert))
        .route("/bandwidth", post(bandwidth::handle))
        .route("/metrics/data", get(metrics_routes::data))
        .route("/metrics", get(metrics_routes::dashboard))
        .route("/", get(metrics_routes::dashboard))
        .with_state(state)
}

/// The HTTP acceptor, run as a supervised [`Component`].
pub struct HttpServer {
    port: u16,
    state: AppState,
}

impl HttpServer {
    /// Build a server that will bind `0.0.0.0:<port>` once started
    pub fn new(port: u16, state: AppState) -> Self {
        Self { port, state }
    }
}

#[async_trait::async_trait]
impl Component for HttpServer {
    fn name(&self) -> &'static str {
        "http-server"
    }

    async fn run(self: Arc<Self>, mut shutdown: ShutdownRx, ready: oneshot::Sender<()>) {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = match tokio::net::TcpListener::bind(addr).await {
            Ok(listener) => listener,
            Err(err) => {
                tracing::error!(%addr, error = %err, "failed to bind http server");
                let _ = ready.send(());
                return;
            }
        };

        info!(%addr, "http server listening");
        let _ = ready.send(());

        let router = app(self.state.clone()).into_make_service_with_connect_info::<SocketAddr>();
        let server = axum::serve(listener, router).with_graceful_shutdown(async move {
            let _ = shutdown.changed().await;
        });

        if let Err(err) = server.await {
            tracing::error!(error = %err, "http server exited with error");
        }
    }
}
