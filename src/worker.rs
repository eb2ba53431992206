//! The start/shutdown/readiness contract shared by every long-lived task
//!
//! Adapted from thread-per-worker to task-per-component since this protocol
//! has no blocking swarm loop to isolate onto its own OS thread.
//! Cancellation is a `watch` channel whose `changed()` future resolves once
//! when the supervisor fires shutdown.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{error, info};

/// The receiving half of the shutdown signal; cloned into every component
pub type ShutdownRx = watch::Receiver<()>;

/// Build a PRNG seeded once from the wall clock. Each long-lived loop owns
/// one of these rather than drawing from the shared thread-local generator.
pub fn rng_from_clock() -> StdRng {
    let seed = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos() as u64;
    StdRng::seed_from_u64(seed)
}

/// A long-lived task the supervisor starts in a fixed order and stops in
/// the same order on shutdown.
#[async_trait::async_trait]
pub trait Component: Send + Sync + 'static {
    /// A short name used in logs
    fn name(&self) -> &'static str;

    /// Run until `shutdown` fires, signaling `ready` once initial setup
    /// (e.g. binding a socket) has completed.
    async fn run(self: Arc<Self>, shutdown: ShutdownRx, ready: oneshot::Sender<()>);
}

/// Starts a component's `run` loop on its own task and waits for it to
/// signal readiness before returning.
pub async fn spawn<C: Component>(component: Arc<C>, shutdown: ShutdownRx) -> JoinHandle<()> {
    let (ready_tx, ready_rx) = oneshot::channel();
    let name = component.name();
    let handle = tokio::spawn(async move {
        component.run(shutdown, ready_tx).await;
    });

    if ready_rx.await.is_err() {
        error!(component = name, "component exited before signaling readiness");
    } else {
        info!(component = name, "component ready");
    }

    handle
}

/// Starts every long-lived component in declared order and, on receiving an
/// OS interrupt, propagates shutdown to all of them in the same order and
/// waits for each to return.
pub struct Supervisor {
    shutdown_tx: watch::Sender<()>,
    shutdown_rx: ShutdownRx,
    handles: Vec<(&'static str, JoinHandle<()>)>,
}

impl Supervisor {
    /// Create a supervisor with no components started yet
    pub fn new() -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(());
        Self { shutdown_tx, shutdown_rx, handles: Vec::new() }
    }

    /// Start a component, waiting for it to become ready before returning
    pub async fn start<C: Component>(&mut self, component: Arc<C>) {
        let name = component.name();
        let handle = spawn(component, self.shutdown_rx.clone()).await;
        self.handles.push((name, handle));
    }

    /// Block until an OS interrupt is received, then stop every started
    /// component in the order it was started, waiting for each to return.
    pub async fn run_until_interrupt(self) -> eyre::Result<()> {
        tokio::signal::ctrl_c().await?;
        info!("received shutdown signal");
        self.shutdown().await;
        Ok(())
    }

    /// Signal shutdown and wait for every component to return, in start order
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        for (name, handle) in self.handles {
            if let Err(err) = handle.await {
                error!(component = name, error = %err, "component task panicked");
            } else {
                info!(component = name, "component stopped");
            }
        }
    }
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}
