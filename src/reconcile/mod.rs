//! The reconciliation loop.
//!
//! Drives the page tree toward the configured document: load, project,
//! then settle. External tree mutations wake the loop through the tree's
//! revision channel; a fallback interval timer catches anything the
//! channel misses. Every pass that changes the tree consumes one attempt
//! from a bounded budget, so a page that keeps fighting back can never
//! trap the loop in endless churn.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch, RwLock};
use tracing::{debug, info, warn};

use crate::config::{BackupStore, ConfigLoader, RemoteSource};
use crate::dom::PageTree;
use crate::metrics::Metrics;
use crate::projector::Projector;

/// Observable state of the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Not yet started.
    Idle,
    /// Resolving the current document.
    Loading,
    /// Applying projectors to the tree.
    Projecting,
    /// A pass changed the tree; another pass will confirm convergence.
    Scheduled,
    /// The last pass wrote nothing.
    Converged,
    /// The attempt budget ran out before the tree settled.
    Exhausted,
}

impl std::fmt::Display for LoopState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Projecting => "projecting",
            Self::Scheduled => "scheduled",
            Self::Converged => "converged",
            Self::Exhausted => "exhausted",
        };
        write!(f, "{}", name)
    }
}

/// Control handle for a spawned loop.
pub struct ReconcileHandle {
    reapply_tx: mpsc::Sender<()>,
    stop_tx: watch::Sender<bool>,
    state_rx: watch::Receiver<LoopState>,
}

impl ReconcileHandle {
    /// Requests a full re-application, resetting the attempt budget.
    pub async fn reapply(&self) {
        let _ = self.reapply_tx.send(()).await;
    }

    /// Stops the loop. Idempotent.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    /// Current loop state.
    pub fn state(&self) -> LoopState {
        *self.state_rx.borrow()
    }

    /// Waits until the loop settles, in convergence or exhaustion.
    pub async fn settled(&mut self) -> LoopState {
        loop {
            let state = *self.state_rx.borrow_and_update();
            if state == LoopState::Converged || state == LoopState::Exhausted {
                return state;
            }
            if self.state_rx.changed().await.is_err() {
                return state;
            }
        }
    }
}

/// Loads the document and projects it onto a shared tree until quiescent.
pub struct ReconcileLoop<R: RemoteSource, S: BackupStore> {
    loader: ConfigLoader<R, S>,
    projectors: Vec<Box<dyn Projector>>,
    tree: Arc<RwLock<PageTree>>,
    metrics: Arc<Metrics>,
    retry_interval: Duration,
    max_attempts: u32,
}

impl<R, S> ReconcileLoop<R, S>
where
    R: RemoteSource + 'static,
    S: BackupStore + 'static,
{
    pub fn new(
        loader: ConfigLoader<R, S>,
        projectors: Vec<Box<dyn Projector>>,
        tree: Arc<RwLock<PageTree>>,
        metrics: Arc<Metrics>,
        retry_interval: Duration,
        max_attempts: u32,
    ) -> Self {
        Self {
            loader,
            projectors,
            tree,
            metrics,
            retry_interval,
            max_attempts,
        }
    }

    /// Spawns the loop onto the runtime.
    pub fn spawn(self) -> (ReconcileHandle, tokio::task::JoinHandle<()>) {
        let (reapply_tx, reapply_rx) = mpsc::channel(8);
        let (stop_tx, stop_rx) = watch::channel(false);
        let (state_tx, state_rx) = watch::channel(LoopState::Idle);

        let handle = ReconcileHandle {
            reapply_tx,
            stop_tx,
            state_rx,
        };
        let join = tokio::spawn(self.run(reapply_rx, stop_rx, state_tx));

        (handle, join)
    }

    async fn run(
        self,
        mut reapply_rx: mpsc::Receiver<()>,
        mut stop_rx: watch::Receiver<bool>,
        state_tx: watch::Sender<LoopState>,
    ) {
        let mut mutation_rx = self.tree.read().await.subscribe();
        let mut remaining = self.max_attempts;

        self.reconcile(&state_tx, &mut mutation_rx, &mut remaining)
            .await;

        let mut ticker = tokio::time::interval(self.retry_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        ticker.reset();

        loop {
            tokio::select! {
                _ = stop_rx.changed() => {
                    info!("Reconciliation loop stopped");
                    break;
                }
                request = reapply_rx.recv() => {
                    match request {
                        Some(()) => {
                            debug!("Re-application requested, resetting attempt budget");
                            remaining = self.max_attempts;
                            self.reconcile(&state_tx, &mut mutation_rx, &mut remaining).await;
                        }
                        None => break,
                    }
                }
                changed = mutation_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    if remaining > 0 {
                        debug!("External tree mutation observed");
                        self.reconcile(&state_tx, &mut mutation_rx, &mut remaining).await;
                    }
                }
                // Fallback for anything the mutation channel misses.
                _ = ticker.tick() => {
                    let settled = *state_tx.borrow() == LoopState::Converged
                        || *state_tx.borrow() == LoopState::Exhausted;
                    if !settled && remaining > 0 {
                        self.reconcile(&state_tx, &mut mutation_rx, &mut remaining).await;
                    }
                }
            }
        }
    }

    /// Runs passes until a pass writes nothing or the budget runs out.
    /// Every tree-changing pass consumes one attempt; a clean pass means
    /// the tree has converged on the document.
    async fn reconcile(
        &self,
        state_tx: &watch::Sender<LoopState>,
        mutation_rx: &mut watch::Receiver<u64>,
        remaining: &mut u32,
    ) {
        loop {
            let changed = self.pass(state_tx, mutation_rx).await;

            if !changed {
                debug!("Projection pass wrote nothing, tree is converged");
                let _ = state_tx.send(LoopState::Converged);
                return;
            }

            *remaining = remaining.saturating_sub(1);
            if *remaining == 0 {
                warn!("Attempt budget exhausted before the tree settled");
                let _ = state_tx.send(LoopState::Exhausted);
                return;
            }

            let _ = state_tx.send(LoopState::Scheduled);
        }
    }

    /// One load-and-project pass. Returns whether the tree changed.
    async fn pass(
        &self,
        state_tx: &watch::Sender<LoopState>,
        mutation_rx: &mut watch::Receiver<u64>,
    ) -> bool {
        let _ = state_tx.send(LoopState::Loading);
        let loaded = self.loader.load().await;
        self.metrics.record_config_load(loaded.tier);

        let _ = state_tx.send(LoopState::Projecting);
        let mut changed = false;
        {
            let mut tree = self.tree.write().await;
            for projector in &self.projectors {
                let report = projector.project(&loaded.document, &mut tree);
                self.metrics.record_projection(projector.name(), &report);
                changed |= report.changed();
            }

            // Our own writes bumped the revision; absorb them before the
            // guard drops so an external mutation racing for the lock is
            // never marked seen without being examined.
            let _ = mutation_rx.borrow_and_update();
        }
        self.metrics.record_reconcile_attempt();

        changed
    }
}
