//! Liveness and shutdown coordination
//!
//! The supervisor registers this worker process in the shared registry,
//! runs the configured number of dispatcher loops, respawns any that die
//! while shutdown is not signaled, and drives the periodic reconciliation
//! sweep that returns abandoned in-flight entries to the frontier. An
//! external process supervisor may additionally relaunch dead worker
//! processes; this module only exposes and honors the signals.

use crate::config::Config;
use crate::crawler::dispatcher::{DispatchSummary, Dispatcher};
use crate::crawler::fetcher::PageFetcher;
use crate::crawler::router::ResultRouter;
use crate::scope::ScopePolicy;
use crate::store::{FrontierStore, WorkerState};
use crate::DriftnetError;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

/// Pause before replacing a dead dispatcher, so a persistent failure
/// (e.g. an unreachable store) cannot become a hot respawn loop
const RESPAWN_DELAY: Duration = Duration::from_secs(1);

/// Returns this process's identity in the shared worker registry
pub fn worker_identity() -> String {
    let host = std::env::var("HOSTNAME")
        .ok()
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "local".to_string());
    format!("{}-{}", host, std::process::id())
}

/// Supervises this process's dispatcher pool
pub struct Supervisor {
    store: Arc<dyn FrontierStore>,
    fetcher: Arc<dyn PageFetcher>,
    router: Arc<ResultRouter>,
    config: Config,
    worker_id: String,
}

impl Supervisor {
    pub fn new(
        store: Arc<dyn FrontierStore>,
        fetcher: Arc<dyn PageFetcher>,
        scope: ScopePolicy,
        config: Config,
    ) -> Self {
        let router = Arc::new(ResultRouter::new(
            store.clone(),
            scope,
            config.artifacts.namespace_by_domain,
        ));
        Self {
            store,
            fetcher,
            router,
            config,
            worker_id: worker_identity(),
        }
    }

    /// Overrides the worker identity (used by tests and multi-worker rigs)
    pub fn with_worker_id(mut self, worker_id: String) -> Self {
        self.worker_id = worker_id;
        self
    }

    /// Registers the worker, supervises dispatchers to completion, and
    /// deregisters on the way out
    pub async fn run(&self) -> crate::Result<()> {
        self.store
            .register_worker(&self.worker_id, WorkerState::Online)
            .await?;
        tracing::info!(worker = %self.worker_id, "Worker registered");

        let result = self.supervise().await;

        if let Err(e) = self
            .store
            .register_worker(&self.worker_id, WorkerState::Offline)
            .await
        {
            tracing::warn!(worker = %self.worker_id, error = %e, "Could not deregister worker");
        } else {
            tracing::info!(worker = %self.worker_id, "Worker deregistered");
        }

        result
    }

    async fn supervise(&self) -> crate::Result<()> {
        let mut tasks: JoinSet<crate::Result<DispatchSummary>> = JoinSet::new();
        for id in 1..=self.config.dispatcher.dispatchers as usize {
            self.spawn_dispatcher(&mut tasks, id);
        }
        let mut next_id = self.config.dispatcher.dispatchers as usize;

        let mut sweep = tokio::time::interval(Duration::from_secs(
            self.config.dispatcher.sweep_interval_secs,
        ));
        sweep.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        sweep.tick().await;

        let mut last_error: Option<DriftnetError> = None;

        loop {
            tokio::select! {
                joined = tasks.join_next() => {
                    match joined {
                        None => break,
                        Some(Ok(Ok(summary))) => {
                            tracing::info!(
                                worker = %self.worker_id,
                                exit = ?summary.exit,
                                batches = summary.batches,
                                succeeded = summary.succeeded,
                                failed = summary.failed,
                                "Dispatcher exited cleanly"
                            );
                        }
                        Some(Ok(Err(e))) => {
                            tracing::error!(worker = %self.worker_id, error = %e, "Dispatcher loop failed");
                            last_error = Some(e);
                            if self.should_respawn().await {
                                tokio::time::sleep(RESPAWN_DELAY).await;
                                next_id += 1;
                                self.spawn_dispatcher(&mut tasks, next_id);
                            }
                        }
                        Some(Err(join_error)) => {
                            tracing::error!(worker = %self.worker_id, error = %join_error, "Dispatcher task panicked");
                            if self.should_respawn().await {
                                tokio::time::sleep(RESPAWN_DELAY).await;
                                next_id += 1;
                                self.spawn_dispatcher(&mut tasks, next_id);
                            }
                        }
                    }
                }
                _ = sweep.tick() => {
                    self.run_sweep().await;
                }
            }
        }

        match last_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn spawn_dispatcher(&self, tasks: &mut JoinSet<crate::Result<DispatchSummary>>, id: usize) {
        let dispatcher = Dispatcher::new(
            id,
            self.worker_id.clone(),
            self.store.clone(),
            self.fetcher.clone(),
            self.router.clone(),
            self.config.dispatcher.clone(),
        );
        tasks.spawn(async move { dispatcher.run().await });
    }

    /// A dead dispatcher is replaced unless shutdown is in progress. When
    /// even the shutdown flag cannot be read the store is gone, and
    /// respawning would only fail again.
    async fn should_respawn(&self) -> bool {
        match self.store.shutdown_requested(&self.worker_id).await {
            Ok(requested) => !requested,
            Err(e) => {
                tracing::error!(worker = %self.worker_id, error = %e, "Cannot read shutdown flag");
                false
            }
        }
    }

    async fn run_sweep(&self) {
        let older_than = Duration::from_secs(self.config.dispatcher.processing_timeout_secs);
        match self.store.reclaim_stale(older_than).await {
            Ok(0) => {}
            Ok(moved) => {
                tracing::warn!(
                    worker = %self.worker_id,
                    moved,
                    "Reclaimed abandoned in-flight entries"
                );
            }
            Err(e) => {
                tracing::warn!(worker = %self.worker_id, error = %e, "Reconciliation sweep failed");
            }
        }
    }
}
