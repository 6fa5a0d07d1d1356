//! Fetch dispatcher
//!
//! A dispatcher repeatedly pops a batch from the frontier, fans the
//! entries out to the fetch collaborator with bounded concurrency, and
//! routes each outcome. The loop is a polling design: the shared store has
//! no notification primitive, so an empty frontier means sleeping a fixed
//! interval before checking again. Shutdown and the optional time budget
//! are checked at the top of every iteration; in-flight fetches run to
//! their own timeout rather than being aborted.

use crate::config::DispatcherConfig;
use crate::crawler::fetcher::{FetchError, PageFetcher};
use crate::crawler::router::ResultRouter;
use crate::store::{FrontierEntry, FrontierStore};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Where a dispatcher currently is in its poll/act/backoff cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherPhase {
    /// Frontier was empty; waiting before the next check
    Polling,
    /// A batch is fanned out to the fetch collaborator
    Dispatching,
    /// The loop has ended; no new batches will start
    Draining,
}

/// Why a dispatcher loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCause {
    /// The global flag or this worker's registry entry requested shutdown
    Shutdown,
    /// The configured wall-clock budget expired
    TimeBudget,
    /// Frontier empty with nothing in flight anywhere
    Drained,
}

/// Counters from one dispatcher run
#[derive(Debug, Clone, Copy)]
pub struct DispatchSummary {
    pub batches: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub exit: ExitCause,
}

/// Bounded-concurrency fetch worker pool over the shared frontier
pub struct Dispatcher {
    id: usize,
    worker_id: String,
    store: Arc<dyn FrontierStore>,
    fetcher: Arc<dyn PageFetcher>,
    router: Arc<ResultRouter>,
    config: DispatcherConfig,
}

impl Dispatcher {
    pub fn new(
        id: usize,
        worker_id: String,
        store: Arc<dyn FrontierStore>,
        fetcher: Arc<dyn PageFetcher>,
        router: Arc<ResultRouter>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            id,
            worker_id,
            store,
            fetcher,
            router,
            config,
        }
    }

    /// Runs the dispatch loop until shutdown, budget expiry, or quiescence
    pub async fn run(&self) -> crate::Result<DispatchSummary> {
        let deadline = self
            .config
            .time_budget_secs
            .map(|secs| Instant::now() + Duration::from_secs(secs));

        let mut phase = DispatcherPhase::Polling;
        let mut batches = 0u64;
        let mut succeeded = 0u64;
        let mut failed = 0u64;

        tracing::info!(dispatcher = self.id, ?phase, "Dispatcher started");

        let exit = loop {
            if self.store.shutdown_requested(&self.worker_id).await? {
                tracing::info!(dispatcher = self.id, "Shutdown signal received");
                break ExitCause::Shutdown;
            }

            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    tracing::info!(dispatcher = self.id, "Time budget expired");
                    break ExitCause::TimeBudget;
                }
            }

            let batch = self.store.pop_batch(self.config.workers as usize).await?;
            if batch.is_empty() {
                if self.store.counts().await?.processing == 0 {
                    tracing::info!(
                        dispatcher = self.id,
                        "Frontier empty and nothing in flight"
                    );
                    break ExitCause::Drained;
                }

                phase = DispatcherPhase::Polling;
                tracing::debug!(
                    dispatcher = self.id,
                    ?phase,
                    "Frontier empty, next poll in {}ms",
                    self.config.poll_interval_ms
                );
                tokio::time::sleep(Duration::from_millis(self.config.poll_interval_ms)).await;
                continue;
            }

            phase = DispatcherPhase::Dispatching;
            batches += 1;
            tracing::debug!(
                dispatcher = self.id,
                ?phase,
                size = batch.len(),
                "Dispatching batch"
            );

            let outcomes: Vec<bool> = stream::iter(batch)
                .map(|entry| self.process_entry(entry))
                .buffer_unordered(self.config.workers as usize)
                .collect()
                .await;

            for ok in outcomes {
                if ok {
                    succeeded += 1;
                } else {
                    failed += 1;
                }
            }
        };

        phase = DispatcherPhase::Draining;
        tracing::info!(
            dispatcher = self.id,
            ?phase,
            batches,
            succeeded,
            failed,
            "Dispatcher finished"
        );

        Ok(DispatchSummary {
            batches,
            succeeded,
            failed,
            exit,
        })
    }

    /// Processes one checked-out entry
    ///
    /// Every failure mode is contained here so one bad URL never aborts
    /// the batch. If even recording the outcome fails, the entry stays in
    /// the in-flight record for the sweep to reclaim.
    async fn process_entry(&self, entry: FrontierEntry) -> bool {
        let fetch_timeout = Duration::from_millis(self.config.fetch_timeout_ms);

        let fetch_result = match tokio::time::timeout(
            fetch_timeout,
            self.fetcher.fetch(&entry.record.url),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                url: entry.record.url.to_string(),
            }),
        };

        match fetch_result {
            Ok(page) => match self.router.route_success(&entry, page).await {
                Ok(_) => true,
                Err(e) => {
                    tracing::error!(
                        url = %entry.record.url,
                        error = %e,
                        "Could not release processed entry; the sweep will reclaim it"
                    );
                    false
                }
            },
            Err(fetch_error) => {
                if let Err(e) = self.router.route_failure(&entry, &fetch_error).await {
                    tracing::error!(
                        url = %entry.record.url,
                        error = %e,
                        "Could not record fetch failure; the sweep will reclaim the entry"
                    );
                }
                false
            }
        }
    }
}
