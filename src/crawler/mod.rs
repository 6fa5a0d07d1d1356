//! Crawler module
//!
//! This module contains the frontier-processing machinery: the fetch
//! collaborator interface, the priority scorer, the bounded-concurrency
//! dispatcher, the result router, and the supervisor that ties them to
//! the worker registry and shutdown signals.

mod dispatcher;
mod fetcher;
mod router;
mod scorer;
mod supervisor;

pub use dispatcher::{DispatchSummary, Dispatcher, DispatcherPhase, ExitCause};
pub use fetcher::{FetchError, FetchedPage, HttpFetcher, PageFetcher};
pub use router::{ResultRouter, RouteSummary};
pub use scorer::{priority_score, SEED_PARENT_SCORE};
pub use supervisor::{worker_identity, Supervisor};

use crate::config::Config;
use crate::scope::ScopePolicy;
use crate::store::FrontierStore;
use std::sync::Arc;
use std::time::Duration;

/// Runs this process's share of the crawl against an already seeded store
///
/// Builds the production fetcher, the scope policy selected by the
/// configuration, and a supervised dispatcher pool, then runs until the
/// frontier drains, the time budget expires, or shutdown is signaled.
pub async fn crawl(store: Arc<dyn FrontierStore>, config: &Config) -> crate::Result<()> {
    let scope = ScopePolicy::from_config(&config.scope)?;
    let fetcher = Arc::new(HttpFetcher::new(Duration::from_millis(
        config.dispatcher.fetch_timeout_ms,
    ))?);

    let supervisor = Supervisor::new(store, fetcher, scope, config.clone());
    supervisor.run().await
}
