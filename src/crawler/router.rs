//! Result routing
//!
//! Turns one fetch outcome into store updates: admitted links are scored
//! and enqueued, extracted artifacts recorded, and the source fingerprint
//! released from the in-flight record into `visited` or `failed`.

use crate::crawler::fetcher::{FetchError, FetchedPage};
use crate::crawler::scorer::priority_score;
use crate::scope::ScopePolicy;
use crate::store::{FrontierEntry, FrontierStore, ProcessingOutcome, UrlRecord};
use crate::url::Fingerprint;
use std::collections::HashSet;
use std::sync::Arc;

/// What one successful routing pass accomplished
#[derive(Debug, Default, Clone, Copy)]
pub struct RouteSummary {
    /// Links that passed the scope policy
    pub admitted: usize,

    /// Links actually enqueued (admitted minus known fingerprints)
    pub inserted: usize,

    /// Artifacts not previously in the artifact set
    pub new_artifacts: u64,
}

/// Routes fetch outcomes into the shared store
pub struct ResultRouter {
    store: Arc<dyn FrontierStore>,
    scope: ScopePolicy,
    namespace_artifacts: bool,
}

impl ResultRouter {
    pub fn new(
        store: Arc<dyn FrontierStore>,
        scope: ScopePolicy,
        namespace_artifacts: bool,
    ) -> Self {
        Self {
            store,
            scope,
            namespace_artifacts,
        }
    }

    /// Routes a successful fetch
    ///
    /// Link insertion and artifact recording are subordinate to releasing
    /// the source: if they fail midway the error is logged and the source
    /// is still marked visited, so a partially applied round can never
    /// cause the source to be refetched indefinitely. Entries stranded by
    /// a worker dying outright are the sweep's job instead.
    pub async fn route_success(
        &self,
        source: &FrontierEntry,
        page: FetchedPage,
    ) -> crate::store::StoreResult<RouteSummary> {
        let fingerprint = source.record.fingerprint();

        let summary = match self.ingest_discoveries(source, &page).await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::warn!(
                    url = %source.record.url,
                    error = %e,
                    "Partial routing failure; source will still be marked visited"
                );
                RouteSummary::default()
            }
        };

        self.store
            .complete(&fingerprint, ProcessingOutcome::Visited)
            .await?;

        tracing::debug!(
            url = %source.record.url,
            admitted = summary.admitted,
            inserted = summary.inserted,
            artifacts = summary.new_artifacts,
            "Routed page"
        );

        Ok(summary)
    }

    /// Routes a failed fetch: the entry moves to `failed`, never dropped
    pub async fn route_failure(
        &self,
        source: &FrontierEntry,
        error: &FetchError,
    ) -> crate::store::StoreResult<()> {
        tracing::warn!(url = %source.record.url, error = %error, "Fetch failed");
        self.store
            .complete(&source.record.fingerprint(), ProcessingOutcome::Failed)
            .await
    }

    /// Filters, scores, and enqueues discovered links; records artifacts
    async fn ingest_discoveries(
        &self,
        source: &FrontierEntry,
        page: &FetchedPage,
    ) -> crate::store::StoreResult<RouteSummary> {
        let child_depth = source.record.depth + 1;

        let mut seen = HashSet::new();
        let mut admitted: Vec<UrlRecord> = Vec::new();
        for link in &page.links {
            if !self.scope.admit(link, &source.record.url, child_depth) {
                tracing::debug!(url = %link, "Link out of scope");
                continue;
            }
            let Ok(record) = UrlRecord::new(link.clone(), child_depth) else {
                continue;
            };
            if seen.insert(record.fingerprint()) {
                admitted.push(record);
            }
        }

        let fingerprints: Vec<Fingerprint> =
            admitted.iter().map(|record| record.fingerprint()).collect();
        let visited = self.store.any_visited(&fingerprints).await?;

        let mut entries = Vec::new();
        for (record, is_visited) in admitted.iter().zip(visited) {
            if is_visited {
                continue;
            }
            let domain_count = self.store.next_domain_count(&record.domain).await?;
            entries.push(FrontierEntry {
                record: record.clone(),
                score: priority_score(domain_count, source.score),
            });
        }

        let inserted = self.store.insert_if_absent(&entries).await?;

        let new_artifacts = if page.emails.is_empty() {
            0
        } else {
            let namespace = self
                .namespace_artifacts
                .then_some(source.record.domain.as_str());
            self.store.add_artifacts(namespace, &page.emails).await?
        };

        Ok(RouteSummary {
            admitted: admitted.len(),
            inserted,
            new_artifacts,
        })
    }
}
