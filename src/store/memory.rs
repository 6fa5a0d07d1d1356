//! In-memory store implementation
//!
//! A process-local [`FrontierStore`] with the same atomicity contract as
//! the Redis backend, used by unit and integration tests. One mutex guards
//! all state, so every trait method is observably atomic.

use crate::store::traits::{FrontierStore, StoreError, StoreResult};
use crate::store::{FrontierEntry, ProcessingOutcome, StoreCounts, WorkerState};
use crate::url::Fingerprint;
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Default)]
struct Inner {
    frontier: HashMap<Fingerprint, FrontierEntry>,
    processing: HashMap<Fingerprint, (FrontierEntry, Instant)>,
    visited: HashSet<Fingerprint>,
    failed: HashSet<Fingerprint>,
    processed: HashSet<Fingerprint>,
    domain_counts: HashMap<String, u64>,
    artifacts: BTreeSet<String>,
    artifacts_by_domain: HashMap<String, BTreeSet<String>>,
    handled_artifacts: BTreeSet<String>,
    registry: HashMap<String, WorkerState>,
    global_shutdown: bool,
}

/// Process-local store backend for tests
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<std::sync::MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Command("store mutex poisoned".to_string()))
    }

    /// Marks artifacts as handled by the downstream consumer (test helper)
    pub fn mark_artifacts_handled(&self, values: &[String]) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.handled_artifacts.extend(values.iter().cloned());
        }
    }

    /// Current counter value for a domain without bumping it (test helper)
    pub fn domain_count_snapshot(&self, domain: &str) -> u64 {
        self.inner
            .lock()
            .map(|inner| inner.domain_counts.get(domain).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Registry snapshot for assertions
    pub fn registry_snapshot(&self) -> HashMap<String, WorkerState> {
        self.inner
            .lock()
            .map(|inner| inner.registry.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl FrontierStore for MemoryStore {
    async fn is_visited(&self, fingerprint: &Fingerprint) -> StoreResult<bool> {
        Ok(self.lock()?.visited.contains(fingerprint))
    }

    async fn any_visited(&self, fingerprints: &[Fingerprint]) -> StoreResult<Vec<bool>> {
        let inner = self.lock()?;
        Ok(fingerprints
            .iter()
            .map(|fp| inner.visited.contains(fp))
            .collect())
    }

    async fn mark_visited(&self, fingerprint: &Fingerprint) -> StoreResult<()> {
        self.lock()?.visited.insert(fingerprint.clone());
        Ok(())
    }

    async fn next_domain_count(&self, domain: &str) -> StoreResult<u64> {
        let mut inner = self.lock()?;
        let count = inner.domain_counts.entry(domain.to_string()).or_insert(0);
        *count += 1;
        Ok(*count)
    }

    async fn any_queued(&self, fingerprints: &[Fingerprint]) -> StoreResult<Vec<bool>> {
        let inner = self.lock()?;
        Ok(fingerprints
            .iter()
            .map(|fp| inner.frontier.contains_key(fp) || inner.processing.contains_key(fp))
            .collect())
    }

    async fn insert_if_absent(&self, entries: &[FrontierEntry]) -> StoreResult<usize> {
        let mut inner = self.lock()?;
        let mut added = 0;
        for entry in entries {
            let fp = entry.record.fingerprint();
            if inner.visited.contains(&fp)
                || inner.failed.contains(&fp)
                || inner.processing.contains_key(&fp)
                || inner.frontier.contains_key(&fp)
            {
                continue;
            }
            inner.frontier.insert(fp, entry.clone());
            added += 1;
        }
        Ok(added)
    }

    async fn pop_batch(&self, max: usize) -> StoreResult<Vec<FrontierEntry>> {
        let mut inner = self.lock()?;

        let mut ordered: Vec<(Fingerprint, f64)> = inner
            .frontier
            .iter()
            .map(|(fp, entry)| (fp.clone(), entry.score))
            .collect();
        ordered.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });

        let now = Instant::now();
        let mut batch = Vec::new();
        for (fp, _) in ordered.into_iter().take(max) {
            if let Some(entry) = inner.frontier.remove(&fp) {
                inner.processing.insert(fp, (entry.clone(), now));
                batch.push(entry);
            }
        }
        Ok(batch)
    }

    async fn frontier_len(&self) -> StoreResult<u64> {
        Ok(self.lock()?.frontier.len() as u64)
    }

    async fn complete(
        &self,
        fingerprint: &Fingerprint,
        outcome: ProcessingOutcome,
    ) -> StoreResult<()> {
        let mut inner = self.lock()?;
        inner.processing.remove(fingerprint);
        match outcome {
            ProcessingOutcome::Visited => inner.visited.insert(fingerprint.clone()),
            ProcessingOutcome::Failed => inner.failed.insert(fingerprint.clone()),
        };
        inner.processed.insert(fingerprint.clone());
        Ok(())
    }

    async fn reclaim_stale(&self, older_than: Duration) -> StoreResult<usize> {
        let mut inner = self.lock()?;
        let stale: Vec<Fingerprint> = inner
            .processing
            .iter()
            .filter(|(_, (_, checked_out))| checked_out.elapsed() >= older_than)
            .map(|(fp, _)| fp.clone())
            .collect();

        let moved = stale.len();
        for fp in stale {
            if let Some((entry, _)) = inner.processing.remove(&fp) {
                inner.frontier.insert(fp, entry);
            }
        }
        Ok(moved)
    }

    async fn add_artifacts(
        &self,
        source_domain: Option<&str>,
        values: &[String],
    ) -> StoreResult<u64> {
        let mut inner = self.lock()?;
        let mut added = 0;
        for value in values {
            if inner.artifacts.insert(value.clone()) {
                added += 1;
            }
        }
        if let Some(domain) = source_domain {
            let set = inner
                .artifacts_by_domain
                .entry(domain.to_string())
                .or_default();
            set.extend(values.iter().cloned());
        }
        Ok(added)
    }

    async fn artifact_backlog(&self) -> StoreResult<Vec<String>> {
        let inner = self.lock()?;
        Ok(inner
            .artifacts
            .difference(&inner.handled_artifacts)
            .cloned()
            .collect())
    }

    async fn register_worker(&self, worker_id: &str, state: WorkerState) -> StoreResult<()> {
        self.lock()?.registry.insert(worker_id.to_string(), state);
        Ok(())
    }

    async fn request_shutdown(&self, worker_id: Option<&str>) -> StoreResult<()> {
        let mut inner = self.lock()?;
        match worker_id {
            None => inner.global_shutdown = true,
            Some(id) => {
                inner.registry.insert(id.to_string(), WorkerState::Shutdown);
            }
        }
        Ok(())
    }

    async fn shutdown_requested(&self, worker_id: &str) -> StoreResult<bool> {
        let inner = self.lock()?;
        Ok(inner.global_shutdown
            || inner.registry.get(worker_id) == Some(&WorkerState::Shutdown))
    }

    async fn counts(&self) -> StoreResult<StoreCounts> {
        let inner = self.lock()?;
        Ok(StoreCounts {
            frontier: inner.frontier.len() as u64,
            processing: inner.processing.len() as u64,
            visited: inner.visited.len() as u64,
            failed: inner.failed.len() as u64,
            processed: inner.processed.len() as u64,
            domains: inner.domain_counts.len() as u64,
            artifacts: inner.artifacts.len() as u64,
        })
    }
}
