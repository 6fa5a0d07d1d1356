//! Store trait and error types
//!
//! This module defines the trait interface all store backends implement
//! and the associated error types.

use crate::store::{FrontierEntry, ProcessingOutcome, StoreCounts, WorkerState};
use crate::url::Fingerprint;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during store operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store cannot be reached; fatal for the calling process
    #[error("Shared store unavailable: {0}")]
    Unavailable(String),

    /// A command was rejected or failed mid-flight
    #[error("Store command failed: {0}")]
    Command(String),

    /// An entry read back from the store could not be decoded
    #[error("Corrupt store entry: {0}")]
    Corrupt(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Atomic operations over the shared crawl state
///
/// Every operation is safe to call concurrently from any number of workers
/// in any number of processes; the backend is the single synchronization
/// point. Implementations must uphold:
///
/// - **At-most-once delivery**: no frontier entry is returned by two
///   [`pop_batch`](Self::pop_batch) calls.
/// - **No silent loss**: a popped entry is parked in the in-flight record
///   until [`complete`](Self::complete) releases it or
///   [`reclaim_stale`](Self::reclaim_stale) returns it to the frontier.
/// - **Dedup**: [`insert_if_absent`](Self::insert_if_absent) drops entries
///   already queued, in flight, visited, or failed.
#[async_trait]
pub trait FrontierStore: Send + Sync {
    // ===== Dedup index =====

    /// Returns true if the fingerprint has been successfully processed
    async fn is_visited(&self, fingerprint: &Fingerprint) -> StoreResult<bool>;

    /// Batched membership test; one round trip regardless of input size
    ///
    /// The result has the same length and order as the input.
    async fn any_visited(&self, fingerprints: &[Fingerprint]) -> StoreResult<Vec<bool>>;

    /// Records a fingerprint as visited; marking twice is a no-op
    async fn mark_visited(&self, fingerprint: &Fingerprint) -> StoreResult<()>;

    // ===== Domain counters =====

    /// Atomically increments and returns the domain's discovery counter
    ///
    /// No two callers ever observe the same post-increment value for the
    /// same domain.
    async fn next_domain_count(&self, domain: &str) -> StoreResult<u64>;

    // ===== Frontier queue =====

    /// Batched test for fingerprints already queued or in flight
    ///
    /// One round trip; the result has the same length and order as the
    /// input. Seed ingestion uses this to keep domain-counter accounting
    /// idempotent across repeated runs of the same seed list.
    async fn any_queued(&self, fingerprints: &[Fingerprint]) -> StoreResult<Vec<bool>>;

    /// Inserts entries whose fingerprint is not already queued, in flight,
    /// visited, or failed; returns how many were actually inserted
    async fn insert_if_absent(&self, entries: &[FrontierEntry]) -> StoreResult<usize>;

    /// Atomically removes and returns up to `max` lowest-score entries,
    /// parking each in the in-flight record
    ///
    /// Returns an empty vector immediately when the frontier is empty;
    /// callers implement their own backoff.
    async fn pop_batch(&self, max: usize) -> StoreResult<Vec<FrontierEntry>>;

    /// Number of entries currently queued
    async fn frontier_len(&self) -> StoreResult<u64>;

    // ===== In-flight bookkeeping =====

    /// Releases a checked-out entry into its terminal set
    async fn complete(
        &self,
        fingerprint: &Fingerprint,
        outcome: ProcessingOutcome,
    ) -> StoreResult<()>;

    /// Returns in-flight entries older than `older_than` to the frontier,
    /// preserving their scores; returns how many were reclaimed
    ///
    /// This is the crash-recovery sweep: entries checked out by a worker
    /// that died mid-batch become poppable again instead of being stuck.
    async fn reclaim_stale(&self, older_than: Duration) -> StoreResult<usize>;

    // ===== Artifacts =====

    /// Adds extracted artifacts to the deduplicated artifact set
    ///
    /// When `source_domain` is given the values are additionally recorded
    /// in a per-domain set. Returns how many values were new.
    async fn add_artifacts(
        &self,
        source_domain: Option<&str>,
        values: &[String],
    ) -> StoreResult<u64>;

    /// Artifacts not yet claimed by the downstream consumer
    /// (set difference against the externally maintained handled sets)
    async fn artifact_backlog(&self) -> StoreResult<Vec<String>>;

    // ===== Worker registry & shutdown =====

    /// Records the worker's lifecycle state in the shared registry
    async fn register_worker(&self, worker_id: &str, state: WorkerState) -> StoreResult<()>;

    /// Signals shutdown: globally when `worker_id` is None, otherwise for
    /// one worker identity only
    async fn request_shutdown(&self, worker_id: Option<&str>) -> StoreResult<()>;

    /// Returns true if the global flag or this worker's registry entry
    /// requests shutdown
    async fn shutdown_requested(&self, worker_id: &str) -> StoreResult<bool>;

    // ===== Statistics =====

    /// Aggregate counters for operator-facing output
    async fn counts(&self) -> StoreResult<StoreCounts>;
}
