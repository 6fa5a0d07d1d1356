//! Seed ingestion
//!
//! One-shot loader turning external seed lists into initial frontier
//! entries. Two input formats are accepted: a JSON array of
//! `{name, links}` objects, or a plain-text file with one URL per line.
//! Ingestion is idempotent: re-running the same seed list neither
//! duplicates frontier entries nor inflates domain counters beyond each
//! distinct URL's one contribution.

use crate::crawler::{priority_score, SEED_PARENT_SCORE};
use crate::store::{FrontierEntry, FrontierStore, UrlRecord};
use crate::url::{parse_candidate, Fingerprint};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Seed ingestion errors
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse seed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid seed URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Seed input contained no valid URLs")]
    Empty,
}

/// One named entry in a JSON seed file
#[derive(Debug, Clone, Deserialize)]
pub struct SeedEntry {
    pub name: String,
    pub links: Vec<String>,
}

/// What one ingestion run accomplished
#[derive(Debug, Default, Clone, Copy)]
pub struct SeedReport {
    /// Distinct, syntactically valid URLs in the input
    pub candidates: usize,

    /// Input URLs rejected for missing scheme or host
    pub invalid: usize,

    /// Entries actually added to the frontier
    pub inserted: usize,

    /// Candidates skipped because they were already visited, queued,
    /// or in flight
    pub skipped: usize,
}

/// Reads raw seed URLs from a file
///
/// Files ending in `.json` are parsed as an array of `{name, links}`
/// objects; anything else is treated as one URL per line, with blank
/// lines and `#` comments skipped.
pub fn read_seed_file(path: &Path) -> Result<Vec<String>, SeedError> {
    let content = std::fs::read_to_string(path)?;

    if path.extension().is_some_and(|ext| ext == "json") {
        let entries: Vec<SeedEntry> = serde_json::from_str(&content)?;
        Ok(entries
            .into_iter()
            .flat_map(|entry| {
                tracing::debug!(name = %entry.name, links = entry.links.len(), "Seed entry");
                entry.links
            })
            .collect())
    } else {
        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect())
    }
}

/// Ingests seed URLs into the frontier
///
/// Invalid URLs are logged and counted, not fatal; callers that require
/// every seed to be valid (e.g. a single `--url` argument) check the
/// report. Domain counters are only bumped for candidates that are not
/// already known to the store, so repeated runs of the same list are
/// idempotent.
pub async fn ingest(
    store: &dyn FrontierStore,
    raw_urls: &[String],
) -> crate::Result<SeedReport> {
    let mut report = SeedReport::default();

    let mut seen: HashSet<Fingerprint> = HashSet::new();
    let mut candidates: Vec<UrlRecord> = Vec::new();
    for raw in raw_urls {
        let url = match parse_candidate(raw) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(url = %raw, error = %e, "Rejecting invalid seed URL");
                report.invalid += 1;
                continue;
            }
        };
        let Ok(record) = UrlRecord::new(url, 0) else {
            report.invalid += 1;
            continue;
        };
        if seen.insert(record.fingerprint()) {
            candidates.push(record);
        }
    }
    report.candidates = candidates.len();

    if candidates.is_empty() {
        return Ok(report);
    }

    let fingerprints: Vec<Fingerprint> = candidates
        .iter()
        .map(|record| record.fingerprint())
        .collect();
    let visited = store.any_visited(&fingerprints).await?;
    let queued = store.any_queued(&fingerprints).await?;

    let mut entries = Vec::new();
    for ((record, is_visited), is_queued) in candidates.into_iter().zip(visited).zip(queued) {
        if is_visited || is_queued {
            report.skipped += 1;
            continue;
        }
        let domain_count = store.next_domain_count(&record.domain).await?;
        entries.push(FrontierEntry {
            score: priority_score(domain_count, SEED_PARENT_SCORE),
            record,
        });
    }

    report.inserted = store.insert_if_absent(&entries).await?;
    report.skipped += entries.len() - report.inserted;

    tracing::info!(
        candidates = report.candidates,
        inserted = report.inserted,
        skipped = report.skipped,
        invalid = report.invalid,
        "Seed ingestion finished"
    );

    Ok(report)
}

/// Convenience wrapper: reads a seed file and ingests its URLs
pub async fn ingest_file(store: &dyn FrontierStore, path: &Path) -> crate::Result<SeedReport> {
    let raw_urls = read_seed_file(path)?;
    if raw_urls.is_empty() {
        return Err(SeedError::Empty.into());
    }
    ingest(store, &raw_urls).await
}
