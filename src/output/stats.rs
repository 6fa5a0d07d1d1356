//! Statistics generation from the shared store
//!
//! This module provides functionality for extracting and displaying
//! crawl progress counters for operators.

use crate::store::{FrontierStore, StoreCounts};

/// Crawl statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// Raw store counters
    pub counts: StoreCounts,

    /// Fingerprints with a terminal outcome
    pub completed: u64,

    /// Share of completed fingerprints that were visited successfully
    pub success_rate: f64,
}

/// Loads statistics from the store
pub async fn load_statistics(store: &dyn FrontierStore) -> crate::Result<CrawlStatistics> {
    let counts = store.counts().await?;

    let completed = counts.visited + counts.failed;
    let success_rate = if completed > 0 {
        (counts.visited as f64 / completed as f64) * 100.0
    } else {
        0.0
    };

    Ok(CrawlStatistics {
        counts,
        completed,
        success_rate,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Frontier:");
    println!("  Queued: {}", stats.counts.frontier);
    println!("  In flight: {}", stats.counts.processing);
    println!();

    println!("Completed:");
    println!("  Visited: {}", stats.counts.visited);
    println!("  Failed: {}", stats.counts.failed);
    println!("  Audited total: {}", stats.counts.processed);
    println!();

    println!("Discovery:");
    println!("  Domains seen: {}", stats.counts.domains);
    println!("  Artifacts collected: {}", stats.counts.artifacts);
    println!();

    println!(
        "Success Rate: {:.1}% ({} / {} completed fetches)",
        stats.success_rate, stats.counts.visited, stats.completed
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, ProcessingOutcome};
    use crate::url::Fingerprint;

    #[tokio::test]
    async fn test_success_rate() {
        let store = MemoryStore::new();
        for (url, outcome) in [
            ("https://a.example/1", ProcessingOutcome::Visited),
            ("https://a.example/2", ProcessingOutcome::Visited),
            ("https://a.example/3", ProcessingOutcome::Failed),
        ] {
            store
                .complete(&Fingerprint::of(url), outcome)
                .await
                .unwrap();
        }

        let stats = load_statistics(&store).await.unwrap();
        assert_eq!(stats.completed, 3);
        assert!((stats.success_rate - 66.6).abs() < 1.0);
    }

    #[tokio::test]
    async fn test_empty_store_has_zero_rate() {
        let store = MemoryStore::new();
        let stats = load_statistics(&store).await.unwrap();
        assert_eq!(stats.completed, 0);
        assert_eq!(stats.success_rate, 0.0);
    }
}
