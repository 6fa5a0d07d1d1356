//! Artifact backlog retrieval
//!
//! The artifact set is consumed downstream by a notification step that
//! tracks its own handled/failed sets; the backlog exposed here is the
//! set difference, i.e. artifacts nobody has acted on yet.

use crate::store::FrontierStore;

/// Loads the unhandled artifact backlog, sorted for stable output
pub async fn load_artifact_backlog(store: &dyn FrontierStore) -> crate::Result<Vec<String>> {
    let mut backlog = store.artifact_backlog().await?;
    backlog.sort();
    Ok(backlog)
}

/// Prints the backlog one artifact per line
pub fn print_artifacts(backlog: &[String]) {
    if backlog.is_empty() {
        println!("No unhandled artifacts.");
        return;
    }

    for artifact in backlog {
        println!("{}", artifact);
    }
    eprintln!("{} unhandled artifact(s)", backlog.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_backlog_sorted_and_filtered() {
        let store = MemoryStore::new();
        store
            .add_artifacts(
                None,
                &[
                    "zeta@a.example".to_string(),
                    "alpha@a.example".to_string(),
                    "mid@a.example".to_string(),
                ],
            )
            .await
            .unwrap();
        store.mark_artifacts_handled(&["mid@a.example".to_string()]);

        let backlog = load_artifact_backlog(&store).await.unwrap();
        assert_eq!(
            backlog,
            vec!["alpha@a.example".to_string(), "zeta@a.example".to_string()]
        );
    }
}
