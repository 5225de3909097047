//! Candidate metadata hydration
//!
//! Visible candidates are fetched concurrently and awaited; one failed fetch
//! never cancels the others. The prefetch batch runs detached on the tokio
//! runtime and only logs its failures.

use crate::fetch::MetadataFetcher;
use futures::stream::{self, StreamExt};
use readforge_common::metrics;
use readforge_common::models::{Doi, PublicationRecord};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Hydration progress, reported once per finished fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.completed, self.total)
    }
}

/// A visible candidate whose metadata could not be fetched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchFailure {
    pub doi: Doi,
    pub message: String,
}

/// Fetch metadata for every candidate
///
/// Up to `concurrency` fetches run at once. `progress` is called in
/// completion order. The returned candidates keep their input order; a
/// candidate whose fetch failed is returned unhydrated and listed in the
/// failures.
pub async fn hydrate<F>(
    fetcher: &dyn MetadataFetcher,
    candidates: Vec<PublicationRecord>,
    concurrency: usize,
    progress: F,
) -> (Vec<PublicationRecord>, Vec<FetchFailure>)
where
    F: Fn(Progress) + Send + Sync,
{
    let total = candidates.len();
    let mut slots: Vec<Option<PublicationRecord>> = vec![None; total];
    let mut failures = Vec::new();
    let mut completed = 0;

    let mut fetches = stream::iter(candidates.into_iter().enumerate())
        .map(|(index, candidate)| async move {
            let result = fetcher.fetch(&candidate).await;
            (index, candidate, result)
        })
        .buffer_unordered(concurrency.max(1));

    while let Some((index, mut candidate, result)) = fetches.next().await {
        match result {
            Ok(metadata) => {
                candidate.apply_metadata(metadata);
                metrics::record_fetch(true, false);
            }
            Err(e) => {
                warn!(doi = %candidate.doi, error = %e, "Metadata fetch failed");
                metrics::record_fetch(false, false);
                failures.push(FetchFailure {
                    doi: candidate.doi.clone(),
                    message: e.to_string(),
                });
            }
        }

        completed += 1;
        progress(Progress { completed, total });
        slots[index] = Some(candidate);
    }

    // Failures are listed in completion order; sort for stable output
    failures.sort_by(|a, b| a.doi.cmp(&b.doi));

    (slots.into_iter().flatten().collect(), failures)
}

/// Start fetching the prefetch batch without waiting for it
///
/// Returns `None` when called outside a tokio runtime or with nothing to
/// fetch. Dropping the handle does not stop the fetches.
pub fn spawn_prefetch(
    fetcher: Arc<dyn MetadataFetcher>,
    batch: Vec<PublicationRecord>,
    concurrency: usize,
) -> Option<JoinHandle<()>> {
    if batch.is_empty() {
        return None;
    }

    let runtime = match tokio::runtime::Handle::try_current() {
        Ok(runtime) => runtime,
        Err(_) => {
            warn!(count = batch.len(), "No async runtime, skipping background prefetch");
            return None;
        }
    };

    Some(runtime.spawn(async move {
        let count = batch.len();
        stream::iter(batch)
            .for_each_concurrent(concurrency.max(1), |candidate| {
                let fetcher = fetcher.clone();
                async move {
                    match fetcher.fetch(&candidate).await {
                        Ok(_) => metrics::record_fetch(true, true),
                        Err(e) => {
                            debug!(doi = %candidate.doi, error = %e, "Background prefetch failed");
                            metrics::record_fetch(false, true);
                        }
                    }
                }
            })
            .await;
        debug!(count, "Background prefetch finished");
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::CatalogFetcher;
    use async_trait::async_trait;
    use readforge_common::errors::{AppError, Result};
    use readforge_common::models::PublicationMetadata;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Delays each fetch by an amount encoded in the DOI suffix
    struct SlowFetcher;

    #[async_trait]
    impl MetadataFetcher for SlowFetcher {
        async fn fetch(&self, publication: &PublicationRecord) -> Result<PublicationMetadata> {
            let delay: u64 = publication.doi.rsplit('/').next().unwrap().parse().unwrap();
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(PublicationMetadata {
                title: Some(format!("Title {}", publication.doi)),
                ..Default::default()
            })
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    struct CountingFetcher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MetadataFetcher for CountingFetcher {
        async fn fetch(&self, publication: &PublicationRecord) -> Result<PublicationMetadata> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(AppError::MetadataFetch {
                doi: publication.doi.clone(),
                message: "offline".to_string(),
            })
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    fn candidates(dois: &[&str]) -> Vec<PublicationRecord> {
        dois.iter().map(|d| PublicationRecord::new(*d)).collect()
    }

    #[tokio::test]
    async fn test_progress_follows_completion_and_order_is_kept() {
        let seen = Mutex::new(Vec::new());
        let (hydrated, failures) = hydrate(
            &SlowFetcher,
            candidates(&["10.1/60", "10.1/1", "10.1/30"]),
            3,
            |p| seen.lock().unwrap().push(p.to_string()),
        )
        .await;

        assert!(failures.is_empty());
        let order: Vec<_> = hydrated.iter().map(|c| c.doi.as_str()).collect();
        assert_eq!(order, vec!["10.1/60", "10.1/1", "10.1/30"]);
        assert!(hydrated.iter().all(|c| c.hydrated && c.title.is_some()));
        assert_eq!(*seen.lock().unwrap(), vec!["1/3", "2/3", "3/3"]);
    }

    #[tokio::test]
    async fn test_failure_does_not_abort_siblings() {
        let mut entries = HashMap::new();
        entries.insert(
            "10.1/a".to_string(),
            PublicationMetadata {
                title: Some("Found".into()),
                ..Default::default()
            },
        );
        let fetcher = CatalogFetcher::new(entries);

        let (hydrated, failures) =
            hydrate(&fetcher, candidates(&["10.1/missing", "10.1/a"]), 2, |_| {}).await;

        assert_eq!(hydrated.len(), 2);
        assert!(!hydrated[0].hydrated);
        assert!(hydrated[1].hydrated);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].doi, "10.1/missing");
    }

    #[tokio::test]
    async fn test_prefetch_runs_detached_and_swallows_errors() {
        let fetcher = Arc::new(CountingFetcher {
            calls: AtomicUsize::new(0),
        });

        let handle = spawn_prefetch(fetcher.clone(), candidates(&["x", "y", "z"]), 2)
            .expect("runtime available");
        handle.await.unwrap();

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_prefetch_without_runtime_is_skipped() {
        let fetcher = Arc::new(CatalogFetcher::default());
        assert!(spawn_prefetch(fetcher, candidates(&["x"]), 1).is_none());
    }

    #[test]
    fn test_progress_display() {
        assert_eq!(Progress { completed: 2, total: 5 }.to_string(), "2/5");
    }
}
