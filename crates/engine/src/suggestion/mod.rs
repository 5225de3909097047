//! Citation-based suggestions
//!
//! Discovers publications linked to the selected set and ranks them by how
//! many selected publications they cite or are cited by:
//! 1. repair one-sided citation edges between selected publications
//! 2. count links and collect candidates
//! 3. rank with a seeded tie-break shuffle
//! 4. paginate into a visible page and a prefetch batch
//! 5. hydrate the visible page, prefetch the rest in the background

mod graph;
mod hydrate;
mod ranking;

pub use graph::{EdgeRepair, PatchedList, SelectedGraph};
pub use hydrate::{hydrate, spawn_prefetch, FetchFailure, Progress};
pub use ranking::{paginate, rank_candidates, Page};

use crate::fetch::MetadataFetcher;
use readforge_common::config::SuggestionSettings;
use readforge_common::metrics;
use readforge_common::models::{Doi, PublicationRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};

/// Suggestion engine configuration
#[derive(Debug, Clone)]
pub struct SuggestionConfig {
    /// Size of the visible page
    pub max_suggestions: usize,

    /// Size of the background prefetch batch
    pub load_more_increment: usize,

    /// Seed for the tie-break shuffle
    pub shuffle_seed: u64,

    /// Maximum concurrent fetches
    pub fetch_concurrency: usize,
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        SuggestionSettings::default().into()
    }
}

impl From<SuggestionSettings> for SuggestionConfig {
    fn from(settings: SuggestionSettings) -> Self {
        Self {
            max_suggestions: settings.max_suggestions,
            load_more_increment: settings.load_more_increment,
            shuffle_seed: settings.shuffle_seed,
            fetch_concurrency: settings.fetch_concurrency,
        }
    }
}

/// Input supplied by the reading-list owner
#[derive(Debug, Clone, Copy)]
pub struct SuggestionInput<'a> {
    pub selected: &'a [PublicationRecord],
    pub excluded: &'a HashSet<Doi>,
    pub read: &'a HashSet<Doi>,

    /// Overrides the configured page size
    pub max_suggestions: Option<usize>,
}

/// Ranked candidates before pagination
#[derive(Debug, Clone, Default)]
pub struct RankedGraph {
    /// Selected records with repaired edges and fresh counts, in DOI order
    pub selected: Vec<PublicationRecord>,

    /// All candidates, best first
    pub candidates: Vec<PublicationRecord>,

    pub repairs: Vec<EdgeRepair>,
}

/// Result of a suggestion run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionOutcome {
    /// Visible candidates, best first
    pub publications: Vec<PublicationRecord>,

    /// Number of candidates before pagination
    pub total_suggestions: usize,

    /// Selected records with repaired edges and fresh counts, in DOI order
    pub selected: Vec<PublicationRecord>,

    /// Citation edges that were only recorded on one side
    pub repairs: Vec<EdgeRepair>,

    /// DOIs handed to the background prefetch
    pub prefetch: Vec<Doi>,

    /// Visible candidates whose metadata fetch failed
    pub failures: Vec<FetchFailure>,
}

/// Suggestion engine
pub struct SuggestionEngine {
    config: SuggestionConfig,
    fetcher: Arc<dyn MetadataFetcher>,
}

impl SuggestionEngine {
    pub fn new(config: SuggestionConfig, fetcher: Arc<dyn MetadataFetcher>) -> Self {
        Self { config, fetcher }
    }

    pub fn config(&self) -> &SuggestionConfig {
        &self.config
    }

    /// Repair, expand and rank without fetching anything
    #[instrument(skip_all, fields(selected = input.selected.len()))]
    pub fn rank(&self, input: SuggestionInput<'_>) -> RankedGraph {
        let mut graph = SelectedGraph::from_records(input.selected);

        let repairs = graph.repair_citation_edges();
        if !repairs.is_empty() {
            info!(repaired = repairs.len(), "Repaired asymmetric citation edges");
        }
        metrics::record_edge_repairs(repairs.len());

        let candidates = graph.expand(input.excluded);
        let candidates = rank_candidates(candidates.into_values(), self.config.shuffle_seed);

        RankedGraph {
            selected: graph.into_records(),
            candidates,
            repairs,
        }
    }

    /// Compute the ranked, hydrated suggestion page
    ///
    /// `progress` receives one update per finished visible fetch. Fetch
    /// failures are collected in the outcome; they never abort the run.
    #[instrument(skip_all, fields(selected = input.selected.len()))]
    pub async fn compute_suggestions<F>(&self, input: SuggestionInput<'_>, progress: F) -> SuggestionOutcome
    where
        F: Fn(Progress) + Send + Sync,
    {
        let start = Instant::now();

        let ranked = self.rank(input);
        let max_suggestions = input.max_suggestions.unwrap_or(self.config.max_suggestions);
        let page = paginate(ranked.candidates, max_suggestions, self.config.load_more_increment);

        let (mut publications, failures) = hydrate(
            self.fetcher.as_ref(),
            page.visible,
            self.config.fetch_concurrency,
            progress,
        )
        .await;

        for publication in &mut publications {
            publication.is_read = input.read.contains(&publication.doi);
        }

        let prefetch: Vec<Doi> = page.prefetch.iter().map(|p| p.doi.clone()).collect();
        // Fire and forget
        let _ = spawn_prefetch(self.fetcher.clone(), page.prefetch, self.config.fetch_concurrency);

        info!(
            total = page.total,
            visible = publications.len(),
            prefetch = prefetch.len(),
            failed = failures.len(),
            "Suggestions computed"
        );
        metrics::record_suggestions(start.elapsed().as_secs_f64(), page.total, failures.len());

        SuggestionOutcome {
            publications,
            total_suggestions: page.total,
            selected: ranked.selected,
            repairs: ranked.repairs,
            prefetch,
            failures,
        }
    }
}
