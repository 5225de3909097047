//! Candidate ranking and pagination

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use readforge_common::models::PublicationRecord;

/// One page of ranked candidates
#[derive(Debug, Clone, Default)]
pub struct Page {
    /// Candidates shown to the user
    pub visible: Vec<PublicationRecord>,

    /// Next batch, fetched in the background
    pub prefetch: Vec<PublicationRecord>,

    /// Number of ranked candidates before pagination
    pub total: usize,
}

/// Rank candidates by connection count
///
/// Titles are not loaded yet, so ties are broken by a seeded shuffle.
/// Candidates are put in DOI order first, so the permutation depends only on
/// the candidate set and the seed, never on discovery order. The following
/// sort is stable and keeps the shuffled order within a tie.
pub fn rank_candidates<I>(candidates: I, seed: u64) -> Vec<PublicationRecord>
where
    I: IntoIterator<Item = PublicationRecord>,
{
    let mut ranked: Vec<PublicationRecord> = candidates.into_iter().collect();
    ranked.sort_by(|a, b| a.doi.cmp(&b.doi));

    let mut rng = StdRng::seed_from_u64(seed);
    ranked.shuffle(&mut rng);

    ranked.sort_by(|a, b| b.connection_count().cmp(&a.connection_count()));
    ranked
}

/// Split ranked candidates into the visible page and the prefetch batch
pub fn paginate(mut ranked: Vec<PublicationRecord>, max_suggestions: usize, load_more_increment: usize) -> Page {
    let total = ranked.len();

    let rest = ranked.split_off(max_suggestions.min(total));
    let prefetch = rest.into_iter().take(load_more_increment).collect();

    Page {
        visible: ranked,
        prefetch,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(doi: &str, citations: u32, references: u32) -> PublicationRecord {
        PublicationRecord {
            doi: doi.to_string(),
            citation_count: citations,
            reference_count: references,
            ..Default::default()
        }
    }

    fn dois(records: &[PublicationRecord]) -> Vec<String> {
        records.iter().map(|r| r.doi.clone()).collect()
    }

    #[test]
    fn test_sorted_by_connection_count() {
        let ranked = rank_candidates(
            vec![candidate("a", 1, 0), candidate("b", 2, 2), candidate("c", 0, 3)],
            7,
        );
        assert_eq!(dois(&ranked), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_ties_are_deterministic_and_order_independent() {
        let forward: Vec<_> = (0..30).map(|i| candidate(&format!("10.1/{:02}", i), 1, 0)).collect();
        let mut backward = forward.clone();
        backward.reverse();

        let first = dois(&rank_candidates(forward.clone(), 42));
        for _ in 0..20 {
            assert_eq!(dois(&rank_candidates(forward.clone(), 42)), first);
        }
        assert_eq!(dois(&rank_candidates(backward, 42)), first);
    }

    #[test]
    fn test_ties_are_shuffled() {
        let tied: Vec<_> = (0..30).map(|i| candidate(&format!("10.1/{:02}", i), 1, 0)).collect();
        let mut sorted = dois(&tied);
        sorted.sort();

        // 30 tied items staying in DOI order after a shuffle is vanishingly unlikely
        assert_ne!(dois(&rank_candidates(tied, 42)), sorted);
    }

    #[test]
    fn test_paginate() {
        let ranked: Vec<_> = (0..7).map(|i| candidate(&i.to_string(), 0, 0)).collect();

        let page = paginate(ranked.clone(), 3, 2);
        assert_eq!(dois(&page.visible), vec!["0", "1", "2"]);
        assert_eq!(dois(&page.prefetch), vec!["3", "4"]);
        assert_eq!(page.total, 7);

        let short = paginate(ranked, 10, 5);
        assert_eq!(short.visible.len(), 7);
        assert!(short.prefetch.is_empty());
    }

    #[test]
    fn test_empty() {
        let page = paginate(rank_candidates(Vec::new(), 1), 50, 50);
        assert!(page.visible.is_empty());
        assert_eq!(page.total, 0);
    }
}
