//! Citation graph over the selected publications
//!
//! Holds annotated copies of the selected records keyed by DOI. Caller-owned
//! records are never mutated; repairs and counts are applied to the copies.

use readforge_common::models::{Doi, PublicationRecord};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Which edge list a repair patched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchedList {
    /// `cited.cites_in` gained `citing`
    CitesIn,
    /// `citing.cites_out` gained `cited`
    CitesOut,
}

/// A citation edge that was only recorded on one side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRepair {
    pub citing: Doi,
    pub cited: Doi,
    pub patched: PatchedList,
}

/// Selected publications indexed by DOI
#[derive(Debug, Clone, Default)]
pub struct SelectedGraph {
    nodes: BTreeMap<Doi, PublicationRecord>,
}

impl SelectedGraph {
    /// Copy the selected publications into a graph
    ///
    /// A DOI listed twice keeps its first record.
    pub fn from_records(records: &[PublicationRecord]) -> Self {
        let mut nodes = BTreeMap::new();
        for record in records {
            nodes
                .entry(record.doi.clone())
                .or_insert_with(|| record.clone());
        }
        Self { nodes }
    }

    pub fn get(&self, doi: &str) -> Option<&PublicationRecord> {
        self.nodes.get(doi)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Records in DOI order
    pub fn into_records(self) -> Vec<PublicationRecord> {
        self.nodes.into_values().collect()
    }

    /// Add the missing half of every citation edge between selected publications
    ///
    /// If A lists B in `cites_out`, B gets A in `cites_in`, and the other way
    /// round. One pass reaches the fixed point, so calling this again
    /// returns no repairs.
    pub fn repair_citation_edges(&mut self) -> Vec<EdgeRepair> {
        let mut missing = Vec::new();

        for (doi, publication) in &self.nodes {
            for cited in &publication.cites_out {
                if cited == doi {
                    continue;
                }
                if let Some(target) = self.nodes.get(cited) {
                    if !target.cites_in.contains(doi) {
                        missing.push(EdgeRepair {
                            citing: doi.clone(),
                            cited: cited.clone(),
                            patched: PatchedList::CitesIn,
                        });
                    }
                }
            }

            for citing in &publication.cites_in {
                if citing == doi {
                    continue;
                }
                if let Some(source) = self.nodes.get(citing) {
                    if !source.cites_out.contains(doi) {
                        missing.push(EdgeRepair {
                            citing: citing.clone(),
                            cited: doi.clone(),
                            patched: PatchedList::CitesOut,
                        });
                    }
                }
            }
        }

        // Duplicate list entries produce the same repair twice; keep the first
        missing.retain(|repair| {
            let applied = match repair.patched {
                PatchedList::CitesIn => self
                    .nodes
                    .get_mut(&repair.cited)
                    .map(|p| p.add_citing(&repair.citing)),
                PatchedList::CitesOut => self
                    .nodes
                    .get_mut(&repair.citing)
                    .map(|p| p.add_cited(&repair.cited)),
            };
            let applied = applied.unwrap_or(false);
            if applied {
                debug!(
                    citing = %repair.citing,
                    cited = %repair.cited,
                    patched = ?repair.patched,
                    "Repaired asymmetric citation edge"
                );
            }
            applied
        });

        missing
    }

    /// Count citation links and collect candidates
    ///
    /// Resets `citation_count`/`reference_count` on every selected record,
    /// then walks each selected publication's edges:
    /// - an outgoing edge to a selected publication raises its `citation_count`,
    ///   to anything else creates a candidate cited by this publication
    /// - an incoming edge from a selected publication raises its
    ///   `reference_count`, from anything else creates a candidate citing it
    ///
    /// Excluded DOIs are skipped entirely. Each (publication, target) pair
    /// counts once and self-citations are ignored. Scores of selected records
    /// and candidates are set to their connection count.
    pub fn expand(&mut self, excluded: &HashSet<Doi>) -> BTreeMap<Doi, PublicationRecord> {
        for publication in self.nodes.values_mut() {
            publication.citation_count = 0;
            publication.reference_count = 0;
        }

        let edges: Vec<(Doi, Vec<Doi>, Vec<Doi>)> = self
            .nodes
            .values()
            .map(|p| (p.doi.clone(), unique(&p.cites_out), unique(&p.cites_in)))
            .collect();

        let mut candidates: BTreeMap<Doi, PublicationRecord> = BTreeMap::new();

        for (source, cites_out, cites_in) in edges {
            for cited in cites_out {
                if cited == source || excluded.contains(&cited) {
                    continue;
                }
                match self.nodes.get_mut(&cited) {
                    Some(target) => target.citation_count += 1,
                    None => {
                        let candidate = candidates
                            .entry(cited.clone())
                            .or_insert_with(|| PublicationRecord::new(cited));
                        candidate.add_citing(&source);
                        candidate.citation_count += 1;
                    }
                }
            }

            for citing in cites_in {
                if citing == source || excluded.contains(&citing) {
                    continue;
                }
                match self.nodes.get_mut(&citing) {
                    Some(target) => target.reference_count += 1,
                    None => {
                        let candidate = candidates
                            .entry(citing.clone())
                            .or_insert_with(|| PublicationRecord::new(citing));
                        candidate.add_cited(&source);
                        candidate.reference_count += 1;
                    }
                }
            }
        }

        for publication in self.nodes.values_mut() {
            publication.score = f64::from(publication.connection_count());
        }
        for candidate in candidates.values_mut() {
            candidate.score = f64::from(candidate.connection_count());
        }

        candidates
    }
}

fn unique(dois: &[Doi]) -> Vec<Doi> {
    let mut seen = HashSet::new();
    dois.iter()
        .filter(|doi| seen.insert(doi.as_str()))
        .cloned()
        .collect()
}
