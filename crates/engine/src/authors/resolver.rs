//! Author identity resolution
//!
//! Runs in two phases. Every author mention of every publication is first
//! turned into its own aggregate, in `(doi, position)` order. Mentions are
//! then grouped with a union-find: equal ORCIDs are joined first, equal
//! name ids second, and a name join is refused when it would put two
//! different ORCIDs in one class. Each class is folded into a single
//! aggregate, keyed by its earliest mention.

use super::aggregate::{author_key, AuthorAggregate};
use super::identity::parse_authors;
use readforge_common::config::AuthorSettings;
use readforge_common::metrics;
use readforge_common::models::PublicationRecord;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::time::Instant;
use tracing::{debug, instrument};

/// Author resolution flags and boosts
#[derive(Debug, Clone)]
pub struct AuthorConfig {
    /// Weight mentions by publication score; otherwise every mention counts 1
    pub score_enabled: bool,
    pub first_author_boost_enabled: bool,
    pub new_boost_enabled: bool,
    pub first_author_boost: f64,
    pub new_publication_boost: f64,
}

impl Default for AuthorConfig {
    fn default() -> Self {
        AuthorSettings::default().into()
    }
}

impl From<AuthorSettings> for AuthorConfig {
    fn from(settings: AuthorSettings) -> Self {
        Self {
            score_enabled: true,
            first_author_boost_enabled: true,
            new_boost_enabled: true,
            first_author_boost: settings.first_author_boost,
            new_publication_boost: settings.new_publication_boost,
        }
    }
}

/// Undirected co-author edge, `source < target`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoauthorEdge {
    pub source: String,
    pub target: String,
    pub weight: u32,
}

/// Result of an author resolution run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorResolution {
    /// Best first
    pub authors: Vec<AuthorAggregate>,
    pub coauthor_graph: Vec<CoauthorEdge>,
}

struct Mention {
    aggregate: AuthorAggregate,
    /// Indices of the other mentions on the same publication
    coauthors: Vec<usize>,
}

/// Union-find over mention indices; the smallest index is always the root
struct MentionClasses {
    parent: Vec<usize>,
    orcid: Vec<Option<String>>,
}

impl MentionClasses {
    fn new(mentions: &[Mention]) -> Self {
        Self {
            parent: (0..mentions.len()).collect(),
            orcid: mentions.iter().map(|m| m.aggregate.orcid.clone()).collect(),
        }
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    /// ORCID carried by the class rooted at `root`
    fn orcid(&self, root: usize) -> Option<&str> {
        self.orcid[root].as_deref()
    }

    /// Join two classes unless they carry different ORCIDs
    fn union(&mut self, a: usize, b: usize) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return true;
        }
        if let (Some(x), Some(y)) = (&self.orcid[ra], &self.orcid[rb]) {
            if x != y {
                return false;
            }
        }

        let (root, child) = if ra < rb { (ra, rb) } else { (rb, ra) };
        self.parent[child] = root;
        if self.orcid[root].is_none() {
            self.orcid[root] = self.orcid[child].take();
        }
        true
    }
}

/// Build one aggregate per author mention
///
/// Publications are visited in DOI order, a DOI listed twice keeps its
/// first record. An author named twice on one publication counts once.
fn collect_mentions(publications: &[PublicationRecord], config: &AuthorConfig) -> Vec<Mention> {
    let mut ordered: Vec<&PublicationRecord> = publications.iter().collect();
    ordered.sort_by(|a, b| a.doi.cmp(&b.doi));
    ordered.dedup_by(|a, b| a.doi == b.doi);

    let mut mentions = Vec::new();

    for publication in ordered {
        let mut names = parse_authors(publication.author.as_deref(), publication.author_orcid.as_deref());
        let mut listed = HashSet::new();
        names.retain(|name| listed.insert(name.id.clone()));
        let first = mentions.len();
        let indices: Vec<usize> = (first..first + names.len()).collect();

        let base = if config.score_enabled { publication.score } else { 1.0 };
        let new_boost = if publication.is_new && config.new_boost_enabled {
            config.new_publication_boost
        } else {
            1.0
        };

        for (position, author) in names.into_iter().enumerate() {
            let first_author_boost = if position == 0 && config.first_author_boost_enabled {
                config.first_author_boost
            } else {
                1.0
            };

            let aggregate = AuthorAggregate {
                id: author.id,
                alternative_names: BTreeSet::from([author.name.clone()]),
                name: author.name,
                orcid: author.orcid,
                score: base * first_author_boost * new_boost,
                count: 1,
                first_author_count: u32::from(position == 0),
                year_min: publication.year,
                year_max: publication.year,
                coauthors: BTreeMap::new(),
                keywords: publication.boost_keywords.iter().map(|k| (k.clone(), 1)).collect(),
                publication_dois: BTreeSet::from([publication.doi.clone()]),
                new_publication: publication.is_new,
            };

            mentions.push(Mention {
                aggregate,
                coauthors: indices.iter().copied().filter(|&i| i != first + position).collect(),
            });
        }
    }

    mentions
}

/// Group mentions into identity classes
fn group_mentions(mentions: &[Mention]) -> MentionClasses {
    let mut classes = MentionClasses::new(mentions);

    let mut by_orcid: HashMap<&str, usize> = HashMap::new();
    for (i, mention) in mentions.iter().enumerate() {
        if let Some(orcid) = mention.aggregate.orcid.as_deref() {
            let first = *by_orcid.entry(orcid).or_insert(i);
            classes.union(first, i);
        }
    }

    let mut by_name: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, mention) in mentions.iter().enumerate() {
        let seen = by_name.entry(mention.aggregate.id.as_str()).or_default();
        // Join the first earlier class that accepts this mention
        if !seen.is_empty() && !seen.iter().any(|&j| classes.union(j, i)) {
            debug!(id = %mention.aggregate.id, "Name match refused, ORCIDs differ");
        }
        seen.push(i);
    }

    classes
}

/// Resolve author mentions into ranked aggregates
///
/// The result depends only on the set of publications and the config, not
/// on their order. Missing or malformed author fields yield no mentions.
#[instrument(skip_all, fields(publications = publications.len()))]
pub fn resolve_authors(publications: &[PublicationRecord], config: &AuthorConfig) -> AuthorResolution {
    let start = Instant::now();

    let mut mentions = collect_mentions(publications, config);
    let mut classes = group_mentions(&mentions);
    let roots: Vec<usize> = (0..mentions.len()).map(|i| classes.find(i)).collect();
    let keys: Vec<String> = roots
        .iter()
        .map(|&root| author_key(&mentions[root].aggregate.id, classes.orcid(root)))
        .collect();

    for i in 0..mentions.len() {
        let mut coauthors: BTreeMap<String, u32> = BTreeMap::new();
        for &j in &mentions[i].coauthors {
            if roots[j] != roots[i] {
                coauthors.insert(keys[j].clone(), 1);
            }
        }
        mentions[i].aggregate.coauthors = coauthors;
    }

    let mut merged: BTreeMap<usize, AuthorAggregate> = BTreeMap::new();
    for (i, mention) in mentions.into_iter().enumerate() {
        match merged.get_mut(&roots[i]) {
            Some(aggregate) => aggregate.merge_with(mention.aggregate),
            None => {
                merged.insert(roots[i], mention.aggregate);
            }
        }
    }

    let mut authors: Vec<AuthorAggregate> = merged.into_values().collect();
    sort_authors(&mut authors);
    let coauthor_graph = coauthor_graph(&authors);

    debug!(
        mentions = roots.len(),
        authors = authors.len(),
        edges = coauthor_graph.len(),
        "Authors resolved"
    );
    metrics::record_author_resolution(start.elapsed().as_secs_f64(), authors.len());

    AuthorResolution {
        authors,
        coauthor_graph,
    }
}

/// Sort by composite key, descending, then by id
///
/// Authors sharing an id (name twins kept apart by ORCID) fall back to the
/// ORCID so the order is total.
pub fn sort_authors(authors: &mut [AuthorAggregate]) {
    authors.sort_by(|a, b| {
        b.sort_key()
            .total_cmp(&a.sort_key())
            .then_with(|| a.id.cmp(&b.id))
            .then_with(|| a.orcid.cmp(&b.orcid))
    });
}

/// Undirected weighted co-author edges between author keys
///
/// Each pair appears once with `source < target`.
pub fn coauthor_graph(authors: &[AuthorAggregate]) -> Vec<CoauthorEdge> {
    let mut edges: BTreeMap<(String, String), u32> = BTreeMap::new();
    for author in authors {
        let key = author.key();
        for (coauthor, &weight) in &author.coauthors {
            if key < *coauthor {
                let edge = edges.entry((key.clone(), coauthor.clone())).or_insert(0);
                *edge = (*edge).max(weight);
            }
        }
    }

    edges
        .into_iter()
        .map(|((source, target), weight)| CoauthorEdge {
            source,
            target,
            weight,
        })
        .collect()
}
