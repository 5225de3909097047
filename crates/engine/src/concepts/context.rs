//! Binary publication × attribute context

use readforge_common::errors::{AppError, Result};
use readforge_common::keywords::KeywordMatcher;
use readforge_common::models::{Doi, PublicationRecord};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Hard ceiling on attributes, whatever the configured limit
///
/// Concept enumeration visits every attribute subset.
pub const MAX_ENUMERABLE_ATTRIBUTES: usize = 32;

/// Prefix of citation-link attribute labels
pub const CITATION_LINK_PREFIX: &str = "cites ";

/// Set of attribute indices
pub type AttributeSet = u64;

/// Context construction options
#[derive(Debug, Clone, Copy)]
pub struct ContextOptions {
    pub max_attributes: usize,
    pub include_citation_links: bool,
    pub min_link_support: usize,
}

/// Publications (objects) and the attributes each one has
///
/// Objects are in DOI order. Keyword groups come first among the
/// attributes, citation links after them.
#[derive(Debug, Clone, Default)]
pub struct FormalContext {
    objects: Vec<Doi>,
    attributes: Vec<String>,
    rows: Vec<AttributeSet>,
}

impl FormalContext {
    /// Build the context from titles and, optionally, shared citations
    ///
    /// Fails with `TooManyAttributes` when there are more keyword groups
    /// than the limit allows. Citation links are added by support (most
    /// citing publications first, then DOI) until the limit is reached.
    pub fn build<S: AsRef<str>>(
        publications: &[PublicationRecord],
        keyword_groups: &[S],
        options: ContextOptions,
    ) -> Result<Self> {
        let limit = options.max_attributes.min(MAX_ENUMERABLE_ATTRIBUTES);
        if keyword_groups.len() > limit {
            return Err(AppError::TooManyAttributes {
                count: keyword_groups.len(),
                limit,
            });
        }
        let matcher = KeywordMatcher::new(keyword_groups)?;

        let mut ordered: Vec<&PublicationRecord> = publications.iter().collect();
        ordered.sort_by(|a, b| a.doi.cmp(&b.doi));
        ordered.dedup_by(|a, b| a.doi == b.doi);

        let mut attributes: Vec<String> = matcher.labels().map(String::from).collect();
        let mut rows: Vec<AttributeSet> = ordered
            .iter()
            .map(|publication| {
                let title = publication.title.as_deref().unwrap_or_default();
                matcher
                    .matched_groups(title)
                    .into_iter()
                    .fold(0, |row, group| row | (1u64 << group))
            })
            .collect();

        if options.include_citation_links {
            let links = shared_citations(&ordered, options.min_link_support);
            let room = limit - attributes.len();
            if links.len() > room {
                debug!(links = links.len(), room, "Dropping weakest citation links");
            }

            for doi in links.into_iter().take(room) {
                let bit: AttributeSet = 1 << attributes.len();
                for (row, publication) in rows.iter_mut().zip(&ordered) {
                    if publication.cites_out.contains(&doi) {
                        *row |= bit;
                    }
                }
                attributes.push(format!("{}{}", CITATION_LINK_PREFIX, doi));
            }
        }

        Ok(Self {
            objects: ordered.into_iter().map(|p| p.doi.clone()).collect(),
            attributes,
            rows,
        })
    }

    pub fn objects(&self) -> &[Doi] {
        &self.objects
    }

    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    /// Whether object `object` has attribute `attribute`
    pub fn has(&self, object: usize, attribute: usize) -> bool {
        self.rows[object] & (1u64 << attribute) != 0
    }

    /// The set of every attribute
    pub fn all_attributes(&self) -> AttributeSet {
        if self.attributes.is_empty() {
            0
        } else {
            AttributeSet::MAX >> (64 - self.attributes.len())
        }
    }

    /// Objects having every attribute in `intent`, as indices
    pub fn extent(&self, intent: AttributeSet) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|&(_, &row)| row & intent == intent)
            .map(|(object, _)| object)
            .collect()
    }

    /// Attributes shared by every object in `extent`
    ///
    /// An empty extent shares every attribute.
    pub fn intent(&self, extent: &[usize]) -> AttributeSet {
        extent
            .iter()
            .fold(self.all_attributes(), |shared, &object| shared & self.rows[object])
    }

    pub fn object_dois(&self, extent: &[usize]) -> Vec<Doi> {
        extent.iter().map(|&object| self.objects[object].clone()).collect()
    }

    pub fn attribute_labels(&self, intent: AttributeSet) -> Vec<String> {
        (0..self.attributes.len())
            .filter(|&attribute| intent & (1u64 << attribute) != 0)
            .map(|attribute| self.attributes[attribute].clone())
            .collect()
    }
}

/// DOIs cited by at least `min_support` publications, strongest first
fn shared_citations(publications: &[&PublicationRecord], min_support: usize) -> Vec<Doi> {
    let selected: HashSet<&str> = publications.iter().map(|p| p.doi.as_str()).collect();
    let mut support: BTreeMap<&str, usize> = BTreeMap::new();

    for publication in publications {
        let unique: HashSet<&str> = publication.cites_out.iter().map(String::as_str).collect();
        for doi in unique {
            if doi != publication.doi && !selected.contains(doi) {
                *support.entry(doi).or_insert(0) += 1;
            }
        }
    }

    let mut links: Vec<(&str, usize)> = support
        .into_iter()
        .filter(|&(_, n)| n >= min_support.max(1))
        .collect();
    // BTreeMap order already sorts by DOI; the stable sort keeps it within a tie
    links.sort_by(|a, b| b.1.cmp(&a.1));
    links.into_iter().map(|(doi, _)| doi.to_string()).collect()
}
