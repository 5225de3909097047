//! Formal concept analysis over the selected publications
//!
//! A formal concept pairs a set of publications (extent) with the set of
//! attributes they all share (intent), such that each determines the other.
//! Attributes are keyword groups matched in titles and, optionally,
//! citations shared by several publications.
//!
//! Concepts are found by testing every attribute subset for closure, so the
//! cost is exponential in the attribute count. The count is capped by
//! `max_attributes` and never exceeds [`MAX_ENUMERABLE_ATTRIBUTES`].

mod context;

pub use context::{AttributeSet, ContextOptions, FormalContext, CITATION_LINK_PREFIX, MAX_ENUMERABLE_ATTRIBUTES};

use readforge_common::config::ConceptSettings;
use readforge_common::errors::Result;
use readforge_common::metrics;
use readforge_common::models::{Doi, PublicationRecord};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::time::Instant;
use tracing::{info, instrument};

/// Concept engine configuration
#[derive(Debug, Clone)]
pub struct ConceptConfig {
    pub max_attributes: usize,
    pub include_citation_links: bool,

    /// Citing publications needed for a citation link attribute
    pub min_link_support: usize,
}

impl Default for ConceptConfig {
    fn default() -> Self {
        ConceptSettings::default().into()
    }
}

impl From<ConceptSettings> for ConceptConfig {
    fn from(settings: ConceptSettings) -> Self {
        Self {
            max_attributes: settings.max_attributes,
            include_citation_links: settings.include_citation_links,
            min_link_support: settings.min_link_support,
        }
    }
}

impl From<&ConceptConfig> for ContextOptions {
    fn from(config: &ConceptConfig) -> Self {
        Self {
            max_attributes: config.max_attributes,
            include_citation_links: config.include_citation_links,
            min_link_support: config.min_link_support,
        }
    }
}

/// A closed (extent, intent) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormalConcept {
    /// Hex SHA-256 of the canonical (extent, intent) serialization
    pub id: String,

    /// Publication DOIs, sorted
    pub extent: Vec<Doi>,

    /// Attribute labels, sorted
    pub intent: Vec<String>,
}

impl FormalConcept {
    pub fn new(mut extent: Vec<Doi>, mut intent: Vec<String>) -> Self {
        extent.sort();
        intent.sort();
        let id = concept_id(&extent, &intent);
        Self { id, extent, intent }
    }

    /// |extent| × |intent|
    pub fn importance(&self) -> usize {
        self.extent.len() * self.intent.len()
    }
}

fn canonical_form(extent: &[Doi], intent: &[String]) -> String {
    serde_json::json!([extent, intent]).to_string()
}

fn concept_id(extent: &[Doi], intent: &[String]) -> String {
    hex::encode(Sha256::digest(canonical_form(extent, intent).as_bytes()))
}

/// Enumerate the formal concepts of the context
///
/// Every attribute subset is closed against the context and kept when it
/// is its own closure. Concepts are returned by importance (descending),
/// then by canonical form.
pub fn enumerate_concepts(context: &FormalContext) -> Vec<FormalConcept> {
    let width = context.attributes().len();
    if context.objects().is_empty() || width == 0 {
        return Vec::new();
    }

    let mut seen = BTreeSet::new();
    let mut concepts = Vec::new();

    for subset in 0..(1u64 << width) {
        let extent = context.extent(subset);
        if context.intent(&extent) != subset {
            continue;
        }

        let concept = FormalConcept::new(context.object_dois(&extent), context.attribute_labels(subset));
        if seen.insert(canonical_form(&concept.extent, &concept.intent)) {
            concepts.push(concept);
        }
    }

    concepts.sort_by(|a, b| {
        b.importance()
            .cmp(&a.importance())
            .then_with(|| a.extent.cmp(&b.extent))
            .then_with(|| a.intent.cmp(&b.intent))
    });
    concepts
}

/// Compute the concepts of the selected publications
///
/// Returns an empty list when there are no publications or no attributes.
/// Fails when there are more keyword groups than `max_attributes`.
#[instrument(skip_all, fields(publications = publications.len(), groups = keyword_groups.len()))]
pub fn compute_concepts<S: AsRef<str>>(
    publications: &[PublicationRecord],
    keyword_groups: &[S],
    config: &ConceptConfig,
) -> Result<Vec<FormalConcept>> {
    let start = Instant::now();

    let context = FormalContext::build(publications, keyword_groups, config.into())?;
    let concepts = enumerate_concepts(&context);

    info!(
        attributes = context.attributes().len(),
        concepts = concepts.len(),
        "Concepts computed"
    );
    metrics::record_concepts(start.elapsed().as_secs_f64(), concepts.len());

    Ok(concepts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use readforge_common::errors::AppError;

    fn titled(doi: &str, title: &str) -> PublicationRecord {
        PublicationRecord {
            doi: doi.to_string(),
            title: Some(title.to_string()),
            ..Default::default()
        }
    }

    fn scenario() -> Vec<PublicationRecord> {
        vec![
            titled("pub1", "Visual Analytics"),
            titled("pub2", "Visual Data"),
            titled("pub3", "Machine Learning"),
        ]
    }

    fn find<'a>(concepts: &'a [FormalConcept], extent: &[&str], intent: &[&str]) -> Option<&'a FormalConcept> {
        concepts
            .iter()
            .find(|c| c.extent == extent && c.intent == intent)
    }

    #[test]
    fn test_visual_data_scenario() {
        let concepts = compute_concepts(&scenario(), &["VISUAL", "DATA"], &ConceptConfig::default()).unwrap();

        let visual = find(&concepts, &["pub1", "pub2"], &["VISUAL"]).expect("VISUAL concept");
        assert_eq!(visual.importance(), 2);
        assert!(find(&concepts, &["pub2"], &["DATA", "VISUAL"]).is_some());

        // Machine Learning only shows up in the top concept, with no attribute
        for concept in &concepts {
            if concept.extent.iter().any(|d| d == "pub3") {
                assert!(concept.intent.is_empty());
            }
        }
        assert_eq!(concepts.len(), 3);
        assert_eq!(concepts[0], *visual);
    }

    #[test]
    fn test_closure_law_and_uniqueness() {
        let mut publications = scenario();
        publications.push(titled("pub4", "Data Mining for Visual Learning"));
        publications.push(titled("pub5", "Learning Data Structures"));
        let groups = ["visual", "data", "learning", "mining|analytics"];

        let context = FormalContext::build(&publications, &groups, ContextOptions::from(&ConceptConfig::default())).unwrap();
        let concepts = enumerate_concepts(&context);
        assert!(!concepts.is_empty());

        let index_of = |doi: &String| context.objects().iter().position(|o| o == doi).unwrap();
        let mask_of = |labels: &[String]| {
            labels.iter().fold(0u64, |mask, label| {
                mask | (1u64 << context.attributes().iter().position(|a| a == label).unwrap())
            })
        };

        for concept in &concepts {
            let extent: Vec<usize> = concept.extent.iter().map(index_of).collect();
            let intent = mask_of(&concept.intent);
            assert_eq!(context.intent(&extent), intent);
            assert_eq!(context.extent(intent), extent);
        }

        let unique: BTreeSet<_> = concepts.iter().map(|c| (&c.extent, &c.intent)).collect();
        assert_eq!(unique.len(), concepts.len());
        let ids: BTreeSet<_> = concepts.iter().map(|c| &c.id).collect();
        assert_eq!(ids.len(), concepts.len());
    }

    #[test]
    fn test_bottom_concept_has_every_attribute() {
        let concepts = compute_concepts(
            &[titled("a", "Visual"), titled("b", "Data")],
            &["visual", "data"],
            &ConceptConfig::default(),
        )
        .unwrap();

        let bottom = find(&concepts, &[], &["data", "visual"]).expect("bottom concept");
        assert_eq!(bottom.importance(), 0);
    }

    #[test]
    fn test_citation_link_attributes() {
        let mut publications = scenario();
        publications[0].cites_out = vec!["10.9/shared".into()];
        publications[2].cites_out = vec!["10.9/shared".into()];
        let config = ConceptConfig {
            include_citation_links: true,
            ..Default::default()
        };

        let concepts = compute_concepts(&publications, &["VISUAL"], &config).unwrap();

        assert!(find(&concepts, &["pub1", "pub3"], &["cites 10.9/shared"]).is_some());
        assert!(find(&concepts, &["pub1"], &["VISUAL", "cites 10.9/shared"]).is_some());
    }

    #[test]
    fn test_empty_inputs() {
        let config = ConceptConfig::default();
        assert!(compute_concepts(&[], &["visual"], &config).unwrap().is_empty());
        assert!(compute_concepts(&scenario(), &[] as &[&str], &config).unwrap().is_empty());
    }

    #[test]
    fn test_attribute_limit() {
        let groups: Vec<String> = (0..21).map(|i| format!("kw{}", i)).collect();
        let err = compute_concepts(&scenario(), &groups, &ConceptConfig::default()).unwrap_err();
        assert!(matches!(err, AppError::TooManyAttributes { count: 21, limit: 20 }));
    }

    #[test]
    fn test_ids_are_stable() {
        let a = FormalConcept::new(vec!["b".into(), "a".into()], vec!["X".into()]);
        let b = FormalConcept::new(vec!["a".into(), "b".into()], vec!["X".into()]);
        assert_eq!(a.id, b.id);
        assert_eq!(a.id.len(), 64);
        assert_ne!(a.id, FormalConcept::new(vec!["a".into()], vec!["X".into()]).id);
    }
}
