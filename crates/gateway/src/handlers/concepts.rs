//! Concept handler

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::validate_request;
use crate::AppState;
use readforge_common::errors::Result;
use readforge_common::keywords::parse_keyword_groups;
use readforge_common::models::PublicationRecord;
use readforge_engine::{compute_concepts, ConceptConfig, FormalConcept};

/// Keyword groups, either as a list or as the raw comma-separated string
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum KeywordGroups {
    Raw(String),
    List(Vec<String>),
}

impl KeywordGroups {
    fn into_groups(self) -> Vec<String> {
        match self {
            KeywordGroups::Raw(raw) => parse_keyword_groups(&raw),
            KeywordGroups::List(groups) => groups,
        }
    }
}

/// Request to compute formal concepts
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ConceptsRequest {
    #[validate(length(max = 5000))]
    pub publications: Vec<PublicationRecord>,

    pub keywords: KeywordGroups,

    /// Overrides the configured setting
    pub include_citation_links: Option<bool>,
}

#[derive(Serialize)]
pub struct ConceptView {
    #[serde(flatten)]
    pub concept: FormalConcept,
    pub importance: usize,
}

#[derive(Serialize)]
pub struct ConceptsResponse {
    pub concepts: Vec<ConceptView>,
}

/// Compute formal concepts, most important first
pub async fn concepts(
    State(state): State<AppState>,
    Json(request): Json<ConceptsRequest>,
) -> Result<Json<ConceptsResponse>> {
    validate_request(&request)?;

    let mut config = ConceptConfig::from(state.config.concepts.clone());
    if let Some(include) = request.include_citation_links {
        config.include_citation_links = include;
    }

    let groups = request.keywords.into_groups();
    let concepts = compute_concepts(&request.publications, &groups, &config)?
        .into_iter()
        .map(|concept| ConceptView {
            importance: concept.importance(),
            concept,
        })
        .collect();

    Ok(Json(ConceptsResponse { concepts }))
}
