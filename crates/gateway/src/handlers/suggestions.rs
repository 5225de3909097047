//! Suggestion handler

use axum::{extract::State, Json};
use serde::Deserialize;
use std::collections::HashSet;
use validator::Validate;

use super::validate_request;
use crate::AppState;
use readforge_common::errors::Result;
use readforge_common::models::{Doi, PublicationRecord};
use readforge_engine::{SuggestionInput, SuggestionOutcome};

/// Request for a suggestion page
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionsRequest {
    #[validate(length(max = 5000))]
    pub selected: Vec<PublicationRecord>,

    #[serde(default)]
    pub excluded: HashSet<Doi>,

    #[serde(default)]
    pub read: HashSet<Doi>,

    /// Overrides the configured page size
    #[validate(range(min = 1, max = 1000))]
    pub max_suggestions: Option<usize>,
}

/// Compute ranked, hydrated suggestions for the selected publications
pub async fn suggestions(
    State(state): State<AppState>,
    Json(request): Json<SuggestionsRequest>,
) -> Result<Json<SuggestionOutcome>> {
    validate_request(&request)?;

    let input = SuggestionInput {
        selected: &request.selected,
        excluded: &request.excluded,
        read: &request.read,
        max_suggestions: request.max_suggestions,
    };

    let outcome = state
        .suggestions
        .compute_suggestions(input, |progress| {
            tracing::debug!(progress = %progress, "Hydrating suggestions");
        })
        .await;

    Ok(Json(outcome))
}
