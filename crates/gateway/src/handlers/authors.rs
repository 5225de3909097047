//! Author handlers

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::validate_request;
use crate::AppState;
use readforge_common::errors::Result;
use readforge_common::models::PublicationRecord;
use readforge_engine::authors::publications_by_author;
use readforge_engine::{resolve_authors, AuthorAggregate, AuthorConfig, AuthorResolution};

/// Request to resolve the authors of a publication set
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AuthorsRequest {
    #[validate(length(max = 5000))]
    pub publications: Vec<PublicationRecord>,

    #[serde(default = "enabled")]
    pub score_enabled: bool,

    #[serde(default = "enabled")]
    pub first_author_boost_enabled: bool,

    #[serde(default = "enabled")]
    pub new_boost_enabled: bool,
}

fn enabled() -> bool {
    true
}

/// Request for the publications of one resolved author
#[derive(Debug, Deserialize, Validate)]
pub struct AuthorPublicationsRequest {
    pub author: AuthorAggregate,

    #[validate(length(max = 5000))]
    pub publications: Vec<PublicationRecord>,
}

#[derive(Serialize)]
pub struct AuthorPublicationsResponse {
    pub publications: Vec<PublicationRecord>,
}

/// Resolve author identities and the co-author graph
pub async fn authors(
    State(state): State<AppState>,
    Json(request): Json<AuthorsRequest>,
) -> Result<Json<AuthorResolution>> {
    validate_request(&request)?;

    let config = AuthorConfig {
        score_enabled: request.score_enabled,
        first_author_boost_enabled: request.first_author_boost_enabled,
        new_boost_enabled: request.new_boost_enabled,
        ..AuthorConfig::from(state.config.authors.clone())
    };

    Ok(Json(resolve_authors(&request.publications, &config)))
}

/// Publications listing the given author
pub async fn author_publications(
    Json(request): Json<AuthorPublicationsRequest>,
) -> Result<Json<AuthorPublicationsResponse>> {
    validate_request(&request)?;

    let publications = publications_by_author(&request.author, &request.publications)
        .into_iter()
        .cloned()
        .collect();

    Ok(Json(AuthorPublicationsResponse { publications }))
}
