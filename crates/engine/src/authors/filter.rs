//! Publications of a resolved author

use super::aggregate::AuthorAggregate;
use super::identity::{name_to_id, parse_authors};
use readforge_common::models::PublicationRecord;
use std::collections::HashSet;

/// Publications listing `author` as one of their authors
///
/// Each author entry is compared as a whole token: its identity key must
/// equal the author's id or the key of one of the author's alternative
/// names, or its ORCID must equal the author's ORCID. `"Smith, J."` never
/// matches an entry `"Smith, John B."`.
pub fn publications_by_author<'a>(
    author: &AuthorAggregate,
    publications: &'a [PublicationRecord],
) -> Vec<&'a PublicationRecord> {
    let mut ids: HashSet<String> = author.alternative_names.iter().map(|n| name_to_id(n)).collect();
    ids.insert(author.id.clone());

    publications
        .iter()
        .filter(|publication| {
            parse_authors(publication.author.as_deref(), publication.author_orcid.as_deref())
                .iter()
                .any(|entry| {
                    ids.contains(&entry.id)
                        || (entry.orcid.is_some() && entry.orcid == author.orcid)
                })
        })
        .collect()
}
