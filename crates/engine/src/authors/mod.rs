//! Author identity resolution
//!
//! Turns the raw author strings of the selected publications into a
//! deduplicated, deterministically ordered author list and a co-author
//! graph. Two mentions are the same author when their ORCIDs match, or when
//! their normalized name ids match and their ORCIDs do not conflict.

mod aggregate;
mod filter;
mod identity;
mod resolver;

pub use aggregate::{merge_years, AuthorAggregate};
pub use filter::publications_by_author;
pub use identity::{extract_orcid, name_to_id, parse_authors, split_author_field, strip_orcid, AuthorName};
pub use resolver::{coauthor_graph, resolve_authors, sort_authors, AuthorConfig, AuthorResolution, CoauthorEdge};
