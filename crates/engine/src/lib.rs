//! ReadForge analytics engines
//!
//! Three independent engines over the same publication model:
//! - [`suggestion`]: citation-graph expansion and ranking of new candidates
//! - [`authors`]: author identity resolution and co-author network
//! - [`concepts`]: formal concept analysis over keyword and citation attributes
//!
//! None of the engines keep state between calls. Every invocation recomputes
//! its result from the given input.

pub mod authors;
pub mod concepts;
pub mod fetch;
pub mod suggestion;

pub use authors::{resolve_authors, AuthorAggregate, AuthorConfig, AuthorResolution};
pub use concepts::{compute_concepts, ConceptConfig, FormalConcept};
pub use fetch::{CatalogFetcher, MetadataFetcher};
pub use suggestion::{SuggestionConfig, SuggestionEngine, SuggestionInput, SuggestionOutcome};
