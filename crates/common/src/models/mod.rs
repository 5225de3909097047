//! Publication data model shared by all engines

mod publication;

pub use publication::{Doi, PublicationMetadata, PublicationRecord};
