//! Publication record

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// DOI string identifying a publication
pub type Doi = String;

/// A publication, either selected by the user or discovered as a candidate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicationRecord {
    /// Unique identifier
    pub doi: Doi,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub year: Option<i32>,

    /// Raw "Last, First; Last2, First2" author list
    #[serde(default)]
    pub author: Option<String>,

    /// Same structure as `author`, entries may embed an ORCID
    #[serde(default)]
    pub author_orcid: Option<String>,

    #[serde(default, rename = "abstract")]
    pub abstract_text: Option<String>,

    /// DOIs referenced by this publication's bibliography
    #[serde(default)]
    pub cites_out: Vec<Doi>,

    /// DOIs known to cite this publication
    #[serde(default)]
    pub cites_in: Vec<Doi>,

    #[serde(default)]
    pub score: f64,

    /// Number of selected publications citing this one
    #[serde(default)]
    pub citation_count: u32,

    /// Number of selected publications this one cites
    #[serde(default)]
    pub reference_count: u32,

    #[serde(default)]
    pub is_new: bool,

    #[serde(default)]
    pub is_read: bool,

    /// Whether metadata has been fetched for this record
    #[serde(default)]
    pub hydrated: bool,

    /// Keyword groups matched in this publication
    #[serde(default)]
    pub boost_keywords: BTreeSet<String>,
}

/// Metadata returned by a fetch collaborator for a single DOI
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicationMetadata {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub author_orcid: Option<String>,
    #[serde(default, rename = "abstract")]
    pub abstract_text: Option<String>,
    #[serde(default)]
    pub cites_out: Vec<Doi>,
    #[serde(default)]
    pub cites_in: Vec<Doi>,
}

impl PublicationRecord {
    /// Create an empty record for a DOI
    pub fn new(doi: impl Into<Doi>) -> Self {
        Self {
            doi: doi.into(),
            ..Default::default()
        }
    }

    /// Ranking signal used for suggestions
    pub fn connection_count(&self) -> u32 {
        self.citation_count + self.reference_count
    }

    /// Fill in fetched metadata
    ///
    /// Scalar fields are only overwritten when the fetch produced a value.
    /// Citation edges are unioned, existing edges first.
    pub fn apply_metadata(&mut self, metadata: PublicationMetadata) {
        if metadata.title.is_some() {
            self.title = metadata.title;
        }
        if metadata.year.is_some() {
            self.year = metadata.year;
        }
        if metadata.author.is_some() {
            self.author = metadata.author;
        }
        if metadata.author_orcid.is_some() {
            self.author_orcid = metadata.author_orcid;
        }
        if metadata.abstract_text.is_some() {
            self.abstract_text = metadata.abstract_text;
        }
        union_into(&mut self.cites_out, metadata.cites_out);
        union_into(&mut self.cites_in, metadata.cites_in);
        self.hydrated = true;
    }

    /// Add a DOI to `cites_in` unless already present
    pub fn add_citing(&mut self, doi: &str) -> bool {
        push_unique(&mut self.cites_in, doi)
    }

    /// Add a DOI to `cites_out` unless already present
    pub fn add_cited(&mut self, doi: &str) -> bool {
        push_unique(&mut self.cites_out, doi)
    }
}

fn push_unique(list: &mut Vec<Doi>, doi: &str) -> bool {
    if list.iter().any(|d| d == doi) {
        return false;
    }
    list.push(doi.to_string());
    true
}

fn union_into(target: &mut Vec<Doi>, incoming: Vec<Doi>) {
    for doi in incoming {
        if !target.contains(&doi) {
            target.push(doi);
        }
    }
}
