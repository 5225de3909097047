//! Per-author aggregates

use readforge_common::models::Doi;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Everything known about one resolved author
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorAggregate {
    /// Normalized identity key
    pub id: String,

    /// First-seen display form
    pub name: String,

    /// Every distinct raw form seen
    pub alternative_names: BTreeSet<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orcid: Option<String>,

    pub score: f64,

    /// Publications authored
    pub count: u32,

    pub first_author_count: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_min: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_max: Option<i32>,

    /// Co-author key (see [`AuthorAggregate::key`]) to number of shared publications
    pub coauthors: BTreeMap<String, u32>,

    /// Keyword group to number of publications matching it
    pub keywords: BTreeMap<String, u32>,

    pub publication_dois: BTreeSet<Doi>,

    /// Whether any contributing publication is new
    pub new_publication: bool,
}

impl AuthorAggregate {
    /// Node key in the co-author graph
    ///
    /// Name twins kept apart by their ORCIDs share an id, so the key carries
    /// the ORCID when there is one.
    pub fn key(&self) -> String {
        author_key(&self.id, self.orcid.as_deref())
    }

    /// Fold another aggregate of the same author into this one
    ///
    /// The display name, id and an existing ORCID are kept.
    pub fn merge_with(&mut self, other: AuthorAggregate) {
        self.score += other.score;
        self.count += other.count;
        self.first_author_count += other.first_author_count;

        self.year_min = merge_years(self.year_min, other.year_min, i32::min);
        self.year_max = merge_years(self.year_max, other.year_max, i32::max);

        for (coauthor, n) in other.coauthors {
            *self.coauthors.entry(coauthor).or_insert(0) += n;
        }
        for (keyword, n) in other.keywords {
            *self.keywords.entry(keyword).or_insert(0) += n;
        }

        self.alternative_names.extend(other.alternative_names);
        self.publication_dois.extend(other.publication_dois);
        self.new_publication |= other.new_publication;

        if self.orcid.is_none() {
            self.orcid = other.orcid;
        }
    }

    /// Composite ranking key
    ///
    /// First-author and publication counts only separate equal scores.
    pub fn sort_key(&self) -> f64 {
        self.score + f64::from(self.first_author_count) / 100.0 + f64::from(self.count) / 1000.0
    }
}

/// `id`, or `id#orcid` when the ORCID is known
pub fn author_key(id: &str, orcid: Option<&str>) -> String {
    match orcid {
        Some(orcid) => format!("{}#{}", id, orcid),
        None => id.to_string(),
    }
}

/// Combine two optional years
///
/// An absent side yields the other side; two absent sides stay absent.
pub fn merge_years(a: Option<i32>, b: Option<i32>, pick: fn(i32, i32) -> i32) -> Option<i32> {
    match (a, b) {
        (Some(a), Some(b)) => Some(pick(a, b)),
        (a, None) => a,
        (None, b) => b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aggregate(id: &str, year: Option<i32>) -> AuthorAggregate {
        AuthorAggregate {
            id: id.to_string(),
            name: id.to_string(),
            alternative_names: [id.to_string()].into_iter().collect(),
            score: 1.0,
            count: 1,
            year_min: year,
            year_max: year,
            ..Default::default()
        }
    }

    #[test]
    fn test_merge_years_null_safe() {
        assert_eq!(merge_years(None, None, i32::min), None);
        assert_eq!(merge_years(None, None, i32::max), None);
        assert_eq!(merge_years(Some(2021), None, i32::min), Some(2021));
        assert_eq!(merge_years(None, Some(2021), i32::max), Some(2021));
        assert_eq!(merge_years(Some(2020), Some(2023), i32::min), Some(2020));
        assert_eq!(merge_years(Some(2020), Some(2023), i32::max), Some(2023));
    }

    #[test]
    fn test_merge_absent_years_stay_absent() {
        let mut a = aggregate("a", None);
        a.merge_with(aggregate("a", None));
        assert_eq!((a.year_min, a.year_max), (None, None));

        a.merge_with(aggregate("a", Some(2023)));
        a.merge_with(aggregate("a", Some(2020)));
        assert_eq!((a.year_min, a.year_max), (Some(2020), Some(2023)));
    }

    #[test]
    fn test_merge_sums_and_unions() {
        let mut a = aggregate("doe jane", Some(2020));
        a.first_author_count = 1;
        a.coauthors.insert("roe rick".into(), 1);
        a.keywords.insert("VISUAL".into(), 1);
        a.publication_dois.insert("10.1/a".into());

        let mut b = aggregate("doe jane", Some(2022));
        b.name = "Doe, J.".into();
        b.alternative_names = ["Doe, J.".to_string()].into_iter().collect();
        b.orcid = Some("0000-0002-1825-0097".into());
        b.new_publication = true;
        b.coauthors.insert("roe rick".into(), 1);
        b.coauthors.insert("poe john".into(), 1);
        b.keywords.insert("VISUAL".into(), 1);
        b.publication_dois.insert("10.1/b".into());

        a.merge_with(b);

        assert_eq!(a.name, "doe jane");
        assert_eq!(a.score, 2.0);
        assert_eq!(a.count, 2);
        assert_eq!(a.first_author_count, 1);
        assert_eq!(a.coauthors["roe rick"], 2);
        assert_eq!(a.coauthors["poe john"], 1);
        assert_eq!(a.keywords["VISUAL"], 2);
        assert_eq!(a.alternative_names.len(), 2);
        assert_eq!(a.publication_dois.len(), 2);
        assert_eq!(a.orcid.as_deref(), Some("0000-0002-1825-0097"));
        assert!(a.new_publication);
    }

    #[test]
    fn test_sort_key_tie_breaks() {
        let mut a = aggregate("a", None);
        let mut b = aggregate("b", None);
        a.first_author_count = 1;
        b.count = 5;
        assert!(a.sort_key() > b.sort_key());
    }

    #[test]
    fn test_key_carries_orcid() {
        let mut a = aggregate("lee j", None);
        assert_eq!(a.key(), "lee j");
        a.orcid = Some("0000-0001-1111-1111".into());
        assert_eq!(a.key(), "lee j#0000-0001-1111-1111");
    }

    #[test]
    fn test_absent_years_not_serialized() {
        let json = serde_json::to_value(aggregate("a", None)).unwrap();
        assert!(json.get("yearMin").is_none());
        assert!(json.get("orcid").is_none());
        assert_eq!(json["alternativeNames"][0], "a");
    }
}
