//! Keyword group matching for titles
//!
//! A keyword group is a set of `|`-separated alternatives, e.g.
//! `"visual|visualization"`. Matching is case-insensitive over Unicode
//! simple case folding, so `"ÉTUDE"` finds `"étude"`. Short
//! alternatives (three characters or fewer) only match whole words so that
//! `"AI"` does not fire inside `"domain"`; longer alternatives match as
//! substrings so that `"visual"` also finds `"Visualization"`.
//!
//! Each group contributes at most one match per title, and matches never
//! overlap a span already claimed by an earlier group.

use crate::errors::{AppError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Alternatives up to this many characters require word boundaries
pub const WHOLE_WORD_MAX_CHARS: usize = 3;

/// A match of one keyword group inside a title
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordMatch {
    /// Index of the group in the matcher's group list
    pub group: usize,

    /// The alternative that matched, as written in the group
    pub alternative: String,

    /// Byte offset of the match start in the title
    pub start: usize,

    /// Byte offset one past the match end in the title
    pub end: usize,
}

#[derive(Debug, Clone)]
struct Alternative {
    text: String,
    pattern: Regex,
}

#[derive(Debug, Clone)]
struct KeywordGroup {
    label: String,
    alternatives: Vec<Alternative>,
}

/// Compiled matcher for an ordered list of keyword groups
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    groups: Vec<KeywordGroup>,
}

impl KeywordMatcher {
    /// Compile keyword groups
    ///
    /// Fails when a group has no non-empty alternative.
    pub fn new<S: AsRef<str>>(groups: &[S]) -> Result<Self> {
        let groups = groups
            .iter()
            .map(|raw| compile_group(raw.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { groups })
    }

    /// Number of keyword groups
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Group labels in order, as written by the user (trimmed)
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.label.as_str())
    }

    /// Find the first non-overlapping match of every group
    ///
    /// Groups are processed in order; the result holds at most one match per
    /// group, ordered by group index.
    pub fn find_matches(&self, title: &str) -> Vec<KeywordMatch> {
        let mut claimed: Vec<(usize, usize)> = Vec::new();
        let mut matches = Vec::new();

        for (index, group) in self.groups.iter().enumerate() {
            let mut best: Option<KeywordMatch> = None;

            for alternative in &group.alternatives {
                let found = alternative
                    .pattern
                    .find_iter(title)
                    .find(|m| !overlaps(&claimed, m.start(), m.end()));

                if let Some(m) = found {
                    let better = match &best {
                        None => true,
                        Some(current) => {
                            m.start() < current.start
                                || (m.start() == current.start && m.end() > current.end)
                        }
                    };
                    if better {
                        best = Some(KeywordMatch {
                            group: index,
                            alternative: alternative.text.clone(),
                            start: m.start(),
                            end: m.end(),
                        });
                    }
                }
            }

            if let Some(m) = best {
                claimed.push((m.start, m.end));
                matches.push(m);
            }
        }

        matches
    }

    /// Indices of the groups that match a title
    pub fn matched_groups(&self, title: &str) -> Vec<usize> {
        self.find_matches(title).into_iter().map(|m| m.group).collect()
    }
}

/// Split a raw boost-keyword string into groups
///
/// Groups are separated by commas; each group keeps its `|` alternatives.
pub fn parse_keyword_groups(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|g| g.split('|').any(|alt| !alt.trim().is_empty()))
        .map(|g| g.to_string())
        .collect()
}

fn compile_group(raw: &str) -> Result<KeywordGroup> {
    let label = raw.trim().to_string();

    let alternatives = label
        .split('|')
        .map(str::trim)
        .filter(|alt| !alt.is_empty())
        .map(compile_alternative)
        .collect::<Result<Vec<_>>>()?;

    if alternatives.is_empty() {
        return Err(AppError::Validation {
            message: format!("keyword group {:?} has no alternatives", raw),
            field: Some("keywords".to_string()),
        });
    }

    Ok(KeywordGroup { label, alternatives })
}

fn compile_alternative(text: &str) -> Result<Alternative> {
    let escaped = regex::escape(text);

    let pattern = if text.chars().count() <= WHOLE_WORD_MAX_CHARS {
        // A boundary is only meaningful next to a word character
        let leading = if text.starts_with(is_word_char) { r"\b" } else { "" };
        let trailing = if text.ends_with(is_word_char) { r"\b" } else { "" };
        format!("(?i){}{}{}", leading, escaped, trailing)
    } else {
        format!("(?i){}", escaped)
    };

    let pattern = Regex::new(&pattern).map_err(|e| AppError::InvalidFormat {
        message: format!("keyword {:?}: {}", text, e),
    })?;

    Ok(Alternative {
        text: text.to_string(),
        pattern,
    })
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn overlaps(claimed: &[(usize, usize)], start: usize, end: usize) -> bool {
    claimed.iter().any(|&(s, e)| start < e && s < end)
}
