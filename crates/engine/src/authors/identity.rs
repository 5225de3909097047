//! Author name parsing and identity keys

use regex_lite::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

fn orcid_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\d{4}-\d{4}-\d{4}-\d{3}[\dXx]").expect("ORCID pattern is valid")
    })
}

/// Normalized identity key for an author name
///
/// Lowercases, strips diacritics and spells out letters that are not
/// decomposable (`ø`, `æ`, `þ`, `ß`, ...). Name parts are kept apart by a
/// single space, so `"Wei, Sam"` and `"Weiss, Sam"` stay distinct; any other
/// punctuation or whitespace counts as a separator, apostrophes are dropped.
/// Runs of `s` collapse within a part: `"Weiß, Hans"`, `"Weiss, Hans"` and
/// `"Weis, Hans"` all map to `"weis hans"`.
pub fn name_to_id(name: &str) -> String {
    let lowered = name.to_lowercase();
    let mut folded = String::with_capacity(lowered.len());

    for c in lowered.nfd() {
        if is_combining_mark(c) {
            continue;
        }
        match c {
            'ß' => folded.push_str("ss"),
            'ø' => folded.push('o'),
            'å' => folded.push('a'),
            'æ' => folded.push_str("ae"),
            'þ' => folded.push_str("th"),
            'œ' => folded.push_str("oe"),
            'đ' | 'ð' => folded.push('d'),
            'ł' => folded.push('l'),
            'ı' => folded.push('i'),
            '\'' | '\u{2019}' => {}
            c if c.is_alphanumeric() => folded.push(c),
            _ => folded.push(' '),
        }
    }

    folded
        .split_whitespace()
        .map(collapse_s_runs)
        .collect::<Vec<_>>()
        .join(" ")
}

fn collapse_s_runs(part: &str) -> String {
    let mut collapsed = String::with_capacity(part.len());
    let mut previous = None;
    for c in part.chars() {
        if c == 's' && previous == Some('s') {
            continue;
        }
        collapsed.push(c);
        previous = Some(c);
    }
    collapsed
}

/// First ORCID token in `text`, with a lowercase check digit uppercased
pub fn extract_orcid(text: &str) -> Option<String> {
    orcid_pattern()
        .find(text)
        .map(|m| m.as_str().to_ascii_uppercase())
}

/// Split a raw `;`-separated author field into trimmed, non-empty entries
pub fn split_author_field(raw: Option<&str>) -> Vec<String> {
    raw.map(|raw| {
        raw.split(';')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}

/// Author entry with any ORCID token and its decoration removed
pub fn strip_orcid(entry: &str) -> String {
    let without_id = orcid_pattern().replace_all(entry, "");
    let mut cleaned = without_id.to_string();
    for decoration in ["https://orcid.org/", "http://orcid.org/", "orcid.org/", "()", "[]", "{}"] {
        cleaned = cleaned.replace(decoration, "");
    }
    cleaned
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end_matches([',', ':', '-'])
        .trim()
        .to_string()
}

/// One author as named by a single publication
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorName {
    /// Display form as written
    pub name: String,
    pub id: String,
    pub orcid: Option<String>,
}

/// Parse the author entries of one publication
///
/// Names come from `author`; `author_orcid` only contributes ORCIDs, matched
/// to names by identity key so the two fields may list authors in different
/// orders. When `author` is missing the names are taken from `author_orcid`.
/// Entries whose key is empty (pure punctuation) are dropped.
pub fn parse_authors(author: Option<&str>, author_orcid: Option<&str>) -> Vec<AuthorName> {
    let mut orcids: BTreeMap<String, String> = BTreeMap::new();
    let mut orcid_names = Vec::new();
    for entry in split_author_field(author_orcid) {
        let name = strip_orcid(&entry);
        let id = name_to_id(&name);
        if let Some(orcid) = extract_orcid(&entry) {
            orcids.entry(id.clone()).or_insert(orcid);
        }
        orcid_names.push(name);
    }

    let names = if author.is_some() {
        split_author_field(author)
    } else {
        orcid_names
    };

    names
        .into_iter()
        .filter_map(|name| {
            let id = name_to_id(&name);
            if id.is_empty() {
                return None;
            }
            let orcid = orcids.get(&id).cloned();
            Some(AuthorName { name, id, orcid })
        })
        .collect()
}
