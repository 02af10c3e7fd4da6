//! Filtering and sorting of document collections.
//!
//! A [`Query`] is an ordered list of `key=value` parameters. `sort` and
//! `reverse` choose the ordering; every other key is a filter and filters
//! apply one after another, so the result matches all of them. Unknown keys
//! match everything.

use crate::dates::{now, parse_timestamp};
use crate::models::Document;
use crate::site::Site;
use serde::{Deserialize, Serialize};

/// Ordered search parameters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    params: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`Query::push`].
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(key, value);
        self
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.push((key.into(), value.into()));
    }

    pub fn extend(&mut self, other: Query) {
        self.params.extend(other.params);
    }

    /// Parse `key = value` lines. Lines without `=` become keys with an empty
    /// value; blank lines and empty keys are skipped.
    pub fn from_lines(text: &str) -> Self {
        text.lines()
            .filter_map(|line| {
                let (key, value) = line.split_once('=').unwrap_or((line, ""));
                let key = key.trim();
                (!key.is_empty()).then(|| (key.to_string(), value.trim().to_string()))
            })
            .collect()
    }

    /// Parse `key=value` tokens. A bare token is a flag with value `1`.
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Self {
        tokens
            .iter()
            .filter_map(|token| {
                let token = token.as_ref().trim();
                let (key, value) = token.split_once('=').unwrap_or((token, "1"));
                let key = key.trim();
                (!key.is_empty()).then(|| (key.to_string(), value.trim().to_string()))
            })
            .collect()
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Last value given for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Filters in parameter order.
    pub fn filters(&self) -> Vec<Filter> {
        self.params
            .iter()
            .filter(|(key, _)| !matches!(key.as_str(), "sort" | "reverse"))
            .map(|(key, value)| Filter::parse(key, value))
            .collect()
    }

    pub fn sort(&self) -> SortSpec {
        let key = match self.get("sort").map(str::trim) {
            Some("mtime") | Some("time") => SortKey::Mtime,
            Some("timestamp") => SortKey::Timestamp,
            Some(other) => {
                if !other.is_empty() {
                    tracing::debug!("Unknown sort key '{}'; keeping listing order", other);
                }
                SortKey::None
            }
            None => SortKey::None,
        };
        SortSpec {
            key,
            reverse: self.get("reverse").is_some_and(is_truthy),
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Query {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            params: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// One search filter
///
/// Range filters only keep documents with a non-zero timestamp; tag filters
/// compare tags exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    HasTimestamp,
    /// Timestamp at or before the bound
    TimestampBefore(i64),
    /// Timestamp at or after the bound
    TimestampAfter(i64),
    TimestampBeforeNow,
    /// At least one of the tags
    AnyTag(Vec<String>),
    /// Every one of the tags
    AllTags(Vec<String>),
    /// None of the tags; untagged documents pass
    NoTags(Vec<String>),
    MatchAll,
}

impl Filter {
    pub fn parse(key: &str, value: &str) -> Filter {
        match key {
            "has_timestamp" => Filter::HasTimestamp,
            "timestamp_before" => Filter::TimestampBefore(bound(key, value)),
            "timestamp_after" => Filter::TimestampAfter(bound(key, value)),
            "timestamp_before_now" if is_truthy(value) => Filter::TimestampBeforeNow,
            "tag" | "or_tags" => Filter::AnyTag(split_tags(value)),
            "and_tags" => Filter::AllTags(split_tags(value)),
            "not_tag" | "not_tags" => Filter::NoTags(split_tags(value)),
            _ => Filter::MatchAll,
        }
    }

    pub fn matches(&self, doc: &Document, now: i64) -> bool {
        let has_tag = |tag: &String| doc.tags().is_some_and(|tags| tags.contains(tag));
        match self {
            Filter::HasTimestamp => doc.timestamp().is_some(),
            Filter::TimestampBefore(bound) => dated(doc).is_some_and(|t| t <= *bound),
            Filter::TimestampAfter(bound) => dated(doc).is_some_and(|t| t >= *bound),
            Filter::TimestampBeforeNow => dated(doc).is_some_and(|t| t <= now),
            Filter::AnyTag(tags) => tags.iter().any(has_tag),
            Filter::AllTags(tags) => doc.tags().is_some() && tags.iter().all(has_tag),
            Filter::NoTags(tags) => !tags.iter().any(has_tag),
            Filter::MatchAll => true,
        }
    }
}

fn dated(doc: &Document) -> Option<i64> {
    doc.timestamp().filter(|t| *t != 0)
}

fn bound(key: &str, value: &str) -> i64 {
    parse_timestamp(value).unwrap_or_else(|| {
        tracing::warn!("Unparseable {} value '{}'; using 0", key, value);
        0
    })
}

fn split_tags(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether a flag value is set: anything but empty, `0`, `false`, `no`, `off`.
pub fn is_truthy(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "" | "0" | "false" | "no" | "off"
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Keep listing order
    #[default]
    None,
    /// Modification time, then lowercased title
    Mtime,
    /// Header timestamp; undated documents first
    Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortSpec {
    pub key: SortKey,
    pub reverse: bool,
}

impl SortSpec {
    /// Sort in place. Ties keep their relative order.
    pub fn apply(&self, docs: &mut [Document]) {
        match self.key {
            SortKey::None => {}
            SortKey::Mtime => docs.sort_by_cached_key(|d| (d.mtime, d.title.to_lowercase())),
            SortKey::Timestamp => docs.sort_by_key(|d| d.timestamp()),
        }
        if self.reverse {
            docs.reverse();
        }
    }
}

/// Filter and order `docs` by `query`.
pub fn search(mut docs: Vec<Document>, query: &Query, now: i64) -> Vec<Document> {
    for filter in query.filters() {
        docs.retain(|doc| filter.matches(doc, now));
    }
    query.sort().apply(&mut docs);
    docs
}

impl Site {
    /// Search every listed document.
    pub fn search(&self, query: &Query) -> Vec<Document> {
        let docs = self.list_all();
        let total = docs.len();
        let found = search(docs, query, now());
        tracing::debug!("Search matched {} of {} documents", found.len(), total);
        found
    }
}
