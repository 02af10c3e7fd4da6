//! Content model structs for documents and their metadata.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Structured header metadata of a document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub author: Option<String>,

    /// `None` when the document has no `tags` header at all
    #[serde(default)]
    pub tags: Option<Vec<String>>,

    #[serde(default)]
    pub keywords: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Epoch seconds
    #[serde(default)]
    pub timestamp: Option<i64>,

    #[serde(default)]
    pub comment: Option<String>,

    #[serde(default)]
    pub revision: Option<String>,

    /// Name of the document this one aliases
    #[serde(default)]
    pub link: Option<String>,

    /// Transform override for this document's body
    #[serde(default)]
    pub transform: Option<String>,

    /// Header keys without a dedicated field
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl Metadata {
    /// Link target, if the header names a non-empty one.
    pub fn link_target(&self) -> Option<&str> {
        self.link
            .as_deref()
            .map(str::trim)
            .filter(|link| !link.is_empty())
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags
            .as_ref()
            .map(|tags| tags.iter().any(|t| t == tag))
            .unwrap_or(false)
    }

    /// Look up a field by its header key.
    pub fn field(&self, key: &str) -> Option<String> {
        match key {
            "title" => self.title.clone(),
            "author" => self.author.clone(),
            "tags" => self.tags.as_ref().map(|tags| tags.join(" ")),
            "keywords" => self.keywords.clone(),
            "description" => self.description.clone(),
            "timestamp" => self.timestamp.map(|t| t.to_string()),
            "comment" => self.comment.clone(),
            "revision" => self.revision.clone(),
            "link" => self.link.clone(),
            "transform" => self.transform.clone(),
            other => self.extra.get(other).cloned(),
        }
    }
}

/// Display values derived from metadata on every load
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayFields {
    pub title_link: String,
    pub name_link: String,
    pub tags_string: String,
    pub mtime_format: String,
    pub timestamp_format: String,
    pub timestamp_date_format: String,
}

/// A resolved document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Canonical name (e.g., "hello")
    pub name: String,

    /// Backing file
    pub filename: PathBuf,

    /// File modification time, epoch seconds
    pub mtime: i64,

    /// Header title, or the name when the header is missing or empty
    pub title: String,

    pub meta: Metadata,

    /// Rendered HTML, the raw body when no transform applied, or empty for
    /// metadata-only resolution
    pub body: String,

    pub display: DisplayFields,
}

impl Document {
    pub fn tags(&self) -> Option<&[String]> {
        self.meta.tags.as_deref()
    }

    pub fn timestamp(&self) -> Option<i64> {
        self.meta.timestamp
    }

    /// Text for `title="..."` attributes: the description, else the title.
    pub fn tooltip(&self) -> &str {
        self.meta
            .description
            .as_deref()
            .filter(|d| !d.is_empty())
            .unwrap_or(&self.title)
    }

    /// Value of a named field as shown in listings.
    ///
    /// Covers the document's own fields, derived display fields and any
    /// header key.
    pub fn field(&self, key: &str) -> Option<String> {
        match key {
            "name" => Some(self.name.clone()),
            "title" => Some(self.title.clone()),
            "filename" => Some(self.filename.display().to_string()),
            "mtime" => Some(self.mtime.to_string()),
            "title_link" => Some(self.display.title_link.clone()),
            "name_link" => Some(self.display.name_link.clone()),
            "tags_string" => Some(self.display.tags_string.clone()),
            "mtime_format" => Some(self.display.mtime_format.clone()),
            "timestamp_format" => Some(self.display.timestamp_format.clone()),
            "timestamp_date_format" => Some(self.display.timestamp_date_format.clone()),
            other => self.meta.field(other),
        }
    }
}

/// Outcome of rendering a requested page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
    Document(Document),
    /// Nothing could be served; carries an inline HTML comment
    Diagnostic(String),
}

impl Page {
    pub fn body(&self) -> &str {
        match self {
            Page::Document(doc) => &doc.body,
            Page::Diagnostic(comment) => comment,
        }
    }

    pub fn document(&self) -> Option<&Document> {
        match self {
            Page::Document(doc) => Some(doc),
            Page::Diagnostic(_) => None,
        }
    }
}
