//! Header block parsing for content files.
//!
//! A content file is a block of `key: value` lines, a blank line, and the
//! body. The header block ends at the first blank line; a file without one is
//! all headers.

use crate::dates::parse_timestamp;
use crate::models::Metadata;

/// Split file contents into the header block and the body.
pub fn split_headers(contents: &str) -> (&str, &str) {
    match contents.split_once("\n\n") {
        Some((headers, body)) => (headers, body),
        None => (contents, ""),
    }
}

/// Split one header line at its first `:`, trimming both sides.
///
/// Returns `None` for blank lines, lines without a separator and lines with
/// an empty key.
pub fn parse_header_line(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(':')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key, value.trim()))
}

/// Parse a header block into typed metadata.
///
/// Later duplicates of a key override earlier ones.
pub fn parse_headers(block: &str) -> Metadata {
    let mut meta = Metadata::default();

    for line in block.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let Some((key, value)) = parse_header_line(line) else {
            tracing::debug!("Skipping header line without separator: {:?}", line);
            continue;
        };

        let text = Some(value.to_string());
        match key {
            "title" => meta.title = text,
            "author" => meta.author = text,
            "tags" => {
                meta.tags = Some(value.split_whitespace().map(str::to_string).collect());
            }
            "keywords" => meta.keywords = text,
            "description" => meta.description = text,
            "timestamp" => meta.timestamp = parse_timestamp(value),
            "comment" => meta.comment = text,
            "revision" => meta.revision = text,
            "link" => meta.link = text,
            "transform" => meta.transform = text,
            other => {
                meta.extra.insert(other.to_string(), value.to_string());
            }
        }
    }

    meta
}

/// Parse a whole content file into metadata and raw body.
///
/// Line endings are normalised to `\n` first.
///
/// # Example
///
/// ```
/// use geeklog_core::headers::parse_document;
///
/// let (meta, body) = parse_document("title: Hello\ntags: a b\n\nWorld\n");
/// assert_eq!(meta.title.as_deref(), Some("Hello"));
/// assert_eq!(meta.tags, Some(vec!["a".to_string(), "b".to_string()]));
/// assert_eq!(body, "World\n");
/// ```
pub fn parse_document(contents: &str) -> (Metadata, String) {
    let normalised = contents.replace("\r\n", "\n");
    let (headers, body) = split_headers(&normalised);
    (parse_headers(headers), body.to_string())
}
