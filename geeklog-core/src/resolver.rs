//! Document resolution: name to file, metadata (cached or parsed), link
//! recursion and body transformation.

use crate::dates::{format_epoch, now};
use crate::headers::parse_document;
use crate::html::{diagnostic, escape_attr, escape_text};
use crate::models::{DisplayFields, Document, Metadata, Page};
use crate::name::{name_from_filename, sanitize};
use crate::site::{RenderContext, Site};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("invalid document name {0:?}")]
    InvalidName(String),

    #[error("document not found: {0}")]
    NotFound(String),

    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// How much of a document to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Metadata plus transformed body
    Full,
    /// Metadata only, served from the cache when fresh; the body is empty
    MetadataOnly,
}

/// What to resolve
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    /// A requested name, sanitized before lookup
    Name(&'a str),
    /// A specific content file
    File(&'a Path),
}

impl Site {
    /// Find the file backing a canonical name.
    ///
    /// `content/<name>` wins, then `content/<name><suffix>` for each configured
    /// suffix in order. Only regular files count.
    pub fn locate(&self, name: &str) -> Option<PathBuf> {
        let base = self.config().content_dir().join(name);
        if base.is_file() {
            return Some(base);
        }

        self.config()
            .suffixes
            .iter()
            .map(|suffix| {
                let mut path = base.clone().into_os_string();
                path.push(suffix);
                PathBuf::from(path)
            })
            .find(|path| path.is_file())
    }

    /// Fully render the document named `name`.
    pub fn resolve(&self, name: &str) -> Result<Document, ResolveError> {
        self.resolve_at(Target::Name(name), Mode::Full, 0)
    }

    /// Metadata of the document named `name`, without a body.
    pub fn resolve_metadata(&self, name: &str) -> Result<Document, ResolveError> {
        self.resolve_at(Target::Name(name), Mode::MetadataOnly, 0)
    }

    pub fn resolve_file(&self, path: &Path, mode: Mode) -> Result<Document, ResolveError> {
        self.resolve_at(Target::File(path), mode, 0)
    }

    /// Resolve `target` at recursion depth `depth`.
    ///
    /// A document whose `link` header names another document resolves to
    /// that document instead, one level deeper. Once `max_link_depth` is
    /// reached the linking document itself is returned. A link to a missing
    /// document is `NotFound`.
    pub fn resolve_at(
        &self,
        target: Target<'_>,
        mode: Mode,
        depth: u32,
    ) -> Result<Document, ResolveError> {
        let path = match target {
            Target::Name(raw) => {
                let name =
                    sanitize(raw).ok_or_else(|| ResolveError::InvalidName(raw.to_string()))?;
                self.locate(&name).ok_or(ResolveError::NotFound(name))?
            }
            Target::File(path) => path.to_path_buf(),
        };

        let name = name_from_filename(&path)
            .ok_or_else(|| ResolveError::InvalidName(path.display().to_string()))?;
        let mtime = file_mtime(&path, &name)?;

        let (meta, body) = match self.cached_metadata(&path, mode, mtime) {
            Some(meta) => (meta, String::new()),
            None => {
                let contents = fs::read_to_string(&path).map_err(|source| ResolveError::Io {
                    path: path.clone(),
                    source,
                })?;
                let (meta, body) = parse_document(&contents);
                if mode == Mode::MetadataOnly {
                    self.store_metadata(&path, &meta);
                }
                (meta, body)
            }
        };

        if let Some(link) = meta.link_target() {
            if depth < self.config().max_link_depth {
                tracing::debug!("Following link {} -> {}", name, link);
                return self.resolve_at(Target::Name(link), mode, depth + 1);
            }
            tracing::debug!("Link depth exhausted at {}; serving it unfollowed", name);
        }

        let body = match mode {
            Mode::MetadataOnly => String::new(),
            Mode::Full => self.transform_body(&name, &meta, &body, depth),
        };

        let title = meta
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(&name)
            .to_string();
        let display = self.display_fields(&name, &title, mtime, &meta);

        Ok(Document {
            name,
            filename: path,
            mtime,
            title,
            meta,
            body,
            display,
        })
    }

    /// Render the page requested as `name`.
    ///
    /// Missing documents fall back to the configured not-found document;
    /// anything that still cannot be served becomes an inline diagnostic.
    pub fn render_page(&self, name: &str) -> Page {
        self.page_at(name, 0)
    }

    fn page_at(&self, name: &str, depth: u32) -> Page {
        match self.resolve_at(Target::Name(name), Mode::Full, depth) {
            Ok(doc) => Page::Document(doc),
            Err(ResolveError::NotFound(missing)) => {
                tracing::debug!("Document {} not found", missing);
                match self.config().not_found_name() {
                    Some(fallback)
                        if fallback != missing && depth < self.config().max_link_depth =>
                    {
                        self.page_at(fallback, depth + 1)
                    }
                    _ => Page::Diagnostic(diagnostic(&format!("document not found: {missing}"))),
                }
            }
            Err(err) => {
                tracing::warn!("Cannot render {:?}: {}", name, err);
                Page::Diagnostic(diagnostic(&err.to_string()))
            }
        }
    }

    fn cached_metadata(&self, path: &Path, mode: Mode, mtime: i64) -> Option<Metadata> {
        if mode != Mode::MetadataOnly {
            return None;
        }
        let cache = self.cache()?;
        match cache.load(path) {
            Ok(Some(cached)) if cached.is_fresh(mtime) => {
                tracing::trace!("Cache hit for {:?}", path);
                Some(cached.metadata)
            }
            Ok(Some(cached)) => {
                tracing::debug!(
                    "Stale cache for {:?} (cached {}, modified {})",
                    path,
                    cached.cache_time,
                    mtime
                );
                None
            }
            Ok(None) => None,
            Err(err) => {
                tracing::warn!("Ignoring unreadable cache for {:?}: {}", path, err);
                None
            }
        }
    }

    fn store_metadata(&self, path: &Path, meta: &Metadata) {
        let Some(cache) = self.cache() else {
            return;
        };
        if let Err(err) = cache.save(path, meta, now()) {
            tracing::warn!("Failed to cache metadata for {:?}: {}", path, err);
        }
    }

    fn transform_body(&self, name: &str, meta: &Metadata, body: &str, depth: u32) -> String {
        let transform_name = meta
            .transform
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(&self.config().transform);

        match self.transforms().get(transform_name) {
            Some(transform) => {
                let ctx = RenderContext { site: self, depth };
                transform.apply(body, &ctx)
            }
            None => {
                tracing::debug!(
                    "No transform named {:?} for {}; serving body as is",
                    transform_name,
                    name
                );
                body.to_string()
            }
        }
    }

    fn display_fields(&self, name: &str, title: &str, mtime: i64, meta: &Metadata) -> DisplayFields {
        let config = self.config();
        let base = config.normalized_base_url();
        let tooltip = escape_attr(
            meta.description
                .as_deref()
                .filter(|d| !d.is_empty())
                .unwrap_or(title),
        );
        let timestamp = |pattern: &str| {
            meta.timestamp
                .map(|t| format_epoch(t, pattern))
                .unwrap_or_default()
        };

        DisplayFields {
            title_link: format!(
                "<a href=\"{base}{name}\" title=\"{tooltip}\">{}</a>",
                escape_text(title)
            ),
            name_link: format!("<a href=\"{base}{name}\" title=\"{tooltip}\">{name}</a>"),
            tags_string: meta
                .tags
                .as_ref()
                .map(|tags| tags.join(", "))
                .unwrap_or_default(),
            mtime_format: format_epoch(mtime, config.dates.mtime()),
            timestamp_format: timestamp(config.dates.timestamp()),
            timestamp_date_format: timestamp(config.dates.timestamp_date()),
        }
    }
}

fn file_mtime(path: &Path, name: &str) -> Result<i64, ResolveError> {
    let metadata = fs::metadata(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            ResolveError::NotFound(name.to_string())
        } else {
            ResolveError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    let modified = metadata.modified().map_err(|source| ResolveError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(match modified.duration_since(UNIX_EPOCH) {
        Ok(since) => since.as_secs() as i64,
        Err(before) => -(before.duration().as_secs() as i64),
    })
}
