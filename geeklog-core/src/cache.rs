//! Metadata cache keyed by content filename.
//!
//! A [`MetadataStore`] is a plain key-value store: one value per
//! `(file, key)`. [`MetadataCache`] lays a document's metadata projection out
//! over it, one `geeklog.<field>` key per field plus the reserved
//! `geeklog.metatime` cache-time. A projection is only trusted while its
//! cache-time is not older than the file's modification time, so lost or
//! interleaved writes cost a re-parse and never serve stale data.

use crate::models::Metadata;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Namespace prefix of every cache key
pub const KEY_PREFIX: &str = "geeklog.";

/// Reserved key holding the cache-time
pub const METATIME_KEY: &str = "geeklog.metatime";

/// Metadata fields persisted in the cache
pub const CACHED_FIELDS: &[&str] = &[
    "title",
    "author",
    "tags",
    "keywords",
    "description",
    "timestamp",
    "comment",
    "revision",
    "link",
    "transform",
    "extra",
];

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt cache entry for {path:?}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// External key-value storage for per-file metadata
///
/// Implementations must tolerate concurrent readers and writers; the last
/// write of a key wins.
pub trait MetadataStore: Send + Sync {
    /// Whether this store can be used for the given content directory.
    fn supported(&self, content_dir: &Path) -> bool;

    fn get(&self, file: &Path, key: &str) -> Result<Option<String>, CacheError>;

    fn set(&self, file: &Path, key: &str, value: &str) -> Result<(), CacheError>;
}

/// Process-local store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<PathBuf, HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MetadataStore for MemoryStore {
    fn supported(&self, _content_dir: &Path) -> bool {
        true
    }

    fn get(&self, file: &Path, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self
            .entries
            .read()
            .get(file)
            .and_then(|keys| keys.get(key))
            .cloned())
    }

    fn set(&self, file: &Path, key: &str, value: &str) -> Result<(), CacheError> {
        self.entries
            .write()
            .entry(file.to_path_buf())
            .or_default()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store writing one JSON object per content file into a cache directory
///
/// `content/hello.txt` is cached in `<dir>/hello.txt.json`. Content files
/// live in a single flat directory, so the file name is a unique key.
#[derive(Debug, Clone)]
pub struct SidecarStore {
    dir: PathBuf,
}

impl SidecarStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    fn entry_path(&self, file: &Path) -> PathBuf {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        self.dir.join(format!("{name}.json"))
    }

    fn read_entry(&self, path: &Path) -> Result<BTreeMap<String, String>, CacheError> {
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(BTreeMap::new())
            }
            Err(source) => {
                return Err(CacheError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        serde_json::from_slice(&data).map_err(|source| CacheError::Corrupt {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl MetadataStore for SidecarStore {
    fn supported(&self, _content_dir: &Path) -> bool {
        match fs::create_dir_all(&self.dir) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!("Cache directory {:?} unavailable: {}", self.dir, err);
                false
            }
        }
    }

    fn get(&self, file: &Path, key: &str) -> Result<Option<String>, CacheError> {
        let entry = self.read_entry(&self.entry_path(file))?;
        Ok(entry.get(key).cloned())
    }

    fn set(&self, file: &Path, key: &str, value: &str) -> Result<(), CacheError> {
        let path = self.entry_path(file);
        // A corrupt entry is simply replaced.
        let mut entry = self.read_entry(&path).unwrap_or_default();
        entry.insert(key.to_string(), value.to_string());

        let io_err = |source| CacheError::Io {
            path: path.clone(),
            source,
        };
        let json = serde_json::to_vec(&entry).map_err(|source| CacheError::Corrupt {
            path: path.clone(),
            source,
        })?;

        // Each write gets its own temporary file, renamed over the entry
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(io_err)?;
        tmp.write_all(&json).map_err(io_err)?;
        tmp.persist(&path).map_err(|err| io_err(err.error))?;
        Ok(())
    }
}

/// A cached metadata projection together with its cache-time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedMetadata {
    pub cache_time: i64,
    pub metadata: Metadata,
}

impl CachedMetadata {
    /// Whether the projection still describes a file with this mtime: the
    /// cache-time is at or after the modification time.
    pub fn is_fresh(&self, mtime: i64) -> bool {
        self.cache_time >= mtime
    }
}

/// Metadata projection layered over a [`MetadataStore`]
pub struct MetadataCache {
    store: Box<dyn MetadataStore>,
}

impl MetadataCache {
    pub fn new(store: Box<dyn MetadataStore>) -> Self {
        Self { store }
    }

    /// Read the projection cached for `file`, if a complete one exists.
    pub fn load(&self, file: &Path) -> Result<Option<CachedMetadata>, CacheError> {
        let Some(metatime) = self.store.get(file, METATIME_KEY)? else {
            return Ok(None);
        };
        let Ok(cache_time) = metatime.trim().parse::<i64>() else {
            tracing::debug!("Ignoring unreadable cache-time {:?} for {:?}", metatime, file);
            return Ok(None);
        };

        let mut fields = Map::new();
        for field in CACHED_FIELDS {
            let value = match self.store.get(file, &cache_key(field))? {
                Some(raw) => serde_json::from_str(&raw).map_err(|source| CacheError::Corrupt {
                    path: file.to_path_buf(),
                    source,
                })?,
                None => Value::Null,
            };
            // Absent maps deserialize through their default
            if !value.is_null() {
                fields.insert(field.to_string(), value);
            }
        }

        let metadata = serde_json::from_value(Value::Object(fields)).map_err(|source| {
            CacheError::Corrupt {
                path: file.to_path_buf(),
                source,
            }
        })?;

        Ok(Some(CachedMetadata {
            cache_time,
            metadata,
        }))
    }

    /// Persist the projection for `file`, stamped with `cache_time`.
    ///
    /// The cache-time is written last so a partially written projection is
    /// never paired with a fresh stamp.
    pub fn save(
        &self,
        file: &Path,
        metadata: &Metadata,
        cache_time: i64,
    ) -> Result<(), CacheError> {
        let value = serde_json::to_value(metadata).map_err(|source| CacheError::Corrupt {
            path: file.to_path_buf(),
            source,
        })?;
        let fields = match value {
            Value::Object(fields) => fields,
            _ => Map::new(),
        };

        for field in CACHED_FIELDS {
            let encoded = fields.get(*field).cloned().unwrap_or(Value::Null).to_string();
            self.store.set(file, &cache_key(field), &encoded)?;
        }
        self.store
            .set(file, METATIME_KEY, &cache_time.to_string())?;
        Ok(())
    }
}

fn cache_key(field: &str) -> String {
    format!("{KEY_PREFIX}{field}")
}
