//! Configuration parsing and management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Main configuration struct matching the geeklog.yml schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub paths: PathsConfig,

    /// Suffixes tried, in order, when `content/<name>` does not exist
    #[serde(default = "default_suffixes")]
    pub suffixes: Vec<String>,

    /// Transform applied to bodies without a `transform` header
    #[serde(default = "default_transform")]
    pub transform: String,

    /// Document served in place of missing ones
    #[serde(default = "default_not_found")]
    pub not_found: Option<String>,

    /// How many `link` hops (and nested renders) a resolution may take
    #[serde(default = "default_max_link_depth")]
    pub max_link_depth: u32,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub dates: DatesConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub blog: BlogConfig,

    /// Register the template-evaluating transforms for trusted authors
    #[serde(default)]
    pub allow_scripts: bool,

    // Internal: path to config file (for relative path resolution)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

fn default_suffixes() -> Vec<String> {
    vec![".txt".into(), ".html".into(), ".link".into()]
}

fn default_transform() -> String {
    String::from("markup")
}

fn default_not_found() -> Option<String> {
    Some(String::from("404"))
}

fn default_max_link_depth() -> u32 {
    8
}

fn default_base_url() -> String {
    String::from("/")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory holding the content files
    pub content: PathBuf,

    /// Directory for the sidecar metadata cache (default: `<content>/.geeklog`)
    #[serde(default)]
    pub cache: Option<PathBuf>,
}

/// strftime patterns for the derived date fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatesConfig {
    #[serde(default = "default_date_time_format")]
    pub date_time_format: String,

    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// Overrides `date_time_format` for `mtime_format`
    #[serde(default)]
    pub mtime_format: Option<String>,

    /// Overrides `date_time_format` for `timestamp_format`
    #[serde(default)]
    pub timestamp_format: Option<String>,

    /// Overrides `date_format` for `timestamp_date_format`
    #[serde(default)]
    pub timestamp_date_format: Option<String>,
}

fn default_date_time_format() -> String {
    String::from("%c")
}

fn default_date_format() -> String {
    String::from("%F")
}

impl DatesConfig {
    pub fn mtime(&self) -> &str {
        self.mtime_format.as_deref().unwrap_or(&self.date_time_format)
    }

    pub fn timestamp(&self) -> &str {
        self.timestamp_format
            .as_deref()
            .unwrap_or(&self.date_time_format)
    }

    pub fn timestamp_date(&self) -> &str {
        self.timestamp_date_format
            .as_deref()
            .unwrap_or(&self.date_format)
    }
}

impl Default for DatesConfig {
    fn default() -> Self {
        Self {
            date_time_format: default_date_time_format(),
            date_format: default_date_format(),
            mtime_format: None,
            timestamp_format: None,
            timestamp_date_format: None,
        }
    }
}

/// Where metadata projections are cached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// No caching; every metadata lookup reads the file
    None,
    /// Process-local map
    Memory,
    /// JSON sidecar files under `paths.cache`
    #[default]
    Sidecar,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub backend: CacheBackend,
}

/// Labels used by the blog block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogConfig {
    #[serde(default = "default_read_more")]
    pub read_more: String,

    #[serde(default = "default_permalink")]
    pub permalink: String,

    #[serde(default = "default_by")]
    pub by: String,
}

fn default_read_more() -> String {
    String::from("Read the rest")
}

fn default_permalink() -> String {
    String::from("Permalink")
}

fn default_by() -> String {
    String::from("by")
}

impl Default for BlogConfig {
    fn default() -> Self {
        Self {
            read_more: default_read_more(),
            permalink: default_permalink(),
            by: default_by(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&contents)?;

        // Store config file path for relative path resolution
        config.config_path = Some(path.to_path_buf());
        config.validate()?;

        Ok(config)
    }

    /// Configuration with defaults for everything but the content directory
    pub fn with_content_dir<P: Into<PathBuf>>(content: P) -> Self {
        Self {
            paths: PathsConfig {
                content: content.into(),
                cache: None,
            },
            suffixes: default_suffixes(),
            transform: default_transform(),
            not_found: default_not_found(),
            max_link_depth: default_max_link_depth(),
            base_url: default_base_url(),
            dates: DatesConfig::default(),
            cache: CacheConfig::default(),
            blog: BlogConfig::default(),
            allow_scripts: false,
            config_path: None,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(suffix) = self.suffixes.iter().find(|s| s.is_empty() || s.contains('/')) {
            return Err(ConfigError::InvalidValue {
                field: "suffixes".into(),
                reason: format!("{:?} is not a file suffix", suffix),
            });
        }
        if self.transform.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "transform".into(),
                reason: "must name a transform".into(),
            });
        }
        Ok(())
    }

    /// Get the content directory, resolved relative to config file
    pub fn content_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.content)
    }

    /// Get the sidecar cache directory, resolved relative to config file
    pub fn cache_dir(&self) -> PathBuf {
        match &self.paths.cache {
            Some(dir) => self.resolve_path(dir),
            None => self.content_dir().join(".geeklog"),
        }
    }

    /// Name of the not-found fallback document, if one is configured
    pub fn not_found_name(&self) -> Option<&str> {
        self.not_found
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    /// Resolve a path relative to the config file location
    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else if let Some(config_path) = &self.config_path {
            if let Some(parent) = config_path.parent() {
                parent.join(path)
            } else {
                path.to_path_buf()
            }
        } else {
            path.to_path_buf()
        }
    }

    /// Normalized base URL with leading and trailing slash ("/foo/" or "/")
    pub fn normalized_base_url(&self) -> String {
        normalize_base_url(&self.base_url)
    }
}

/// Ensure base URLs have a leading and trailing slash
pub fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return "/".to_string();
    }

    let mut s = trimmed.to_string();
    if !s.starts_with('/') && !s.contains("://") {
        s.insert(0, '/');
    }
    if !s.ends_with('/') {
        s.push('/');
    }

    // Collapse duplicate slashes in the path part
    let (scheme, rest) = match s.find("://") {
        Some(pos) => s.split_at(pos + 3),
        None => ("", s.as_str()),
    };
    let mut path = rest.to_string();
    while path.contains("//") {
        path = path.replace("//", "/");
    }

    format!("{scheme}{path}")
}
