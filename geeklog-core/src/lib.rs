//! # geeklog-core
//!
//! Core library for geeklog, a personal website engine serving a flat
//! directory of plain-text documents.
//!
//! A document is a block of `key: value` headers, a blank line and a body.
//! This crate resolves documents by name (following `link` aliases), caches
//! their metadata, renders bodies through named transforms, and answers the
//! filter/sort queries that listing blocks embed in pages.

pub mod blocks;
pub mod cache;
pub mod config;
pub mod dates;
pub mod headers;
pub mod html;
pub mod lister;
pub mod markup;
pub mod models;
pub mod name;
pub mod resolver;
pub mod search;
pub mod site;
pub mod transform;

pub use blocks::{Block, BlockRegistry};
pub use cache::{CacheError, MemoryStore, MetadataCache, MetadataStore, SidecarStore};
pub use config::{CacheBackend, Config, ConfigError};
pub use models::{DisplayFields, Document, Metadata, Page};
pub use name::sanitize;
pub use resolver::{Mode, ResolveError, Target};
pub use search::{Filter, Query, SortKey, SortSpec};
pub use site::{RenderContext, Site};
pub use transform::{Transform, TransformRegistry};
