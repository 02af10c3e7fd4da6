//! The engine context shared by every resolution.

use crate::blocks::BlockRegistry;
use crate::cache::{MemoryStore, MetadataCache, MetadataStore, SidecarStore};
use crate::config::{CacheBackend, Config};
use crate::transform::TransformRegistry;

/// A content site: configuration plus the registries and cache built from it
///
/// Constructed once at startup and shared by reference. Resolution, listing
/// and search are methods on `Site` (see `resolver`, `lister`, `search`).
pub struct Site {
    config: Config,
    cache: Option<MetadataCache>,
    transforms: TransformRegistry,
    blocks: BlockRegistry,
}

impl Site {
    /// Build a site with the built-in transforms and blocks and the cache
    /// backend named in the configuration.
    pub fn new(config: Config) -> Self {
        let store: Option<Box<dyn MetadataStore>> = match config.cache.backend {
            CacheBackend::None => None,
            CacheBackend::Memory => Some(Box::new(MemoryStore::new())),
            CacheBackend::Sidecar => Some(Box::new(SidecarStore::new(config.cache_dir()))),
        };

        let site = Self {
            transforms: TransformRegistry::with_builtins(&config),
            blocks: BlockRegistry::with_builtins(),
            cache: None,
            config,
        };

        match store {
            Some(store) => site.with_store(store),
            None => site,
        }
    }

    /// Use `store` for metadata caching if it supports the content directory.
    pub fn with_store(mut self, store: Box<dyn MetadataStore>) -> Self {
        let content_dir = self.config.content_dir();
        if store.supported(&content_dir) {
            self.cache = Some(MetadataCache::new(store));
        } else {
            tracing::info!(
                "Metadata cache not supported for {:?}; caching disabled",
                content_dir
            );
            self.cache = None;
        }
        self
    }

    /// Disable metadata caching.
    pub fn without_cache(mut self) -> Self {
        self.cache = None;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache(&self) -> Option<&MetadataCache> {
        self.cache.as_ref()
    }

    pub fn transforms(&self) -> &TransformRegistry {
        &self.transforms
    }

    pub fn transforms_mut(&mut self) -> &mut TransformRegistry {
        &mut self.transforms
    }

    pub fn blocks(&self) -> &BlockRegistry {
        &self.blocks
    }

    pub fn blocks_mut(&mut self) -> &mut BlockRegistry {
        &mut self.blocks
    }

    /// Top-level rendering context.
    pub fn context(&self) -> RenderContext<'_> {
        RenderContext {
            site: self,
            depth: 0,
        }
    }
}

/// What a transform or block sees of the resolution that invoked it
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    pub site: &'a Site,
    /// Recursion depth of the document being rendered
    pub depth: u32,
}

impl<'a> RenderContext<'a> {
    /// Whether a nested resolution (link hop, include, blog entry) may start.
    pub fn can_descend(&self) -> bool {
        self.depth < self.site.config().max_link_depth
    }

    /// Depth for a nested resolution started from here.
    pub fn child_depth(&self) -> u32 {
        self.depth + 1
    }
}
