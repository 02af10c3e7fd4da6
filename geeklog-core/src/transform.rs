//! Named body transforms.
//!
//! Documents pick a transform by name (`transform:` header or the configured
//! default). Names missing from the registry leave the body untouched.

use crate::config::Config;
use crate::dates::now;
use crate::html::diagnostic;
use crate::markup::MarkupProcessor;
use crate::site::RenderContext;
use handlebars::Handlebars;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

/// Converts a raw body into HTML
pub trait Transform: Send + Sync {
    fn apply(&self, text: &str, ctx: &RenderContext<'_>) -> String;
}

impl<F> Transform for F
where
    F: Fn(&str, &RenderContext<'_>) -> String + Send + Sync,
{
    fn apply(&self, text: &str, ctx: &RenderContext<'_>) -> String {
        self(text, ctx)
    }
}

/// Registry mapping transform names to handlers
#[derive(Default)]
pub struct TransformRegistry {
    transforms: HashMap<String, Arc<dyn Transform>>,
}

impl TransformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The markup transform, plus the scripted ones when the config allows
    /// author-supplied templates.
    pub fn with_builtins(config: &Config) -> Self {
        let mut registry = Self::new();
        registry.register("markup", MarkupTransform::new());
        if config.allow_scripts {
            registry.register("script", ScriptTransform);
            registry.register("script_markup", ScriptMarkupTransform::new());
        }
        registry
    }

    /// Register (or replace) a transform.
    pub fn register<T: Transform + 'static>(&mut self, name: impl Into<String>, transform: T) {
        self.transforms.insert(name.into(), Arc::new(transform));
    }

    pub fn get(&self, name: &str) -> Option<&dyn Transform> {
        self.transforms.get(name).map(|t| t.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.transforms.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.transforms.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Markdown with wikilinks and query blocks
#[derive(Default)]
pub struct MarkupTransform {
    processor: MarkupProcessor,
}

impl MarkupTransform {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transform for MarkupTransform {
    fn apply(&self, text: &str, ctx: &RenderContext<'_>) -> String {
        self.processor.render(text, ctx)
    }
}

/// Evaluates the body as a Handlebars template
///
/// The template sees `now` (epoch seconds), `base_url` and `docs`, the
/// metadata of every listed document. Only registered when `allow_scripts`
/// is set: the body is trusted author input, never request data.
pub struct ScriptTransform;

impl Transform for ScriptTransform {
    fn apply(&self, text: &str, ctx: &RenderContext<'_>) -> String {
        let site = ctx.site;
        let data = json!({
            "now": now(),
            "base_url": site.config().normalized_base_url(),
            "docs": site.list_all(),
        });

        let handlebars = Handlebars::new();
        match handlebars.render_template(text, &data) {
            Ok(rendered) => rendered,
            Err(err) => {
                tracing::warn!("Script transform failed: {}", err);
                diagnostic(&format!("script error: {err}"))
            }
        }
    }
}

/// Template evaluation followed by markup
#[derive(Default)]
pub struct ScriptMarkupTransform {
    markup: MarkupTransform,
}

impl ScriptMarkupTransform {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transform for ScriptMarkupTransform {
    fn apply(&self, text: &str, ctx: &RenderContext<'_>) -> String {
        let source = ScriptTransform.apply(text, ctx);
        self.markup.apply(&source, ctx)
    }
}
