//! Markdown rendering with wikilinks and query blocks.

pub mod blocks;
pub mod links;

use crate::site::RenderContext;
use pulldown_cmark::{html, Event, Options, Parser};

pub use blocks::BlockTransformer;
pub use links::{LinkResolver, LinkTransformer, SiteLinks};

/// Markdown processor with the site's extensions
pub struct MarkupProcessor {
    options: Options,
}

impl MarkupProcessor {
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);

        Self { options }
    }

    /// Convert markdown to HTML, expanding blocks and resolving links
    /// against the site in `ctx`.
    pub fn render(&self, markdown: &str, ctx: &RenderContext<'_>) -> String {
        let events: Vec<Event> = Parser::new_ext(markdown, self.options).collect();

        // Blocks first: their output is HTML and must not be relinked
        let events = BlockTransformer::new(ctx).transform(events);

        let resolver = SiteLinks::new(ctx);
        let events = LinkTransformer::new(&resolver).transform(events);

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());
        html_output
    }
}

impl Default for MarkupProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CacheBackend, Config};
    use crate::site::Site;
    use std::fs;
    use tempfile::TempDir;

    fn site_with(files: &[(&str, &str)]) -> (TempDir, Site) {
        let dir = tempfile::tempdir().unwrap();
        for (name, contents) in files {
            fs::write(dir.path().join(name), contents).unwrap();
        }
        let mut config = Config::with_content_dir(dir.path());
        config.cache.backend = CacheBackend::None;
        (dir, Site::new(config))
    }

    #[test]
    fn test_plain_markdown() {
        let (_dir, site) = site_with(&[]);
        let html = MarkupProcessor::new().render("# Title\n\n*hi*", &site.context());
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<em>hi</em>"));
    }

    #[test]
    fn test_links_and_blocks_together() {
        let (_dir, site) = site_with(&[("a.txt", "title: Page A\n\nA")]);
        let source = "See [[a]].\n\n```break\n```\n\nMore";
        let html = MarkupProcessor::new().render(source, &site.context());

        assert!(html.contains("<a href=\"/a\">a</a>"));
        assert!(html.contains("<!-- break -->"));
        assert!(html.contains("<p>More</p>"));
    }

    #[test]
    fn test_ordinary_code_fences_untouched() {
        let (_dir, site) = site_with(&[]);
        let html = MarkupProcessor::new().render("```rust\nlet x = [[y]];\n```\n", &site.context());
        assert!(html.contains("<pre><code class=\"language-rust\">"));
        assert!(html.contains("[[y]]"));
    }
}
