//! Wikilink transformation for [[target]] and [[target|text]] syntax.

use crate::html::{escape_attr, escape_text};
use crate::name::{clean_accents, is_canonical};
use crate::resolver::{Mode, ResolveError, Target};
use crate::site::RenderContext;
use pulldown_cmark::{CowStr, Event, Tag, TagEnd};

/// Turns a wikilink into inline HTML
pub trait LinkResolver {
    /// `text` is the part after `|`, if any.
    fn resolve_link(&self, target: &str, text: Option<&str>) -> String;
}

/// Resolves wikilinks against the documents of a site
///
/// Without explicit text the target is shown as written and the href is its
/// lowercased, accent-folded form with spaces turned into `_`. Canonical
/// hrefs link to the document (or a `notfound` span when it is missing);
/// anything else is treated as an external link.
pub struct SiteLinks<'a> {
    ctx: RenderContext<'a>,
}

impl<'a> SiteLinks<'a> {
    pub fn new(ctx: &RenderContext<'a>) -> Self {
        Self { ctx: *ctx }
    }
}

impl LinkResolver for SiteLinks<'_> {
    fn resolve_link(&self, target: &str, text: Option<&str>) -> String {
        let target = target.trim();
        let (href, label) = match text {
            Some(text) => (target.to_string(), text),
            None => (clean_accents(&target.to_lowercase()).replace(' ', "_"), target),
        };
        let label = escape_text(label);

        if !is_canonical(&href) {
            return format!(
                "<a href=\"{}\" rel=\"nofollow\">{label}</a>",
                escape_attr(&href)
            );
        }

        let site = self.ctx.site;
        match site.resolve_at(Target::Name(&href), Mode::MetadataOnly, self.ctx.depth) {
            Ok(doc) => {
                let base = site.config().normalized_base_url();
                let title = doc
                    .meta
                    .description
                    .as_deref()
                    .filter(|d| !d.is_empty())
                    .map(|d| format!(" title=\"{}\"", escape_attr(d)))
                    .unwrap_or_default();
                format!("<a href=\"{base}{href}\"{title}>{label}</a>")
            }
            Err(err) => {
                if !matches!(err, ResolveError::NotFound(_)) {
                    tracing::warn!("Link target {} unavailable: {}", href, err);
                }
                format!("<span class=\"notfound\" data-href=\"{href}\">{label}</span>")
            }
        }
    }
}

/// Transformer replacing wikilinks in text with resolver output
pub struct LinkTransformer<'r, R: LinkResolver> {
    resolver: &'r R,
}

impl<'r, R: LinkResolver> LinkTransformer<'r, R> {
    pub fn new(resolver: &'r R) -> Self {
        Self { resolver }
    }

    /// Transform events, converting [[wikilinks]] to inline HTML.
    ///
    /// Code blocks and inline code are left alone.
    pub fn transform<'e>(&self, events: Vec<Event<'e>>) -> Vec<Event<'e>> {
        let mut result = Vec::with_capacity(events.len());
        let mut events = events.into_iter().peekable();
        let mut in_code_block = false;

        while let Some(event) = events.next() {
            match event {
                Event::Start(Tag::CodeBlock(_)) => {
                    in_code_block = true;
                    result.push(event);
                }
                Event::End(TagEnd::CodeBlock) => {
                    in_code_block = false;
                    result.push(event);
                }
                Event::Text(text) if !in_code_block => {
                    // The parser splits text at brackets, so merge runs first
                    let mut merged = text.to_string();
                    while let Some(Event::Text(next)) = events.peek() {
                        merged.push_str(next);
                        events.next();
                    }

                    if merged.contains("[[") && merged.contains("]]") {
                        result.extend(self.process_wikilinks(&merged));
                    } else {
                        result.push(Event::Text(CowStr::Boxed(merged.into_boxed_str())));
                    }
                }
                other => result.push(other),
            }
        }

        result
    }

    fn process_wikilinks<'e>(&self, text: &str) -> Vec<Event<'e>> {
        let mut events = Vec::new();
        let mut remaining = text;

        while let Some(start) = remaining.find("[[") {
            let Some(end) = remaining[start..].find("]]") else {
                break;
            };

            if start > 0 {
                events.push(text_event(&remaining[..start]));
            }

            let wikilink = &remaining[start + 2..start + end];
            let html = match wikilink.split_once('|') {
                Some((target, display)) => self.resolver.resolve_link(target, Some(display.trim())),
                None => self.resolver.resolve_link(wikilink, None),
            };
            events.push(Event::InlineHtml(CowStr::Boxed(html.into_boxed_str())));

            remaining = &remaining[start + end + 2..];
        }

        if !remaining.is_empty() {
            events.push(text_event(remaining));
        }

        events
    }
}

fn text_event<'e>(text: &str) -> Event<'e> {
    Event::Text(CowStr::Boxed(text.to_string().into_boxed_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CacheBackend, Config};
    use crate::site::Site;
    use std::fs;

    struct Echo;

    impl LinkResolver for Echo {
        fn resolve_link(&self, target: &str, text: Option<&str>) -> String {
            format!("<{}|{}>", target, text.unwrap_or("-"))
        }
    }

    fn inline_html(events: &[Event<'_>]) -> Vec<String> {
        events
            .iter()
            .filter_map(|e| match e {
                Event::InlineHtml(html) => Some(html.to_string()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_split_text_is_merged() {
        let events = vec![
            Event::Text(CowStr::Borrowed("See [")),
            Event::Text(CowStr::Borrowed("[page|the page]")),
            Event::Text(CowStr::Borrowed("] now")),
        ];
        let result = LinkTransformer::new(&Echo).transform(events);

        assert_eq!(inline_html(&result), vec!["<page|the page>"]);
        assert!(matches!(&result[0], Event::Text(t) if t.as_ref() == "See "));
        assert!(matches!(result.last(), Some(Event::Text(t)) if t.as_ref() == " now"));
    }

    #[test]
    fn test_multiple_and_unclosed() {
        let events = vec![Event::Text(CowStr::Borrowed("[[a]] and [[b]] and [[c"))];
        let result = LinkTransformer::new(&Echo).transform(events);

        assert_eq!(inline_html(&result), vec!["<a|->", "<b|->"]);
        assert!(matches!(result.last(), Some(Event::Text(t)) if t.as_ref() == " and [[c"));
    }

    #[test]
    fn test_code_blocks_skipped() {
        let events = vec![
            Event::Start(Tag::CodeBlock(pulldown_cmark::CodeBlockKind::Indented)),
            Event::Text(CowStr::Borrowed("[[a]]")),
            Event::End(TagEnd::CodeBlock),
        ];
        let result = LinkTransformer::new(&Echo).transform(events);
        assert!(inline_html(&result).is_empty());
    }

    #[test]
    fn test_site_links() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("cafe_noir.txt"),
            "title: Café\ndescription: Dark \"roast\"\n\nbody",
        )
        .unwrap();
        let mut config = Config::with_content_dir(dir.path());
        config.cache.backend = CacheBackend::None;
        config.base_url = "/wiki".into();
        let site = Site::new(config);
        let links = SiteLinks::new(&site.context());

        assert_eq!(
            links.resolve_link("Café Noir", None),
            "<a href=\"/wiki/cafe_noir\" title=\"Dark &quot;roast&quot;\">Café Noir</a>"
        );
        assert_eq!(
            links.resolve_link("cafe_noir", Some("coffee")),
            "<a href=\"/wiki/cafe_noir\" title=\"Dark &quot;roast&quot;\">coffee</a>"
        );
        assert_eq!(
            links.resolve_link("missing", None),
            "<span class=\"notfound\" data-href=\"missing\">missing</span>"
        );
        assert_eq!(
            links.resolve_link("https://example.com/?a=1&b=2", Some("ext")),
            "<a href=\"https://example.com/?a=1&amp;b=2\" rel=\"nofollow\">ext</a>"
        );
    }
}
