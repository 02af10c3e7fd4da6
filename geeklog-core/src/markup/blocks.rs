//! Query block expansion inside markdown.
//!
//! A fenced code block whose info string starts with a registered block name
//! is replaced by that block's HTML:
//!
//! ````text
//! ```doclist tag=rust sort=timestamp reverse=1
//! not_tag = draft
//! ```
//! ````
//!
//! The info string, split on whitespace, becomes the block's tokens and the
//! fenced content its accumulated text. Other fences are left alone.

use crate::site::RenderContext;
use pulldown_cmark::{CodeBlockKind, CowStr, Event, Tag, TagEnd};

/// Transformer expanding block fences
pub struct BlockTransformer<'a> {
    ctx: RenderContext<'a>,
}

impl<'a> BlockTransformer<'a> {
    pub fn new(ctx: &RenderContext<'a>) -> Self {
        Self { ctx: *ctx }
    }

    pub fn transform<'e>(&self, events: Vec<Event<'e>>) -> Vec<Event<'e>> {
        let blocks = self.ctx.site.blocks();
        let mut result = Vec::with_capacity(events.len());
        let mut events = events.into_iter();

        while let Some(event) = events.next() {
            let info = match &event {
                Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => info.to_string(),
                _ => {
                    result.push(event);
                    continue;
                }
            };

            let tokens: Vec<&str> = info.split_whitespace().collect();
            let Some(block) = tokens.first().and_then(|name| blocks.get(name)) else {
                result.push(event);
                continue;
            };

            let mut acc = String::new();
            for inner in events.by_ref() {
                match inner {
                    Event::End(TagEnd::CodeBlock) => break,
                    Event::Text(text) => acc.push_str(&text),
                    _ => {}
                }
            }

            tracing::debug!("Expanding block {:?} at depth {}", tokens, self.ctx.depth);
            let html = block.render(&acc, &tokens, &self.ctx);
            result.push(Event::Html(CowStr::Boxed(html.into_boxed_str())));
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CacheBackend, Config};
    use crate::site::Site;

    fn site() -> Site {
        let mut config = Config::with_content_dir("/nonexistent/geeklog-content");
        config.cache.backend = CacheBackend::None;
        Site::new(config)
    }

    fn fence<'e>(info: &'e str, body: &'e str) -> Vec<Event<'e>> {
        vec![
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(CowStr::Borrowed(info)))),
            Event::Text(CowStr::Borrowed(body)),
            Event::End(TagEnd::CodeBlock),
        ]
    }

    fn echo(acc: &str, tokens: &[&str], _ctx: &RenderContext<'_>) -> String {
        format!("[{}|{}]", tokens.join(","), acc.trim())
    }

    #[test]
    fn test_registered_block_is_expanded() {
        let mut site = site();
        site.blocks_mut().register("echo", echo);

        let result = BlockTransformer::new(&site.context()).transform(fence("echo a=1 b", "x = y\n"));
        assert_eq!(result.len(), 1);
        assert!(matches!(&result[0], Event::Html(html) if html.as_ref() == "[echo,a=1,b|x = y]"));
    }

    #[test]
    fn test_unknown_fence_passes_through() {
        let site = site();
        let events = fence("rust", "fn main() {}\n");
        let result = BlockTransformer::new(&site.context()).transform(events.clone());
        assert_eq!(result, events);
    }
}
