//! Named query blocks embedded in document bodies.
//!
//! A block receives the text accumulated inside its fence and the tokens of
//! its info string (the block name first). The built-in blocks read their
//! search parameters from `key=value` tokens after the name, followed by
//! `key = value` lines of the accumulated text.

use crate::html::{diagnostic, escape_attr, escape_text};
use crate::markup::MarkupProcessor;
use crate::models::Document;
use crate::resolver::{Mode, Target};
use crate::search::{is_truthy, Query};
use crate::site::RenderContext;
use regex::Regex;
use std::collections::HashMap;
use std::fmt::Write;
use std::sync::{Arc, OnceLock};

/// Marker splitting a blog entry into its teaser and the rest
pub const BREAK_MARKER: &str = "<!-- break -->";

/// Renders a block to HTML
pub trait Block: Send + Sync {
    fn render(&self, acc: &str, tokens: &[&str], ctx: &RenderContext<'_>) -> String;
}

impl<F> Block for F
where
    F: Fn(&str, &[&str], &RenderContext<'_>) -> String + Send + Sync,
{
    fn render(&self, acc: &str, tokens: &[&str], ctx: &RenderContext<'_>) -> String {
        self(acc, tokens, ctx)
    }
}

/// Registry mapping block names to handlers
#[derive(Default)]
pub struct BlockRegistry {
    blocks: HashMap<String, Arc<dyn Block>>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("blog", BlogBlock);
        registry.register("doclist", DocListBlock);
        registry.register("doclist_table", DocListTableBlock);
        registry.register("include", IncludeBlock);
        registry.register("break", BreakBlock);
        registry.register("lyrics", LyricsBlock);
        registry.register("orgtbl", OrgTableBlock);
        registry.register("soundcloud_player", SoundCloudPlayerBlock);
        registry
    }

    /// Register (or replace) a block.
    pub fn register<B: Block + 'static>(&mut self, name: impl Into<String>, block: B) {
        self.blocks.insert(name.into(), Arc::new(block));
    }

    pub fn get(&self, name: &str) -> Option<&dyn Block> {
        self.blocks.get(name).map(|b| b.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.blocks.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.blocks.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Search parameters of a block: info-string tokens, then body lines.
pub fn block_query(acc: &str, tokens: &[&str]) -> Query {
    let mut query = Query::from_tokens(tokens.get(1..).unwrap_or_default());
    query.extend(Query::from_lines(acc));
    query
}

/// Full bodies of the matching documents laid out as a blog
///
/// Each entry shows the part of its body before the break marker with `h1`
/// demoted to `h2`, a "read the rest" link when the entry continues, and a
/// footer with date, author and permalink.
pub struct BlogBlock;

impl Block for BlogBlock {
    fn render(&self, acc: &str, tokens: &[&str], ctx: &RenderContext<'_>) -> String {
        if !ctx.can_descend() {
            return diagnostic("blog: nesting too deep");
        }

        let site = ctx.site;
        let labels = &site.config().blog;
        let base = site.config().normalized_base_url();
        let mut out = String::new();

        for entry in site.search(&block_query(acc, tokens)) {
            let doc = match site.resolve_at(
                Target::File(&entry.filename),
                Mode::Full,
                ctx.child_depth(),
            ) {
                Ok(doc) => doc,
                Err(err) => {
                    tracing::warn!("Skipping blog entry {}: {}", entry.name, err);
                    continue;
                }
            };

            let (teaser, rest) = split_at_break(&doc.body);
            out.push_str(&demote_headings(teaser));

            let open = format!(
                "<a href=\"{base}{}\" title=\"{}\">",
                entry.name,
                escape_attr(entry.tooltip())
            );
            if !rest.trim().is_empty() {
                let _ = writeln!(
                    out,
                    "<p class=\"blog_break\">{open}{}</a></p>",
                    escape_text(&labels.read_more)
                );
            }

            let mut byline = entry.display.timestamp_date_format.clone();
            if let Some(author) = doc.meta.author.as_deref().filter(|a| !a.is_empty()) {
                let _ = write!(byline, " {} {}", escape_text(&labels.by), escape_text(author));
            }
            let _ = writeln!(
                out,
                "<p class=\"blog_footer\"><i>{}</i> [{open}{}</a>]</p>",
                byline.trim(),
                escape_text(&labels.permalink)
            );
        }

        out
    }
}

/// Bulleted list of the matching documents
pub struct DocListBlock;

impl Block for DocListBlock {
    fn render(&self, acc: &str, tokens: &[&str], ctx: &RenderContext<'_>) -> String {
        let mut out = String::from("<ul>\n");
        for doc in ctx.site.search(&block_query(acc, tokens)) {
            let _ = writeln!(
                out,
                "<li><b>{}</b> ({} | {})</li>",
                doc.display.title_link, doc.display.mtime_format, doc.display.timestamp_format
            );
        }
        out.push_str("</ul>\n");
        out
    }
}

/// Table of the matching documents
///
/// `fields`, `headers` and `widths` are comma-separated lists. Headers
/// default to the field names; `*_link` fields are emitted as HTML, the rest
/// escaped.
pub struct DocListTableBlock;

impl Block for DocListTableBlock {
    fn render(&self, acc: &str, tokens: &[&str], ctx: &RenderContext<'_>) -> String {
        let query = block_query(acc, tokens);
        let fields = split_list(query.get("fields").unwrap_or("title_link"));
        let headers = match query.get("headers") {
            Some(headers) => split_list(headers),
            None => fields.clone(),
        };
        let widths = split_list(query.get("widths").unwrap_or(""));

        let mut out = String::from("<table>\n\t<tr>\n");
        for (i, header) in headers.iter().enumerate() {
            let width = widths
                .get(i)
                .map(|w| format!(" width=\"{}\"", escape_attr(w)))
                .unwrap_or_default();
            let _ = writeln!(out, "\t\t<th{width}>{}</th>", escape_text(header));
        }
        out.push_str("\t</tr>\n");

        for doc in ctx.site.search(&query) {
            out.push_str("\t<tr>\n");
            for field in &fields {
                let _ = writeln!(out, "\t\t<td>{}</td>", cell(&doc, field));
            }
            out.push_str("\t</tr>\n");
        }

        out.push_str("</table>\n");
        out
    }
}

fn cell(doc: &Document, field: &str) -> String {
    let value = doc.field(field).unwrap_or_default();
    if field.ends_with("_link") {
        value
    } else {
        escape_text(&value)
    }
}

/// Rendered bodies of the documents named after the block name
pub struct IncludeBlock;

impl Block for IncludeBlock {
    fn render(&self, _acc: &str, tokens: &[&str], ctx: &RenderContext<'_>) -> String {
        if !ctx.can_descend() {
            return diagnostic("include: nesting too deep");
        }

        let mut out = String::new();
        for name in tokens.iter().skip(1) {
            match ctx
                .site
                .resolve_at(Target::Name(*name), Mode::Full, ctx.child_depth())
            {
                Ok(doc) if doc.body.is_empty() => {}
                Ok(doc) => {
                    out.push_str(&doc.body);
                    out.push('\n');
                }
                Err(err) => out.push_str(&diagnostic(&format!("include {name}: {err}"))),
            }
        }
        out
    }
}

/// The blog break marker itself
pub struct BreakBlock;

impl Block for BreakBlock {
    fn render(&self, _acc: &str, _tokens: &[&str], _ctx: &RenderContext<'_>) -> String {
        format!("{BREAK_MARKER}\n")
    }
}

/// Verse text with its line breaks kept
pub struct LyricsBlock;

impl Block for LyricsBlock {
    fn render(&self, acc: &str, _tokens: &[&str], _ctx: &RenderContext<'_>) -> String {
        let lines: Vec<String> = acc
            .trim_end_matches('\n')
            .lines()
            .map(escape_text)
            .collect();
        format!("<div class=\"lyrics\">{}</div>\n", lines.join("<br>\n"))
    }
}

/// Org-mode table
///
/// ````text
/// ```orgtbl widths=30%,70%
/// | Name | Role |
/// |------+------|
/// | Ana  | a \vert b |
/// ```
/// ````
///
/// The first row is the header; `widths` sizes its columns. `\vert` stands
/// for a literal `|`. Rule lines (`|-...`) are dropped, unless `rowspan` is
/// set: then the rows between two rules merge into one row whose cells are
/// rendered as markup.
pub struct OrgTableBlock;

impl Block for OrgTableBlock {
    fn render(&self, acc: &str, tokens: &[&str], ctx: &RenderContext<'_>) -> String {
        let settings = Query::from_tokens(tokens.get(1..).unwrap_or_default());
        let widths = split_list(settings.get("widths").unwrap_or(""));
        let rowspan = settings.get("rowspan").is_some_and(is_truthy);

        let rows: Vec<Vec<String>> = if rowspan {
            if !ctx.can_descend() {
                return diagnostic("orgtbl: nesting too deep");
            }
            merged_rows(acc, ctx)
        } else {
            acc.lines()
                .filter(|line| !is_rule(line))
                .filter_map(org_cells)
                .map(|cells| {
                    cells
                        .iter()
                        .map(|cell| escape_text(&unvert(cell.trim())))
                        .collect()
                })
                .collect()
        };

        let mut out = String::from("<table><tbody>\n");
        for (i, row) in rows.iter().enumerate() {
            out.push_str("\t<tr>\n");
            for (col, cell) in row.iter().enumerate() {
                if i == 0 {
                    let width = widths
                        .get(col)
                        .map(|w| format!(" width=\"{}\"", escape_attr(w)))
                        .unwrap_or_default();
                    let _ = writeln!(out, "\t\t<th{width}>{cell}</th>");
                } else {
                    let _ = writeln!(out, "\t\t<td>{cell}</td>");
                }
            }
            out.push_str("\t</tr>\n");
        }
        out.push_str("</tbody></table>\n");
        out
    }
}

fn is_rule(line: &str) -> bool {
    line.trim_start().starts_with("|-")
}

fn unvert(cell: &str) -> String {
    cell.replace("\\vert", "|")
}

/// Cells between the outer pipes of a table line.
fn org_cells(line: &str) -> Option<Vec<&str>> {
    let inner = line.trim().strip_prefix('|')?;
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    Some(inner.split('|').collect())
}

fn merged_rows(acc: &str, ctx: &RenderContext<'_>) -> Vec<Vec<String>> {
    let processor = MarkupProcessor::new();
    let child = RenderContext {
        site: ctx.site,
        depth: ctx.child_depth(),
    };

    let mut rows = Vec::new();
    let mut group: Vec<Vec<&str>> = Vec::new();
    for line in acc.lines() {
        if !is_rule(line) {
            group.extend(org_cells(line));
            continue;
        }
        if group.is_empty() {
            continue;
        }

        let columns = group.iter().map(Vec::len).max().unwrap_or(0);
        let row: Vec<String> = (0..columns)
            .map(|col| {
                let text: String = group
                    .iter()
                    .filter_map(|cells| cells.get(col))
                    .map(|cell| format!("{}\n", unvert(cell.trim())))
                    .collect();
                processor.render(&text, &child)
            })
            .collect();
        rows.push(row);
        group.clear();
    }
    rows
}

/// Embedded SoundCloud player
///
/// Parameters: `playlist` (a playlist id, builds `src`), `src`, `class`,
/// `width`, `height` and `style`. Empty ones fall back to defaults.
pub struct SoundCloudPlayerBlock;

const PLAYER_DEFAULTS: &[(&str, &str)] = &[
    ("width", "100%"),
    ("height", "450"),
    ("style", "float:right;width:45%"),
];

impl Block for SoundCloudPlayerBlock {
    fn render(&self, acc: &str, tokens: &[&str], _ctx: &RenderContext<'_>) -> String {
        let query = block_query(acc, tokens);
        let param = |key: &str| {
            let value = query.get(key).map(str::trim).unwrap_or("");
            let value = match value {
                "" => PLAYER_DEFAULTS
                    .iter()
                    .find(|(k, _)| *k == key)
                    .map_or("", |(_, v)| *v),
                value => value,
            };
            escape_attr(value)
        };

        let playlist = param("playlist");
        let src = if playlist.is_empty() {
            param("src")
        } else {
            format!(
                "https://w.soundcloud.com/player/?url=https%3A//api.soundcloud.com/playlists/{playlist}\
                 &amp;auto_play=false&amp;hide_related=false&amp;show_comments=true\
                 &amp;show_user=true&amp;show_reposts=false&amp;visual=false"
            )
        };
        let class = format!("soundcloud_player {}", param("class"));

        format!(
            "<iframe class=\"{}\" width=\"{}\" height=\"{}\" scrolling=\"no\" frameborder=\"no\" src=\"{}\" style=\"{}\"></iframe>\n",
            class.trim_end(),
            param("width"),
            param("height"),
            src,
            param("style")
        )
    }
}

/// Split a body at its first break marker.
pub fn split_at_break(body: &str) -> (&str, &str) {
    match body.find(BREAK_MARKER) {
        Some(pos) => (&body[..pos], &body[pos + BREAK_MARKER.len()..]),
        None => (body, ""),
    }
}

/// Rewrite `h1` tags as `h2`.
pub fn demote_headings(html: &str) -> String {
    static H1: OnceLock<Regex> = OnceLock::new();
    let re = H1.get_or_init(|| Regex::new(r"<(/?)h1([\s>])").expect("valid heading regex"));
    re.replace_all(html, "<${1}h2${2}").into_owned()
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
