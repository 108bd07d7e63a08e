//! Markdown rendering with garden link rewriting.
//!
//! Wiki links and plain bracket links are rewritten to anchors before the
//! markdown pass: a target whose slug has a real backing note becomes a live
//! `/garden/{slug}` link, anything else becomes a visually distinct broken
//! link with no href. Standard markdown links and images are untouched, and
//! raw HTML in the source passes through unescaped; sanitization, when
//! wanted, belongs to the rendering page.

use std::collections::HashSet;

use pulldown_cmark::{html, Options, Parser};

use crate::graph::links::{scan_links, LinkKind};
use crate::slug::title_to_slug;

/// Excerpts are clipped to this many characters.
const EXCERPT_LEN: usize = 80;

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Rewrite wiki and bracket links into anchors, leaving every other byte of
/// the body as-is. Allocates a new string; the input is never mutated.
fn rewrite_links(body: &str, known_slugs: &HashSet<String>) -> String {
    let mut out = String::with_capacity(body.len() + body.len() / 4);
    let mut last = 0;

    for link in scan_links(body) {
        if link.kind == LinkKind::Hashtag {
            continue;
        }
        out.push_str(&body[last..link.start]);
        let slug = title_to_slug(&link.target);
        let display = escape_html(&link.display);
        if known_slugs.contains(&slug) {
            out.push_str(&format!("<a href=\"/garden/{}\">{}</a>", slug, display));
        } else {
            out.push_str(&format!("<span class=\"broken-link\">{}</span>", display));
        }
        last = link.end;
    }

    out.push_str(&body[last..]);
    out
}

/// Render a note body to HTML. `known_slugs` is the set of slugs with real
/// backing notes; link targets outside it render as broken links.
pub fn render_markdown(body: &str, known_slugs: &HashSet<String>) -> String {
    let rewritten = rewrite_links(body, known_slugs);
    let parser = Parser::new_ext(&rewritten, Options::empty());
    let mut out = String::with_capacity(rewritten.len() * 2);
    html::push_html(&mut out, parser);
    out
}

/// Strip link punctuation and hashtag markers, collapsing the body to one
/// line of plain text. Shared by excerpts, the search artifact body and
/// snippet generation.
pub fn to_plain_text(body: &str) -> String {
    let mut stripped = String::with_capacity(body.len());
    let mut last = 0;
    for link in scan_links(body) {
        stripped.push_str(&body[last..link.start]);
        stripped.push_str(&link.display);
        last = link.end;
    }
    stripped.push_str(&body[last..]);

    let mut out = String::with_capacity(stripped.len());
    let mut prev_space = false;
    for ch in stripped.chars() {
        if ch == '\n' || ch == '\r' || ch == ' ' || ch == '\t' {
            if !prev_space {
                out.push(' ');
                prev_space = true;
            }
        } else {
            out.push(ch);
            prev_space = false;
        }
    }
    out.trim().to_string()
}

/// Plain-text excerpt, clipped to 80 characters with an ellipsis marker.
pub fn make_excerpt(body: &str) -> String {
    let plain = to_plain_text(body);
    let mut chars = plain.chars();
    let clipped: String = chars.by_ref().take(EXCERPT_LEN).collect();
    if chars.next().is_some() {
        format!("{}…", clipped.trim_end())
    } else {
        clipped
    }
}
