//! Link syntax matchers.
//!
//! Three syntaxes produce edges: `[[Target]]`/`[[Target|Display]]` wiki
//! links, plain `[Text]` bracket links, and `#hashtag`s. The matchers run in
//! that precedence order over the raw body, and every accepted match records
//! its byte span so a lower-precedence matcher never re-consumes the same
//! text (the inner bracket of a wiki link must not also be seen as a plain
//! bracket link). Code fences, indented code and inline code are consumed up
//! front and never yield links.

use once_cell::sync::Lazy;
use regex::Regex;

static WIKI_LINK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\[(.+?)\]\]").unwrap());
static BRACKET_LINK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\[\]\n]+)\]").unwrap());
static HASHTAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"#([\p{L}\p{N}_-]+)").unwrap());
static CODE_BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^```[\s\S]*?^```|^    .*$|`[^`\n]+`").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    WikiLink,
    BracketLink,
    Hashtag,
}

/// One link occurrence in a body, with its byte span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLink {
    pub kind: LinkKind,
    /// The linked page's title, as written.
    pub target: String,
    /// Text to show in place of the link; differs from `target` only for
    /// aliased wiki links.
    pub display: String,
    pub start: usize,
    pub end: usize,
}

#[derive(Default)]
struct SpanSet(Vec<(usize, usize)>);

impl SpanSet {
    fn overlaps(&self, start: usize, end: usize) -> bool {
        self.0.iter().any(|&(s, e)| start < e && end > s)
    }

    fn consume(&mut self, start: usize, end: usize) {
        self.0.push((start, end));
    }
}

/// Scan a body for every link occurrence, in source order.
pub fn scan_links(body: &str) -> Vec<RawLink> {
    let mut consumed = SpanSet::default();
    for m in CODE_BLOCK_RE.find_iter(body) {
        consumed.consume(m.start(), m.end());
    }

    let mut links = Vec::new();

    for cap in WIKI_LINK_RE.captures_iter(body) {
        let whole = cap.get(0).unwrap();
        if consumed.overlaps(whole.start(), whole.end()) {
            continue;
        }
        let inner = cap.get(1).unwrap().as_str();
        let (target, display) = match inner.split_once('|') {
            Some((t, d)) => (t.trim(), d.trim()),
            None => (inner.trim(), inner.trim()),
        };
        if target.is_empty() {
            continue;
        }
        consumed.consume(whole.start(), whole.end());
        links.push(RawLink {
            kind: LinkKind::WikiLink,
            target: target.to_string(),
            display: display.to_string(),
            start: whole.start(),
            end: whole.end(),
        });
    }

    for cap in BRACKET_LINK_RE.captures_iter(body) {
        let whole = cap.get(0).unwrap();
        if consumed.overlaps(whole.start(), whole.end()) {
            continue;
        }
        // `[text](url)` is a standard markdown link and `![alt]` starts an
        // image; both pass through untouched.
        if body[whole.end()..].starts_with('(') {
            continue;
        }
        if body[..whole.start()].ends_with('!') {
            continue;
        }
        let text = cap.get(1).unwrap().as_str().trim();
        if text.is_empty() {
            continue;
        }
        consumed.consume(whole.start(), whole.end());
        links.push(RawLink {
            kind: LinkKind::BracketLink,
            target: text.to_string(),
            display: text.to_string(),
            start: whole.start(),
            end: whole.end(),
        });
    }

    for cap in HASHTAG_RE.captures_iter(body) {
        let whole = cap.get(0).unwrap();
        if consumed.overlaps(whole.start(), whole.end()) {
            continue;
        }
        // Only at start-of-text or after whitespace; `a#b` is not a tag.
        let preceded_ok = body[..whole.start()]
            .chars()
            .next_back()
            .map(|c| c.is_whitespace())
            .unwrap_or(true);
        if !preceded_ok {
            continue;
        }
        let tag = cap.get(1).unwrap().as_str();
        consumed.consume(whole.start(), whole.end());
        links.push(RawLink {
            kind: LinkKind::Hashtag,
            target: tag.to_string(),
            display: tag.to_string(),
            start: whole.start(),
            end: whole.end(),
        });
    }

    links.sort_by_key(|l| l.start);
    links
}

#[cfg(test)]
mod tests {
    use super::*;

    fn targets(body: &str) -> Vec<(LinkKind, String)> {
        scan_links(body)
            .into_iter()
            .map(|l| (l.kind, l.target))
            .collect()
    }

    #[test]
    fn test_wiki_link_basic_and_aliased() {
        let links = scan_links("See [[Other Note]] and [[Real|shown text]].");
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].target, "Other Note");
        assert_eq!(links[0].display, "Other Note");
        assert_eq!(links[1].target, "Real");
        assert_eq!(links[1].display, "shown text");
    }

    #[test]
    fn test_wiki_link_inner_bracket_not_double_matched() {
        let links = scan_links("A [[Target]] here");
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].kind, LinkKind::WikiLink);
    }

    #[test]
    fn test_bracket_link_excludes_images_and_markdown_links() {
        let body = "See ![alt](x.png) and [Real](http://x) and [Plain Link] here";
        let links = scan_links(body);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].kind, LinkKind::BracketLink);
        assert_eq!(links[0].target, "Plain Link");
    }

    #[test]
    fn test_hashtag_needs_leading_whitespace() {
        assert_eq!(
            targets("#rust at start, mid #tag too, but not in-word#no or urls/#frag"),
            vec![
                (LinkKind::Hashtag, "rust".to_string()),
                (LinkKind::Hashtag, "tag".to_string()),
            ]
        );
    }

    #[test]
    fn test_hashtag_unicode_and_hyphen() {
        assert_eq!(
            targets("tags: #日記 #side-project #a_b"),
            vec![
                (LinkKind::Hashtag, "日記".to_string()),
                (LinkKind::Hashtag, "side-project".to_string()),
                (LinkKind::Hashtag, "a_b".to_string()),
            ]
        );
    }

    #[test]
    fn test_hashtag_inside_bracket_link_not_double_matched() {
        let links = scan_links("x [#tag] y");
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].kind, LinkKind::BracketLink);
        assert_eq!(links[0].target, "#tag");
    }

    #[test]
    fn test_code_is_skipped() {
        let body = "real [[One]]\n\n```\n[[Two]] in fence\n```\n\nand `[[Three]]` inline";
        assert_eq!(targets(body), vec![(LinkKind::WikiLink, "One".to_string())]);
    }

    #[test]
    fn test_markdown_heading_is_not_a_hashtag() {
        assert!(targets("# Heading\n\n## Another").is_empty());
    }
}
