//! Note loading and metadata normalization.
//!
//! The authoring tool embeds metadata inconsistently: some notes carry a
//! fenced YAML front-matter block, some echo their own filename as a first
//! line, some put `date:`/`title:` lines at the top of the body, and some
//! carry a date in the filename itself. This module resolves one canonical
//! `{title, date, tags, body}` record out of that mess. Nothing here fails:
//! every field has a terminal fallback.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

/// Canonical per-note record after metadata resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteMeta {
    pub title: String,
    /// Always `YYYY-MM-DD`.
    pub date: String,
    pub tags: Vec<String>,
    /// Body text with any consumed metadata lines removed.
    pub body: String,
}

/// Split front-matter and body from markdown content.
pub fn split_frontmatter_body(content: &str) -> (Option<String>, String) {
    if content.starts_with("---") {
        if let Some(end_idx) = content[3..].find("\n---") {
            let frontmatter = content[3..end_idx + 3].trim().to_string();
            let body_start = end_idx + 3 + 4;
            let body = if body_start < content.len() {
                content[body_start..].trim_start_matches('\n').to_string()
            } else {
                String::new()
            };
            return (Some(frontmatter), body);
        }
    }
    (None, content.to_string())
}

/// Parse YAML front-matter into a loose key/value map.
pub fn parse_frontmatter(raw: &str) -> HashMap<String, serde_yaml::Value> {
    serde_yaml::from_str(raw).unwrap_or_default()
}

pub fn frontmatter_title(frontmatter: &HashMap<String, serde_yaml::Value>) -> Option<String> {
    frontmatter
        .get("title")
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Front-matter date, normalized to `YYYY-MM-DD`. A malformed value falls
/// through to the next priority level by returning `None`.
pub fn frontmatter_date(frontmatter: &HashMap<String, serde_yaml::Value>) -> Option<String> {
    frontmatter
        .get("date")
        .and_then(|v| v.as_str())
        .and_then(normalize_date_value)
}

/// Front-matter tags. Handles both a YAML sequence and a single scalar tag.
pub fn frontmatter_tags(frontmatter: &HashMap<String, serde_yaml::Value>) -> Vec<String> {
    match frontmatter.get("tags") {
        Some(value) => {
            if let Some(seq) = value.as_sequence() {
                seq.iter()
                    .filter_map(|v| v.as_str().map(|s| s.to_string()))
                    .collect()
            } else if let Some(s) = value.as_str() {
                vec![s.to_string()]
            } else {
                Vec::new()
            }
        }
        None => Vec::new(),
    }
}

/// Normalize an ad hoc date value by splitting on `.`, `-` or `/` and
/// zero-padding. `2025.7.5` and `2025/07/05` both become `2025-07-05`.
pub fn normalize_date_value(value: &str) -> Option<String> {
    let parts: Vec<&str> = value
        .trim()
        .split(|c| c == '.' || c == '-' || c == '/')
        .collect();
    if parts.len() != 3 {
        return None;
    }
    let year: u32 = parts[0].parse().ok()?;
    let month: u32 = parts[1].parse().ok()?;
    let day: u32 = parts[2].parse().ok()?;
    if parts[0].len() != 4 || !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }
    Some(format!("{:04}-{:02}-{:02}", year, month, day))
}

static FILENAME_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})[.\-/](\d{1,2})[.\-/](\d{1,2})").unwrap());
static FILENAME_COMPACT_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})(\d{2})(\d{2})").unwrap());

/// Pull a date out of the filename itself: `2025.12.05.md`, `2025-12-05 x.md`
/// or a compact leading `20251205`.
pub fn date_from_filename(filename: &str) -> Option<String> {
    let caps = FILENAME_DATE_RE
        .captures(filename)
        .or_else(|| FILENAME_COMPACT_DATE_RE.captures(filename))?;
    normalize_date_value(&format!("{}-{}-{}", &caps[1], &caps[2], &caps[3]))
}

/// Filename with its extension stripped.
pub fn file_stem(filename: &str) -> &str {
    match filename.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => filename,
    }
}

/// Inline metadata pulled out of a body without front-matter.
#[derive(Debug, Default, Clone)]
pub struct InlineMeta {
    pub title: Option<String>,
    pub date: Option<String>,
    /// Body with the echo line and consumed metadata lines removed.
    pub body: String,
}

/// Drop the filename-echo first line if present, then consume up to two
/// leading `date:`/`title:` lines (case-sensitive keys). Scanning stops at
/// the first line that matches neither.
pub fn strip_inline_meta(filename: &str, content: &str) -> InlineMeta {
    let lines: Vec<&str> = content
        .split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .collect();
    let mut idx = 0;

    // The authoring tool echoes the filename as a visual first line.
    if lines.get(idx).map(|l| l.trim()) == Some(file_stem(filename)) {
        idx += 1;
    }

    let mut meta = InlineMeta::default();
    for _ in 0..2 {
        let Some(line) = lines.get(idx) else { break };
        if let Some(value) = line.strip_prefix("date:") {
            if meta.date.is_none() {
                meta.date = Some(value.trim().to_string());
            }
            idx += 1;
        } else if let Some(value) = line.strip_prefix("title:") {
            if meta.title.is_none() {
                meta.title = Some(value.trim().to_string());
            }
            idx += 1;
        } else {
            break;
        }
    }

    meta.body = lines[idx..].join("\n");
    meta
}

/// Resolve one raw file into its canonical note record.
///
/// Priority chains, independently per field:
/// - title: front-matter > inline `title:` > filename stem
/// - date:  front-matter > inline `date:` > filename pattern > `modified_at`
/// - tags:  front-matter > empty
pub fn normalize(filename: &str, content: &str, modified_at: &DateTime<Utc>) -> NoteMeta {
    let (fm_raw, fm_body) = split_frontmatter_body(content);

    let (fm_title, fm_date, fm_tags, inline, body) = match fm_raw {
        Some(raw) => {
            let fm = parse_frontmatter(&raw);
            (
                frontmatter_title(&fm),
                frontmatter_date(&fm),
                frontmatter_tags(&fm),
                InlineMeta::default(),
                fm_body,
            )
        }
        None => {
            let inline = strip_inline_meta(filename, content);
            let body = inline.body.clone();
            (None, None, Vec::new(), inline, body)
        }
    };

    let title = fm_title
        .or(inline.title)
        .unwrap_or_else(|| file_stem(filename).to_string());

    let date = fm_date
        .or_else(|| inline.date.as_deref().and_then(normalize_date_value))
        .or_else(|| date_from_filename(filename))
        .unwrap_or_else(|| modified_at.format("%Y-%m-%d").to_string());

    NoteMeta {
        title,
        date,
        tags: fm_tags,
        body,
    }
}
