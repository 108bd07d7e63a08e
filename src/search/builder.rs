//! Offline search index builder.
//!
//! Walks the note corpus, resolves metadata with the same rules as the note
//! loader, strips markup, and writes the flat document array as a JSON
//! artifact at a fixed static path. A missing source directory is not an
//! error: the builder writes an empty array so a deploy never blocks merely
//! because note content hasn't been provisioned yet.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{DateTime, Utc};
use rayon::prelude::*;

use super::SearchDoc;
use crate::error::GardenError;
use crate::frontmatter::{
    self, frontmatter_date, frontmatter_tags, frontmatter_title, normalize_date_value,
    split_frontmatter_body,
};
use crate::render::to_plain_text;
use crate::store::{collect_md_files, DEFAULT_EXCLUDED_DIRS};

/// Fixed corpus and artifact locations plus the walk exclusions. The build
/// step takes no flags; overriding fields is for tests.
pub struct IndexConfig {
    pub source_dir: PathBuf,
    pub output_path: PathBuf,
    pub excluded_dirs: Vec<String>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("content/garden"),
            output_path: PathBuf::from("public/search-index.json"),
            excluded_dirs: DEFAULT_EXCLUDED_DIRS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Last-modified date for one file according to source control, if the
/// corpus lives in a git checkout. `%cs` is already `YYYY-MM-DD`.
fn git_modified_date(source_dir: &Path, path: &Path) -> Option<String> {
    let output = Command::new("git")
        .arg("log")
        .arg("-1")
        .arg("--format=%cs")
        .arg("--")
        .arg(path)
        .current_dir(source_dir)
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let date = String::from_utf8_lossy(&output.stdout).trim().to_string();
    normalize_date_value(&date)
}

fn fs_modified_date(path: &Path) -> Option<String> {
    let modified = fs::metadata(path).ok()?.modified().ok()?;
    Some(DateTime::<Utc>::from(modified).format("%Y-%m-%d").to_string())
}

/// Parse one file into its index document.
///
/// Date priority differs from the loader's: front-matter (when parseable),
/// then an inline `date:` line, then the git last-modified date for this
/// specific file, then filesystem mtime.
fn parse_doc(source_dir: &Path, path: &Path) -> Result<SearchDoc, GardenError> {
    let content = fs::read_to_string(path)?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let (fm_raw, text) = split_frontmatter_body(&content);
    let fm = fm_raw.as_deref().map(frontmatter::parse_frontmatter).unwrap_or_default();
    // Inline metadata lines are only consulted when there is no front-matter
    // block; a fenced header is authoritative.
    let inline = if fm_raw.is_some() {
        frontmatter::InlineMeta::default()
    } else {
        frontmatter::strip_inline_meta(&filename, &text)
    };

    let title = frontmatter_title(&fm)
        .or_else(|| inline.title.clone())
        .unwrap_or_else(|| frontmatter::file_stem(&filename).to_string());

    let date = frontmatter_date(&fm)
        .or_else(|| inline.date.as_deref().and_then(normalize_date_value))
        .or_else(|| git_modified_date(source_dir, path))
        .or_else(|| fs_modified_date(path))
        .unwrap_or_else(|| Utc::now().format("%Y-%m-%d").to_string());

    Ok(SearchDoc {
        // Identity is the title, not the slug; see DESIGN.md.
        id: title.clone(),
        title,
        date,
        tags: frontmatter_tags(&fm),
        // The whole post-front-matter text is searchable, inline metadata
        // lines included.
        body: to_plain_text(&text),
    })
}

/// Walk the corpus and produce the sorted document collection.
pub fn build_index(config: &IndexConfig) -> Result<Vec<SearchDoc>, GardenError> {
    if !config.source_dir.is_dir() {
        log::warn!(
            "[IndexBuilder] source directory missing, emitting empty index: {}",
            config.source_dir.display()
        );
        return Ok(Vec::new());
    }

    let excluded = config.excluded_dirs.clone();
    let paths = collect_md_files(&config.source_dir, |entry| {
        if entry.depth() == 0 {
            return true;
        }
        let name = entry.file_name().to_string_lossy();
        if name.starts_with('.') {
            return false;
        }
        !(entry.file_type().is_dir() && excluded.iter().any(|d| d == name.as_ref()))
    })?;
    log::info!("[IndexBuilder] indexing {} files", paths.len());

    let mut docs: Vec<SearchDoc> = paths
        .par_iter()
        .filter_map(|path| match parse_doc(&config.source_dir, path) {
            Ok(doc) => Some(doc),
            Err(e) => {
                log::warn!("[IndexBuilder] skipping {:?}: {}", path, e);
                None
            }
        })
        .collect();

    // Stable sort keeps ties in walk order.
    docs.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(docs)
}

/// Build the index and write the JSON artifact. Returns the document count.
pub fn write_index(config: &IndexConfig) -> Result<usize, GardenError> {
    let docs = build_index(config)?;
    let json = serde_json::to_string(&docs)?;

    if let Some(parent) = config.output_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(&config.output_path, json)?;
    log::info!(
        "[IndexBuilder] wrote {} documents to {}",
        docs.len(),
        config.output_path.display()
    );
    Ok(docs.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config(tmp: &TempDir) -> IndexConfig {
        IndexConfig {
            source_dir: tmp.path().join("garden"),
            output_path: tmp.path().join("out").join("search-index.json"),
            excluded_dirs: vec!["templates".to_string()],
        }
    }

    #[test]
    fn test_missing_source_dir_writes_empty_array() {
        let tmp = TempDir::new().unwrap();
        let cfg = config(&tmp);
        let count = write_index(&cfg).unwrap();
        assert_eq!(count, 0);
        assert_eq!(fs::read_to_string(&cfg.output_path).unwrap(), "[]");
    }

    #[test]
    fn test_builds_sorted_docs_with_stripped_bodies() {
        let tmp = TempDir::new().unwrap();
        let cfg = config(&tmp);
        fs::create_dir_all(&cfg.source_dir).unwrap();
        fs::write(
            cfg.source_dir.join("old.md"),
            "---\ntitle: Old\ndate: 2023-01-01\n---\nbody [[Link Target]] text",
        )
        .unwrap();
        fs::write(
            cfg.source_dir.join("new.md"),
            "---\ntitle: New\ndate: 2025-06-30\ntags: [x]\n---\nnewer #tagged body",
        )
        .unwrap();

        let docs = build_index(&cfg).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].title, "New");
        assert_eq!(docs[1].title, "Old");
        assert_eq!(docs[0].id, "New");
        assert_eq!(docs[0].tags, vec!["x"]);
        assert_eq!(docs[0].body, "newer tagged body");
        assert_eq!(docs[1].body, "body Link Target text");
    }

    #[test]
    fn test_inline_date_beats_file_dates() {
        let tmp = TempDir::new().unwrap();
        let cfg = config(&tmp);
        fs::create_dir_all(&cfg.source_dir).unwrap();
        fs::write(cfg.source_dir.join("note.md"), "note\ndate:2021.2.3\ncontent").unwrap();

        let docs = build_index(&cfg).unwrap();
        assert_eq!(docs[0].date, "2021-02-03");
        assert_eq!(docs[0].title, "note");
        // Search body keeps the inline metadata lines of the raw text.
        assert!(docs[0].body.contains("date:2021.2.3"));
    }

    #[test]
    fn test_excluded_dirs_and_dotfiles_are_skipped() {
        let tmp = TempDir::new().unwrap();
        let cfg = config(&tmp);
        fs::create_dir_all(cfg.source_dir.join("templates")).unwrap();
        fs::write(cfg.source_dir.join("templates").join("t.md"), "tpl").unwrap();
        fs::write(cfg.source_dir.join(".draft.md"), "hidden").unwrap();
        fs::write(cfg.source_dir.join("real.md"), "visible").unwrap();

        let docs = build_index(&cfg).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].title, "real");
    }
}
