//! Content store contract and the filesystem-backed implementation.
//!
//! The graph and render layers never touch the filesystem directly; they go
//! through [`NoteStore`] so the corpus can come from any collaborator. The
//! per-render-cycle fetch is memoized by [`RenderCycleCache`], which is an
//! explicit object owned by one render cycle, never a process-wide global.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use walkdir::{DirEntry, WalkDir};

use crate::error::GardenError;

/// One raw note as delivered by the content store.
#[derive(Debug, Clone)]
pub struct RawNote {
    /// Store-relative path, forward slashes.
    pub path: String,
    /// Bare filename including extension.
    pub filename: String,
    /// Full file text, possibly containing embedded metadata lines.
    pub content: String,
    /// External modification time, used only as a date fallback.
    pub modified_at: DateTime<Utc>,
}

/// The complete-corpus fetch the core depends on.
///
/// Transport failures must surface as `Err`; retry/backoff is the
/// collaborator's concern, not this crate's.
pub trait NoteStore {
    fn fetch_all_notes(&self) -> Result<Vec<RawNote>, GardenError>;
}

/// Directory names that hold templates or meta files, never notes.
pub const DEFAULT_EXCLUDED_DIRS: &[&str] = &["templates", "_meta"];

/// Filesystem note store rooted at a single directory of `.md` files.
pub struct FsNoteStore {
    root: PathBuf,
    excluded_dirs: Vec<String>,
}

impl FsNoteStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            excluded_dirs: DEFAULT_EXCLUDED_DIRS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn with_excluded_dirs(mut self, dirs: Vec<String>) -> Self {
        self.excluded_dirs = dirs;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn keep_entry(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 {
            return true;
        }
        let name = entry.file_name().to_string_lossy();
        if name.starts_with('.') {
            return false;
        }
        if entry.file_type().is_dir() && self.excluded_dirs.iter().any(|d| d == name.as_ref()) {
            return false;
        }
        true
    }
}

/// Collect every markdown file under `root`, honoring the entry filter.
pub(crate) fn collect_md_files<F>(root: &Path, keep: F) -> Result<Vec<PathBuf>, GardenError>
where
    F: Fn(&DirEntry) -> bool,
{
    let mut paths = Vec::new();
    for entry in WalkDir::new(root).into_iter().filter_entry(&keep) {
        let entry = entry.map_err(|e| GardenError::Store(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().map(|e| e == "md").unwrap_or(false) {
            paths.push(entry.path().to_path_buf());
        }
    }
    paths.sort();
    Ok(paths)
}

impl NoteStore for FsNoteStore {
    fn fetch_all_notes(&self) -> Result<Vec<RawNote>, GardenError> {
        if !self.root.is_dir() {
            return Err(GardenError::Store(format!(
                "note corpus directory not found: {}",
                self.root.display()
            )));
        }

        let paths = collect_md_files(&self.root, |e| self.keep_entry(e))?;
        log::debug!("[FsNoteStore] fetching {} notes from {:?}", paths.len(), self.root);

        let mut notes = Vec::with_capacity(paths.len());
        for path in paths {
            let content = fs::read_to_string(&path)?;
            let modified_at = fs::metadata(&path)?
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            let rel = path
                .strip_prefix(&self.root)
                .unwrap_or(&path)
                .to_string_lossy()
                .replace('\\', "/");
            notes.push(RawNote {
                path: rel,
                filename,
                content,
                modified_at,
            });
        }
        Ok(notes)
    }
}

/// Request-scoped memoization of the corpus fetch.
///
/// Concurrent graph queries inside one page-generation pass must observe
/// exactly one underlying fetch. Construct one cache per render cycle and
/// pass it through; the corpus is read-only within a cycle so no further
/// locking is needed.
#[derive(Default)]
pub struct RenderCycleCache {
    notes: OnceCell<Vec<RawNote>>,
}

impl RenderCycleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the corpus through `store`, at most once for this cache's
    /// lifetime. A failed fetch is not cached so a later query may retry
    /// within the same cycle.
    pub fn notes(&self, store: &dyn NoteStore) -> Result<&[RawNote], GardenError> {
        self.notes
            .get_or_try_init(|| store.fetch_all_notes())
            .map(|v| v.as_slice())
    }
}
