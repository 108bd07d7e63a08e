use thiserror::Error;

/// Errors surfaced by the garden subsystem.
///
/// Per-note metadata problems are never errors (every field has a terminal
/// fallback), so this only covers corpus transport, the search index, and
/// the artifact encoding.
#[derive(Debug, Error)]
pub enum GardenError {
    /// The content store could not deliver the corpus. Propagated, never
    /// swallowed: an empty graph must be distinguishable from a failed scan.
    #[error("content store error: {0}")]
    Store(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("search index error: {0}")]
    Index(#[from] tantivy::TantivyError),

    #[error("search artifact error: {0}")]
    Artifact(#[from] serde_json::Error),
}
