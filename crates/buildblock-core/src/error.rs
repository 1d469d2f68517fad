//! Error types for loading blocker configuration and snapshots.
//!
//! The decision engine itself is total: it never returns these. They only
//! surface at the edges where specs and snapshots are read from disk.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BlockerError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid blocking spec: {0}")]
    InvalidSpec(String),
}

/// Result type for blocker configuration operations
pub type Result<T> = std::result::Result<T, BlockerError>;

/// Read a file to a string, tagging I/O failures with the path.
pub(crate) fn read_to_string(path: &std::path::Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| BlockerError::Io {
        path: path.to_path_buf(),
        source,
    })
}
