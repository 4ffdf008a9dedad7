//! Skill index error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading, saving or ranking against an index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Artifact file missing
    #[error("Index artifact not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Vectors of different length were compared or stored together
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// labels and embeddings are not parallel
    #[error("Index has {labels} labels but {embeddings} embeddings")]
    LengthMismatch { labels: usize, embeddings: usize },

    /// Same label stored twice
    #[error("Duplicate label in index: {0}")]
    DuplicateLabel(String),

    /// Blank label or zero-length vector
    #[error("Invalid index entry: {0}")]
    InvalidEntry(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Embedding error
    #[error("Embedding error: {0}")]
    Embedding(#[from] skill_embeddings::EmbeddingError),
}
