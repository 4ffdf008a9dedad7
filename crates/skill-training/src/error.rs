//! Training error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a training run.
#[derive(Debug, Error)]
pub enum TrainingError {
    /// Corpus file missing (checked before the model is loaded)
    #[error("Corpus file not found: {}", .0.display())]
    CorpusNotFound(PathBuf),

    /// Required column absent from a CSV header
    #[error("Column '{column}' not found in {}", path.display())]
    MissingColumn { path: PathBuf, column: String },

    /// CSV read error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid training options
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// No skill survived filtering; the existing index is left in place
    #[error("No skills to index ({skipped} groups skipped); existing index left unchanged")]
    EmptyIndex { skipped: usize },

    /// Model returned a vector of unexpected length
    #[error("Dimension mismatch for '{skill}': expected {expected}, got {actual}")]
    DimensionMismatch {
        skill: String,
        expected: usize,
        actual: usize,
    },

    /// Embedding error
    #[error("Embedding error: {0}")]
    Embedding(#[from] skill_embeddings::EmbeddingError),

    /// Index error
    #[error("Index error: {0}")]
    Index(#[from] skill_index::IndexError),

    /// Vocabulary error
    #[error("Vocabulary error: {0}")]
    Vocabulary(#[from] skill_types::SkillError),
}
