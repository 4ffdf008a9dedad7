//! Extraction setup errors.
//!
//! Per-request failures never surface here; they become a fallback result.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    /// Vocabulary could not be loaded or compiled
    #[error("Vocabulary error: {0}")]
    Vocabulary(#[from] skill_types::SkillError),

    /// Index reload failed
    #[error("Index error: {0}")]
    Index(#[from] skill_index::IndexError),
}
