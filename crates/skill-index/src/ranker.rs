//! Similarity ranker: embed query text, rank against a skill index.

use std::sync::Arc;

use tracing::debug;

use skill_embeddings::EmbeddingModel;
use skill_types::Prediction;

use crate::error::IndexError;
use crate::index::SkillIndex;
use crate::similarity::rank;

/// Ranks free text against a skill index using a shared embedder.
///
/// Holds the embedder by `Arc`; the model is loaded once and reused for
/// every call. The index is borrowed per call so callers decide its lifetime.
#[derive(Clone)]
pub struct SkillRanker {
    embedder: Arc<dyn EmbeddingModel>,
}

impl SkillRanker {
    pub fn new(embedder: Arc<dyn EmbeddingModel>) -> Self {
        Self { embedder }
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingModel> {
        &self.embedder
    }

    /// Fail when the index was built with a model of a different dimension.
    pub fn check_compatible(&self, index: &SkillIndex) -> Result<(), IndexError> {
        match index.dimension() {
            Some(dim) if dim != self.embedder.dimension() => Err(IndexError::DimensionMismatch {
                expected: dim,
                actual: self.embedder.dimension(),
            }),
            _ => Ok(()),
        }
    }

    /// Top-`k` skills for `text`, best first.
    pub fn rank_text(
        &self,
        text: &str,
        index: &SkillIndex,
        k: usize,
    ) -> Result<Vec<Prediction>, IndexError> {
        self.check_compatible(index)?;
        let query = self.embedder.embed(text)?;
        let predictions = rank(query.as_slice(), index, k)?;
        debug!(
            candidates = index.len(),
            returned = predictions.len(),
            "Ranked query against skill index"
        );
        Ok(predictions)
    }
}
