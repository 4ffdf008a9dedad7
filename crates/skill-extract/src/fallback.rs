//! Vocabulary fallback matcher.

use skill_types::{Prediction, SkillLabel, Vocabulary, VocabularyMatcher};

use crate::error::ExtractError;

/// Dependency-free skill detection by whole-word vocabulary match.
///
/// Lower fidelity than ranking: results are the set of vocabulary skills
/// present in the text, unscored and in vocabulary order.
#[derive(Debug, Clone)]
pub struct FallbackMatcher {
    matcher: VocabularyMatcher,
}

impl FallbackMatcher {
    pub fn new(vocabulary: &Vocabulary) -> Result<Self, ExtractError> {
        Ok(Self {
            matcher: VocabularyMatcher::new(vocabulary)?,
        })
    }

    /// Fallback over the built-in vocabulary.
    pub fn builtin() -> Result<Self, ExtractError> {
        Self::new(&Vocabulary::builtin())
    }

    /// Skills whose vocabulary entry occurs in `text`.
    pub fn match_skills(&self, text: &str) -> Vec<SkillLabel> {
        self.matcher.matches(text)
    }

    /// Matched skills as unscored predictions.
    pub fn extract(&self, text: &str) -> Vec<Prediction> {
        self.match_skills(text)
            .into_iter()
            .map(Prediction::unscored)
            .collect()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.matcher.len()
    }
}
