//! Whole-word, case-insensitive vocabulary matching.
//!
//! Each vocabulary entry is escaped as literal text and wrapped in boundary
//! groups, so "C++" and "CI/CD" match as written and "Java" never matches
//! inside "JavaScript". All entries are compiled into one `RegexSet` and the
//! text is scanned once.

use regex::{RegexSet, RegexSetBuilder};

use crate::error::SkillError;
use crate::skill::SkillLabel;
use crate::vocabulary::Vocabulary;

const SET_SIZE_LIMIT: usize = 1 << 27;

/// Boundary-anchored pattern for one vocabulary entry.
///
/// `\b` cannot anchor entries that start or end with a non-word character
/// ("C++", ".NET"), so the boundary is start/end of text or any non-word char.
pub fn boundary_pattern(entry: &str) -> String {
    format!(r"(?:^|[^\w]){}(?:$|[^\w])", regex::escape(entry.trim()))
}

/// Compiled matcher over a vocabulary.
#[derive(Debug, Clone)]
pub struct VocabularyMatcher {
    labels: Vec<SkillLabel>,
    set: RegexSet,
}

impl VocabularyMatcher {
    pub fn new(vocabulary: &Vocabulary) -> Result<Self, SkillError> {
        let patterns: Vec<String> = vocabulary
            .entries()
            .iter()
            .map(|e| boundary_pattern(e))
            .collect();
        let set = RegexSetBuilder::new(&patterns)
            .case_insensitive(true)
            .size_limit(SET_SIZE_LIMIT)
            .dfa_size_limit(SET_SIZE_LIMIT)
            .build()
            .map_err(|e| SkillError::InvalidInput(format!("vocabulary pattern: {}", e)))?;

        Ok(Self {
            labels: vocabulary.labels().collect(),
            set,
        })
    }

    /// Labels whose entry occurs in `text`, in vocabulary order.
    pub fn matches(&self, text: &str) -> Vec<SkillLabel> {
        self.set
            .matches(text)
            .into_iter()
            .map(|i| self.labels[i].clone())
            .collect()
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.set.is_match(text)
    }

    pub fn labels(&self) -> &[SkillLabel] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
