//! Skill labels and predictions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Normalized skill identifier (trimmed, lower-cased).
///
/// Two labels built from "Python" and " python " compare equal, which is what
/// keeps a skill index free of duplicate rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct SkillLabel(String);

impl SkillLabel {
    /// Create a label, normalizing the raw text.
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for SkillLabel {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SkillLabel {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<SkillLabel> for String {
    fn from(value: SkillLabel) -> Self {
        value.0
    }
}

impl AsRef<str> for SkillLabel {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SkillLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A skill returned to callers.
///
/// Ranked results carry a cosine score. It is a relevance ranking, not a
/// probability, and may be negative. Vocabulary matches carry no score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub skill: SkillLabel,
    pub score: Option<f32>,
}

impl Prediction {
    pub fn scored(skill: SkillLabel, score: f32) -> Self {
        Self {
            skill,
            score: Some(score),
        }
    }

    pub fn unscored(skill: SkillLabel) -> Self {
        Self { skill, score: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_normalization() {
        assert_eq!(SkillLabel::new("  Node.js ").as_str(), "node.js");
        assert_eq!(SkillLabel::new("C++"), SkillLabel::new("c++"));
        assert!(SkillLabel::new("   ").is_empty());
    }

    #[test]
    fn test_label_deserialize_normalizes() {
        let labels: Vec<SkillLabel> = serde_json::from_str(r#"["SQL", " Go "]"#).unwrap();
        assert_eq!(labels, vec![SkillLabel::new("sql"), SkillLabel::new("go")]);
    }

    #[test]
    fn test_prediction_serialization_shape() {
        let ranked = Prediction::scored(SkillLabel::new("rust"), 0.5);
        let json = serde_json::to_value(&ranked).unwrap();
        assert_eq!(json["skill"], "rust");
        assert_eq!(json["score"], 0.5);

        let matched = Prediction::unscored(SkillLabel::new("rust"));
        let json = serde_json::to_value(&matched).unwrap();
        assert!(json["score"].is_null());
    }
}
