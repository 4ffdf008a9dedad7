//! Texts grouped by skill label.

use std::collections::{HashMap, HashSet};

use skill_types::SkillLabel;

/// Skill label -> training texts, in the order labels were first seen.
///
/// Exists only during training; each group is reduced to one averaged vector.
#[derive(Debug, Clone, Default)]
pub struct SkillGroups {
    order: Vec<SkillLabel>,
    texts: HashMap<SkillLabel, Vec<String>>,
}

impl SkillGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `text` to the group for `label`, creating the group on first sight.
    pub fn push(&mut self, label: SkillLabel, text: impl Into<String>) {
        if label.is_empty() {
            return;
        }
        match self.texts.get_mut(&label) {
            Some(group) => group.push(text.into()),
            None => {
                self.order.push(label.clone());
                self.texts.insert(label, vec![text.into()]);
            }
        }
    }

    /// Keep only the labels in `allowed`.
    pub fn retain_labels(&mut self, allowed: &HashSet<SkillLabel>) {
        self.order.retain(|l| allowed.contains(l));
        self.texts.retain(|l, _| allowed.contains(l));
    }

    /// Keep the first `limit` groups by encounter order.
    pub fn truncate(&mut self, limit: usize) {
        for label in self.order.drain(limit.min(self.order.len())..) {
            self.texts.remove(&label);
        }
    }

    /// Iterate groups in encounter order.
    pub fn iter(&self) -> impl Iterator<Item = (&SkillLabel, &[String])> {
        self.order
            .iter()
            .filter_map(|l| self.texts.get(l).map(|t| (l, t.as_slice())))
    }

    pub fn get(&self, label: &SkillLabel) -> Option<&[String]> {
        self.texts.get(label).map(Vec::as_slice)
    }

    /// Number of skill groups
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Total texts across all groups (a text in two groups counts twice)
    pub fn example_count(&self) -> usize {
        self.texts.values().map(Vec::len).sum()
    }
}
