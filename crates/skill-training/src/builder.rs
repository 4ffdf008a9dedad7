//! Index builder: skill groups -> averaged embeddings -> skill index.

use std::collections::HashSet;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

use skill_embeddings::{EmbeddingError, EmbeddingModel};
use skill_index::{IndexStats, SkillIndex};
use skill_types::SkillLabel;

use crate::accumulator::MeanAccumulator;
use crate::error::TrainingError;
use crate::groups::SkillGroups;

/// Training run configuration
#[derive(Debug, Clone)]
pub struct TrainingOptions {
    /// Texts per embedding call
    pub batch_size: usize,
    /// Restrict training to these skills (dry runs on a small subset)
    pub only_skills: Option<HashSet<SkillLabel>>,
    /// Cap on input records (postings) or skill groups (joined), applied
    /// after `only_skills`
    pub sample_limit: Option<usize>,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self {
            batch_size: 100,
            only_skills: None,
            sample_limit: None,
        }
    }
}

impl TrainingOptions {
    pub fn validate(&self) -> Result<(), TrainingError> {
        if self.batch_size == 0 {
            return Err(TrainingError::InvalidOptions(
                "batch_size must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Statistics from a build
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildReport {
    /// Skills written to the index
    pub skills: usize,
    /// Texts embedded across all skills
    pub examples: usize,
    /// Embedding calls made
    pub batches: usize,
    /// Groups excluded by `only_skills` or for having no texts
    pub skipped: usize,
    /// Set once the index is persisted
    pub index: Option<IndexStats>,
}

/// Builds a skill index from grouped training texts.
///
/// Groups are processed one after another and every embedding call goes
/// through the single embedder reference held here.
pub struct IndexBuilder<'a> {
    embedder: &'a dyn EmbeddingModel,
    options: TrainingOptions,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(embedder: &'a dyn EmbeddingModel, options: TrainingOptions) -> Self {
        Self { embedder, options }
    }

    /// Embed and average every group.
    pub fn build(&self, groups: &SkillGroups) -> Result<(SkillIndex, BuildReport), TrainingError> {
        self.options.validate()?;

        let dimension = self.embedder.dimension();
        let mut report = BuildReport::default();
        let mut labels = Vec::with_capacity(groups.len());
        let mut embeddings = Vec::with_capacity(groups.len());

        info!(
            skills = groups.len(),
            batch_size = self.options.batch_size,
            model = %self.embedder.info().name,
            "Generating and averaging embeddings for each skill"
        );

        for (position, (label, texts)) in groups.iter().enumerate() {
            if let Some(only) = &self.options.only_skills {
                if !only.contains(label) {
                    report.skipped += 1;
                    continue;
                }
            }

            let mut acc = MeanAccumulator::new(dimension);
            for batch in texts.chunks(self.options.batch_size) {
                let vectors = self.embedder.embed_texts(batch)?;
                report.batches += 1;
                if vectors.len() != batch.len() {
                    return Err(EmbeddingError::CountMismatch {
                        expected: batch.len(),
                        actual: vectors.len(),
                    }
                    .into());
                }
                for vector in &vectors {
                    acc.add(vector.as_slice()).map_err(|e| with_skill(e, label))?;
                }
            }

            let Some(mean) = acc.finish() else {
                report.skipped += 1;
                continue;
            };

            debug!(
                skill = %label,
                examples = acc.count(),
                progress = position + 1,
                total = groups.len(),
                "Averaged skill embedding"
            );
            report.examples += acc.count();
            labels.push(label.clone());
            embeddings.push(mean);
        }

        let index = SkillIndex::new(labels, embeddings)?;
        report.skills = index.len();

        info!(
            skills = report.skills,
            examples = report.examples,
            batches = report.batches,
            skipped = report.skipped,
            "Embeddings generated"
        );
        Ok((index, report))
    }

    /// Build, then persist to `index_dir`.
    ///
    /// Nothing is written if any group fails or no skill survives filtering,
    /// so a dry run that matches nothing leaves the published index alone.
    pub fn build_and_save(
        &self,
        groups: &SkillGroups,
        index_dir: &Path,
    ) -> Result<(SkillIndex, BuildReport), TrainingError> {
        let (index, mut report) = self.build(groups)?;
        if index.is_empty() {
            return Err(TrainingError::EmptyIndex {
                skipped: report.skipped,
            });
        }
        report.index = Some(index.save(index_dir)?);
        Ok((index, report))
    }
}

fn with_skill(err: TrainingError, label: &SkillLabel) -> TrainingError {
    match err {
        TrainingError::DimensionMismatch {
            expected, actual, ..
        } => TrainingError::DimensionMismatch {
            skill: label.to_string(),
            expected,
            actual,
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use skill_embeddings::{Embedding, ModelInfo};
    use tempfile::TempDir;

    /// Embeds each text as [len, vowel count, 1.0] and counts calls.
    struct CountingModel {
        info: ModelInfo,
        calls: AtomicUsize,
        fail_on: Option<&'static str>,
    }

    impl CountingModel {
        fn new() -> Self {
            Self {
                info: ModelInfo {
                    name: "counting".to_string(),
                    dimension: 3,
                    max_sequence_length: 128,
                },
                calls: AtomicUsize::new(0),
                fail_on: None,
            }
        }

        fn vector(text: &str) -> Vec<f32> {
            let vowels = text.chars().filter(|c| "aeiou".contains(*c)).count();
            vec![text.len() as f32, vowels as f32, 1.0]
        }
    }

    impl EmbeddingModel for CountingModel {
        fn info(&self) -> &ModelInfo {
            &self.info
        }

        fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EmbeddingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(bad) = self.fail_on {
                if texts.contains(&bad) {
                    return Err(EmbeddingError::Tokenizer("boom".to_string()));
                }
            }
            Ok(texts
                .iter()
                .map(|t| Embedding::from_raw(Self::vector(t)))
                .collect())
        }
    }

    fn groups(rows: &[(&str, &[&str])]) -> SkillGroups {
        let mut groups = SkillGroups::new();
        for (label, texts) in rows {
            for text in *texts {
                groups.push(SkillLabel::new(label), *text);
            }
        }
        groups
    }

    fn mean_of(texts: &[&str]) -> Vec<f32> {
        let n = texts.len() as f32;
        let mut sum = vec![0.0f32; 3];
        for t in texts {
            for (s, v) in sum.iter_mut().zip(CountingModel::vector(t)) {
                *s += v;
            }
        }
        sum.iter().map(|s| s / n).collect()
    }

    fn assert_close(a: &[f32], b: &[f32]) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b) {
            assert!((x - y).abs() < 1e-4, "{:?} != {:?}", a, b);
        }
    }

    #[test]
    fn test_build_averages_each_group() {
        let python = ["python etl", "python api work", "django python"];
        let rust = ["rust services"];
        let model = CountingModel::new();
        let builder = IndexBuilder::new(&model, TrainingOptions::default());

        let (index, report) = builder
            .build(&groups(&[("Python", &python[..]), ("Rust", &rust[..])]))
            .unwrap();

        let labels: Vec<_> = index.labels().iter().map(|l| l.as_str()).collect();
        assert_eq!(labels, vec!["python", "rust"]);
        assert_close(&index.embeddings()[0], &mean_of(&python));
        assert_close(&index.embeddings()[1], &mean_of(&rust));
        assert_eq!(report.skills, 2);
        assert_eq!(report.examples, 4);
        assert_eq!(report.batches, 2);
    }

    #[test]
    fn test_batch_size_does_not_change_result() {
        let texts: Vec<String> = (0..23).map(|i| format!("posting number {} about sql", i)).collect();
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let input = groups(&[("sql", refs.as_slice())]);
        let model = CountingModel::new();

        let mut results = Vec::new();
        for batch_size in [1, 4, 7, 23, 100] {
            let options = TrainingOptions {
                batch_size,
                ..Default::default()
            };
            let (index, report) = IndexBuilder::new(&model, options).build(&input).unwrap();
            assert_eq!(report.batches, 23usize.div_ceil(batch_size));
            results.push(index.embeddings()[0].clone());
        }
        for other in &results[1..] {
            assert_close(&results[0], other);
        }
    }

    #[test]
    fn test_only_skills_filters_groups() {
        let model = CountingModel::new();
        let options = TrainingOptions {
            only_skills: Some([SkillLabel::new("react")].into_iter().collect()),
            ..Default::default()
        };
        let (index, report) = IndexBuilder::new(&model, options)
            .build(&groups(&[("python", &["a"][..]), ("react", &["b", "c"][..])]))
            .unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.labels()[0].as_str(), "react");
        assert_eq!(report.skipped, 1);
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let model = CountingModel::new();
        let options = TrainingOptions {
            batch_size: 0,
            ..Default::default()
        };
        assert!(matches!(
            IndexBuilder::new(&model, options).build(&SkillGroups::new()),
            Err(TrainingError::InvalidOptions(_))
        ));
    }

    #[test]
    fn test_embedding_failure_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let mut model = CountingModel::new();
        model.fail_on = Some("bad text");

        let result = IndexBuilder::new(&model, TrainingOptions::default())
            .build_and_save(
                &groups(&[("go", &["fine"][..]), ("sql", &["bad text"][..])]),
                dir.path(),
            );

        assert!(matches!(result, Err(TrainingError::Embedding(_))));
        assert!(!SkillIndex::exists(dir.path()));
    }

    #[test]
    fn test_empty_build_keeps_existing_index() {
        let dir = TempDir::new().unwrap();
        let model = CountingModel::new();
        let (good, _) = IndexBuilder::new(&model, TrainingOptions::default())
            .build_and_save(&groups(&[("go", &["goroutines"][..])]), dir.path())
            .unwrap();

        let options = TrainingOptions {
            only_skills: Some([SkillLabel::new("cobol")].into_iter().collect()),
            ..Default::default()
        };
        let result = IndexBuilder::new(&model, options)
            .build_and_save(&groups(&[("sql", &["joins"][..])]), dir.path());

        assert!(matches!(result, Err(TrainingError::EmptyIndex { skipped: 1 })));
        assert_eq!(SkillIndex::load(dir.path()).unwrap(), good);
    }

    #[test]
    fn test_build_and_save_round_trip() {
        let dir = TempDir::new().unwrap();
        let model = CountingModel::new();
        let (index, report) = IndexBuilder::new(&model, TrainingOptions::default())
            .build_and_save(&groups(&[("go", &["goroutines"][..])]), dir.path())
            .unwrap();

        assert_eq!(report.index.as_ref().unwrap().label_count, 1);
        assert_eq!(SkillIndex::load(dir.path()).unwrap(), index);
    }
}
