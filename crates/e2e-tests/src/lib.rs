//! End-to-end test infrastructure for the skill extraction pipeline.
//!
//! Provides a shared TestHarness, a deterministic embedder and corpus
//! writers for tests covering training through extraction.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use skill_embeddings::{Embedding, EmbeddingError, EmbeddingModel, ModelInfo};
use skill_extract::{ExtractorConfig, FallbackMatcher, SkillExtractor};
use skill_types::Vocabulary;

/// Shared test harness for E2E tests.
///
/// Owns a temp directory with separate locations for corpus files and the
/// skill index.
pub struct TestHarness {
    /// Keeps temp dir alive for the lifetime of the harness
    pub _temp_dir: tempfile::TempDir,
    /// Where corpus CSVs are written
    pub corpus_dir: PathBuf,
    /// Where the skill index is saved
    pub index_dir: PathBuf,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let corpus_dir = temp_dir.path().join("corpus");
        let index_dir = temp_dir.path().join("index");
        std::fs::create_dir_all(&corpus_dir).expect("Failed to create corpus dir");

        Self {
            _temp_dir: temp_dir,
            corpus_dir,
            index_dir,
        }
    }

    /// Write a CSV file under the corpus dir and return its path.
    pub fn write_csv(&self, name: &str, header: &[&str], rows: &[Vec<&str>]) -> PathBuf {
        let path = self.corpus_dir.join(name);
        write_csv(&path, header, rows);
        path
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

pub fn write_csv(path: &Path, header: &[&str], rows: &[Vec<&str>]) {
    let mut writer = csv::Writer::from_path(path).expect("Failed to create CSV");
    writer.write_record(header).expect("Failed to write header");
    for row in rows {
        writer.write_record(row).expect("Failed to write row");
    }
    writer.flush().expect("Failed to flush CSV");
}

/// Embeds text as whole-word keyword counts, one axis per keyword.
///
/// Deterministic and dependency-free, so averaged vectors and rankings can
/// be computed by hand in tests.
pub struct KeywordEmbedder {
    info: ModelInfo,
    keywords: Vec<String>,
}

impl KeywordEmbedder {
    pub fn new(keywords: &[&str]) -> Self {
        Self {
            info: ModelInfo {
                name: "keyword-counts".to_string(),
                dimension: keywords.len(),
                max_sequence_length: 512,
            },
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    pub fn vector(&self, text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        self.keywords
            .iter()
            .map(|k| words.iter().filter(|w| *w == k).count() as f32)
            .collect()
    }

    /// Element-wise mean of the vectors for `texts`.
    pub fn mean(&self, texts: &[&str]) -> Vec<f32> {
        let mut sum = vec![0.0f32; self.keywords.len()];
        for text in texts {
            for (s, v) in sum.iter_mut().zip(self.vector(text)) {
                *s += v;
            }
        }
        sum.iter().map(|s| s / texts.len() as f32).collect()
    }
}

impl EmbeddingModel for KeywordEmbedder {
    fn info(&self) -> &ModelInfo {
        &self.info
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EmbeddingError> {
        Ok(texts
            .iter()
            .map(|t| Embedding::from_raw(self.vector(t)))
            .collect())
    }
}

/// Extractor over `vocabulary` with the given embedder and no index loaded.
pub fn extractor_with(
    vocabulary: &[&str],
    embedder: Option<Arc<dyn EmbeddingModel>>,
) -> SkillExtractor {
    let fallback = FallbackMatcher::new(&Vocabulary::new(vocabulary.iter().copied()))
        .expect("Failed to build fallback matcher");
    let extractor = SkillExtractor::new(fallback, ExtractorConfig::default());
    match embedder {
        Some(embedder) => extractor.with_embedder(embedder),
        None => extractor,
    }
}

pub fn assert_close(actual: &[f32], expected: &[f32]) {
    assert_eq!(actual.len(), expected.len(), "dimension differs");
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() < 1e-4, "{:?} != {:?}", actual, expected);
    }
}
