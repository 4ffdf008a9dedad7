//! Embedding model trait and types.
//!
//! Defines the interface for generating vector embeddings from text.

use crate::error::EmbeddingError;

/// Vector embedding - a dense float array of the model's dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    pub values: Vec<f32>,
}

impl Embedding {
    /// Create a new embedding from a vector.
    /// Normalizes the vector to unit length.
    pub fn new(values: Vec<f32>) -> Self {
        let norm: f32 = values.iter().map(|x| x * x).sum::<f32>().sqrt();
        let normalized = if norm > 0.0 {
            values.iter().map(|x| x / norm).collect()
        } else {
            values
        };
        Self { values: normalized }
    }

    /// Create embedding without normalization
    pub fn from_raw(values: Vec<f32>) -> Self {
        Self { values }
    }

    /// Get the embedding dimension
    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f32> {
        self.values
    }
}

/// Model information
#[derive(Debug, Clone)]
pub struct ModelInfo {
    /// Model name (e.g., "all-MiniLM-L6-v2")
    pub name: String,
    /// Embedding dimension
    pub dimension: usize,
    /// Maximum sequence length in tokens
    pub max_sequence_length: usize,
}

/// Trait for embedding models.
///
/// Implementations must be thread-safe (Send + Sync): a loaded model is
/// shared read-only across concurrent prediction requests.
pub trait EmbeddingModel: Send + Sync {
    /// Get model information
    fn info(&self) -> &ModelInfo;

    /// Generate embeddings for multiple texts, one per input, in input order.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EmbeddingError>;

    /// Generate embedding for a single text (a batch of one).
    fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        let mut embeddings = self.embed_batch(&[text])?;
        if embeddings.len() != 1 {
            return Err(EmbeddingError::CountMismatch {
                expected: 1,
                actual: embeddings.len(),
            });
        }
        Ok(embeddings.remove(0))
    }

    /// Generate embeddings for multiple owned strings.
    fn embed_texts(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
        let refs: Vec<&str> = texts.iter().map(|s| s.as_str()).collect();
        self.embed_batch(&refs)
    }

    /// Embedding dimension D
    fn dimension(&self) -> usize {
        self.info().dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct LengthModel {
        info: ModelInfo,
    }

    impl EmbeddingModel for LengthModel {
        fn info(&self) -> &ModelInfo {
            &self.info
        }

        fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EmbeddingError> {
            Ok(texts
                .iter()
                .map(|t| Embedding::from_raw(vec![t.len() as f32, 1.0]))
                .collect())
        }
    }

    fn length_model() -> LengthModel {
        LengthModel {
            info: ModelInfo {
                name: "length".to_string(),
                dimension: 2,
                max_sequence_length: 8,
            },
        }
    }

    #[test]
    fn test_embedding_normalization() {
        let emb = Embedding::new(vec![3.0, 4.0]);
        // 3-4-5 triangle: normalized should be [0.6, 0.8]
        assert!((emb.values[0] - 0.6).abs() < 0.001);
        assert!((emb.values[1] - 0.8).abs() < 0.001);
    }

    #[test]
    fn test_zero_vector_left_unchanged() {
        let emb = Embedding::new(vec![0.0, 0.0, 0.0]);
        assert_eq!(emb.values, vec![0.0, 0.0, 0.0]);
        assert_eq!(emb.dimension(), 3);
    }

    #[test]
    fn test_embed_is_batch_of_one() {
        let model = length_model();
        let single = model.embed("abc").unwrap();
        let batch = model.embed_batch(&["abc"]).unwrap();
        assert_eq!(single, batch[0]);
        assert_eq!(model.dimension(), 2);
    }

    #[test]
    fn test_embed_texts_preserves_order() {
        let model = length_model();
        let texts = vec!["a".to_string(), "abcd".to_string(), "ab".to_string()];
        let out = model.embed_texts(&texts).unwrap();
        let lengths: Vec<f32> = out.iter().map(|e| e.values[0]).collect();
        assert_eq!(lengths, vec![1.0, 4.0, 2.0]);
    }
}
