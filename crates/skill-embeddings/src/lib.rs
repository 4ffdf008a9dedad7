//! # skill-embeddings
//!
//! Text embedder for the skill extraction engine, backed by Candle.
//!
//! Every string becomes one fixed-length dense vector. Batching is the primary
//! path: single-text embedding is a batch of one.
//!
//! ## Features
//! - Local inference via Candle (no Python, no API)
//! - Sentence-transformer BERT models (all-MiniLM-L6-v2 by default)
//! - Model files downloaded once and cached on disk
//! - Mean pooling over the attention mask, L2-normalized output

pub mod cache;
pub mod candle;
pub mod error;
pub mod model;

pub use crate::candle::CandleEmbedder;
pub use cache::{ModelCache, ModelPaths, DEFAULT_MODEL_REPO, MODEL_FILES};
pub use error::EmbeddingError;
pub use model::{Embedding, EmbeddingModel, ModelInfo};
