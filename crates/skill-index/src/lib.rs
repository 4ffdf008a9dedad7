//! # skill-index
//!
//! The persisted skill index and the similarity ranker that reads it.
//!
//! A skill index is two parallel sequences: N skill labels and N
//! representative embedding vectors of one constant dimension. It is written
//! once by training, loaded read-only at prediction time, and replaced whole.
//!
//! ## Features
//! - `labels.json` + `embeddings.json` pair per build, published by swapping a
//!   `CURRENT` pointer so readers never see documents from two builds
//! - Validation of parallel lengths, unique labels and constant dimension
//! - Cosine similarity that never lets NaN reach the sort
//! - Stable top-K ranking of query text against every row

pub mod error;
pub mod index;
pub mod ranker;
pub mod similarity;

pub use error::IndexError;
pub use index::{
    IndexPaths, IndexStats, SkillIndex, BUILDS_DIR, CURRENT_FILE, EMBEDDINGS_FILE, LABELS_FILE,
};
pub use ranker::SkillRanker;
pub use similarity::{cosine_similarity, rank};
