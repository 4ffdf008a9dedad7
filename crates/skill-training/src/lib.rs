//! # skill-training
//!
//! Offline training pipeline for the skill index.
//!
//! Reads a labeled corpus of job postings, groups posting text by skill,
//! embeds each group in batches and averages it into one representative
//! vector per skill, then persists the resulting `SkillIndex`.
//!
//! ## Corpus shapes
//! - Single table: a postings CSV with a free-text column; skills are found
//!   by whole-word vocabulary matching.
//! - Two tables: a summaries CSV and a skills CSV joined on a job identifier.
//!
//! ## Failure semantics
//! - Missing corpus files fail before any embedding work starts.
//! - Rows missing required fields are dropped silently.
//! - Skills with no texts are left out of the index.
//! - The index is written only after every group embedded successfully.

pub mod accumulator;
pub mod builder;
pub mod corpus;
pub mod error;
pub mod groups;

pub use accumulator::MeanAccumulator;
pub use builder::{BuildReport, IndexBuilder, TrainingOptions};
pub use corpus::{CorpusColumns, CorpusSource, CorpusStats};
pub use error::TrainingError;
pub use groups::SkillGroups;
