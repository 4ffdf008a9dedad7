//! # skill-types
//!
//! Shared domain types for the skill extraction engine.
//!
//! This crate defines the data structures every other crate agrees on:
//! - `SkillLabel`: normalized skill identifier
//! - `Prediction`: a skill with an optional relevance score
//! - `Vocabulary`: the fixed list of known skills
//! - `VocabularyMatcher`: whole-word vocabulary detection
//! - `Settings`: layered configuration
//!
//! ## Usage
//!
//! ```rust
//! use skill_types::{Prediction, SkillLabel};
//!
//! let label = SkillLabel::new("  Python ");
//! assert_eq!(label.as_str(), "python");
//! let p = Prediction::scored(label, 0.87);
//! assert_eq!(p.score, Some(0.87));
//! ```

pub mod config;
pub mod error;
pub mod matcher;
pub mod skill;
pub mod vocabulary;

pub use config::{Settings, DEFAULT_MODEL_REPO};
pub use error::SkillError;
pub use matcher::VocabularyMatcher;
pub use skill::{Prediction, SkillLabel};
pub use vocabulary::{Vocabulary, BUILTIN_SKILLS};
