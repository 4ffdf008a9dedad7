//! # skill-extract
//!
//! The single entry point callers use to turn posting text into skills.
//!
//! `SkillExtractor` is built once per process and holds the loaded embedder,
//! the current skill index and the vocabulary fallback. Each call either
//! ranks the text against the index or, when that path is unavailable or
//! fails, falls back to whole-word vocabulary matching. Callers always get a
//! skill list; the `ExtractionPath` tag says which path produced it.
//!
//! ## Fallback triggers
//! - no embedder or no index loaded
//! - index built with a different embedding dimension
//! - embedding or ranking error
//! - ranking exceeded the configured timeout

pub mod error;
pub mod extractor;
pub mod fallback;
pub mod metrics;

pub use error::ExtractError;
pub use extractor::{Extraction, ExtractionPath, ExtractorConfig, FallbackReason, SkillExtractor};
pub use fallback::FallbackMatcher;
pub use metrics::{ExtractorMetrics, ExtractorMetricsSnapshot};
