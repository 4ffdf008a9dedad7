//! Extraction facade with fail-open fallback.
//!
//! Ranking runs on the blocking pool under a timeout. Any reason ranking
//! cannot produce a result sends the call down the vocabulary fallback
//! instead of returning an error.
//!
//! A timed-out ranking task cannot be cancelled, so each task holds a
//! semaphore permit until it really finishes. When every permit is held the
//! call falls back as `busy` instead of queueing more blocking work.

use std::path::Path;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use skill_embeddings::{CandleEmbedder, EmbeddingError, EmbeddingModel, ModelCache};
use skill_index::{IndexError, SkillIndex, SkillRanker};
use skill_types::{Prediction, Settings, Vocabulary};

use crate::error::ExtractError;
use crate::fallback::FallbackMatcher;
use crate::metrics::ExtractorMetrics;

/// Extraction settings.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Maximum ranked skills returned
    pub top_k: usize,
    /// Budget for embedding + ranking one text
    pub timeout: Duration,
    /// Ranking tasks allowed on the blocking pool at once
    pub max_in_flight: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            timeout: Duration::from_millis(2000),
            max_in_flight: 4,
        }
    }
}

impl ExtractorConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            top_k: settings.top_k,
            timeout: settings.predict_timeout(),
            max_in_flight: settings.max_in_flight,
        }
    }
}

/// Why ranking was not used for a call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "reason", content = "detail")]
pub enum FallbackReason {
    NoEmbedder,
    NoIndex,
    EmptyIndex,
    Incompatible { index: usize, model: usize },
    RankFailed(String),
    TaskFailed(String),
    Timeout,
    /// Every ranking slot is held, possibly by timed-out tasks still running
    Busy,
}

/// Which path produced an extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ExtractionPath {
    Ranked,
    Fallback(FallbackReason),
}

/// Skills for one text plus the path that produced them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extraction {
    pub path: ExtractionPath,
    pub skills: Vec<Prediction>,
}

impl Extraction {
    pub fn is_ranked(&self) -> bool {
        self.path == ExtractionPath::Ranked
    }

    pub fn skill_names(&self) -> Vec<&str> {
        self.skills.iter().map(|p| p.skill.as_str()).collect()
    }
}

/// Process-wide extraction context.
///
/// Built once at startup and shared by reference. The embedder is loaded
/// once; the index can be swapped while calls are in flight, and each call
/// works against the index it read when it started.
pub struct SkillExtractor {
    ranker: Option<SkillRanker>,
    index: RwLock<Option<Arc<SkillIndex>>>,
    fallback: FallbackMatcher,
    config: ExtractorConfig,
    in_flight: Arc<Semaphore>,
    metrics: Arc<ExtractorMetrics>,
}

impl SkillExtractor {
    pub fn new(fallback: FallbackMatcher, config: ExtractorConfig) -> Self {
        let permits = config.max_in_flight.max(1);
        Self {
            ranker: None,
            index: RwLock::new(None),
            fallback,
            config,
            in_flight: Arc::new(Semaphore::new(permits)),
            metrics: Arc::new(ExtractorMetrics::new()),
        }
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn EmbeddingModel>) -> Self {
        self.ranker = Some(SkillRanker::new(embedder));
        self
    }

    pub fn with_index(self, index: SkillIndex) -> Self {
        self.swap_index(Some(index));
        self
    }

    /// Build from settings.
    ///
    /// Only a bad vocabulary is fatal. A missing or unreadable index, or a
    /// model that fails to load, leaves the extractor on the fallback path.
    /// The model is only loaded when an index is present.
    pub fn from_settings(settings: &Settings) -> Result<Self, ExtractError> {
        Self::from_settings_with(settings, |settings| {
            let cache = ModelCache::from_settings(settings);
            let embedder: Arc<dyn EmbeddingModel> = Arc::new(CandleEmbedder::load(&cache)?);
            Ok(embedder)
        })
    }

    /// `from_settings` with the model loader supplied by the caller.
    ///
    /// The model is attached before the index is read so the index is
    /// checked against it on load.
    pub fn from_settings_with<F>(settings: &Settings, load_model: F) -> Result<Self, ExtractError>
    where
        F: FnOnce(&Settings) -> Result<Arc<dyn EmbeddingModel>, EmbeddingError>,
    {
        let vocabulary =
            Vocabulary::load_or_builtin(settings.expanded_vocabulary_path().as_deref())?;
        let fallback = FallbackMatcher::new(&vocabulary)?;
        let mut extractor = Self::new(fallback, ExtractorConfig::from_settings(settings));

        let index_dir = settings.expanded_index_dir();
        if !SkillIndex::exists(&index_dir) {
            info!(path = %index_dir.display(), "No skill index found, using vocabulary fallback");
            return Ok(extractor);
        }

        match load_model(settings) {
            Ok(embedder) => extractor = extractor.with_embedder(embedder),
            Err(e) => warn!(error = %e, "Failed to load embedding model, using vocabulary fallback"),
        }
        if let Err(e) = extractor.reload_index(&index_dir) {
            warn!(error = %e, "Failed to load skill index, using vocabulary fallback");
        }
        Ok(extractor)
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    pub fn fallback(&self) -> &FallbackMatcher {
        &self.fallback
    }

    pub fn metrics(&self) -> Arc<ExtractorMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn has_embedder(&self) -> bool {
        self.ranker.is_some()
    }

    /// Index in use right now, if any.
    pub fn current_index(&self) -> Option<Arc<SkillIndex>> {
        match self.index.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Replace the index. Returns the previous one.
    pub fn swap_index(&self, index: Option<SkillIndex>) -> Option<Arc<SkillIndex>> {
        let next = index.map(Arc::new);
        let mut guard = match self.index.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        std::mem::replace(&mut *guard, next)
    }

    /// Load the index at `dir` and swap it in.
    ///
    /// On failure the current index stays in place.
    pub fn reload_index(&self, dir: &Path) -> Result<usize, ExtractError> {
        let index = SkillIndex::load(dir)?;
        let count = index.len();
        if let Some(ranker) = &self.ranker {
            if let Err(e) = ranker.check_compatible(&index) {
                self.metrics.record_incompatible_load();
                warn!(error = %e, "Loaded index does not match the embedding model");
            }
        }
        self.swap_index(Some(index));
        info!(path = %dir.display(), skills = count, "Skill index loaded");
        Ok(count)
    }

    /// Skills for `text`. Never fails.
    pub async fn extract(&self, text: &str) -> Extraction {
        let start = Instant::now();
        match self.try_rank(text).await {
            Ok(skills) => {
                self.metrics.record_ranked();
                debug!(
                    returned = skills.len(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Ranked extraction"
                );
                Extraction {
                    path: ExtractionPath::Ranked,
                    skills,
                }
            }
            Err(reason) => {
                self.metrics.record_fallback(&reason);
                let skills = self.fallback.extract(text);
                debug!(
                    ?reason,
                    returned = skills.len(),
                    "Vocabulary fallback extraction"
                );
                Extraction {
                    path: ExtractionPath::Fallback(reason),
                    skills,
                }
            }
        }
    }

    async fn try_rank(&self, text: &str) -> Result<Vec<Prediction>, FallbackReason> {
        let ranker = self.ranker.clone().ok_or(FallbackReason::NoEmbedder)?;
        let index = self.current_index().ok_or(FallbackReason::NoIndex)?;
        if index.is_empty() {
            return Err(FallbackReason::EmptyIndex);
        }

        let permit = Arc::clone(&self.in_flight)
            .try_acquire_owned()
            .map_err(|_| {
                warn!(
                    max_in_flight = self.config.max_in_flight,
                    "Ranking slots exhausted"
                );
                FallbackReason::Busy
            })?;

        let text = text.to_string();
        let k = self.config.top_k;
        let task = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            ranker.rank_text(&text, &index, k)
        });

        // A timed-out task keeps running on the blocking pool, holding its
        // permit; its result is dropped.
        match timeout(self.config.timeout, task).await {
            Ok(Ok(Ok(predictions))) => Ok(predictions),
            Ok(Ok(Err(IndexError::DimensionMismatch { expected, actual }))) => {
                error!(
                    index_dimension = expected,
                    model_dimension = actual,
                    "Skill index was built with a different embedding model"
                );
                Err(FallbackReason::Incompatible {
                    index: expected,
                    model: actual,
                })
            }
            Ok(Ok(Err(e))) => {
                warn!(error = %e, "Ranking failed");
                Err(FallbackReason::RankFailed(e.to_string()))
            }
            Ok(Err(join_err)) => {
                warn!(error = %join_err, "Ranking task failed");
                Err(FallbackReason::TaskFailed(join_err.to_string()))
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.config.timeout.as_millis() as u64,
                    "Ranking timed out"
                );
                Err(FallbackReason::Timeout)
            }
        }
    }
}
