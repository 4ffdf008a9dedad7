//! Command implementations.
//!
//! Results are printed to stdout as JSON; logs go to stderr.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tracing::info;

use skill_embeddings::{CandleEmbedder, EmbeddingModel, ModelCache};
use skill_extract::SkillExtractor;
use skill_index::{IndexPaths, IndexStats, SkillIndex, SkillRanker};
use skill_training::{CorpusColumns, CorpusSource, IndexBuilder, TrainingOptions};
use skill_types::{Settings, SkillLabel, Vocabulary, VocabularyMatcher};

use crate::cli::{TrainArgs, TrainCommands};

/// Load settings and apply the global CLI overrides.
pub fn load_settings(config_path: Option<&str>, log_level: Option<&str>) -> Result<Settings> {
    let mut settings = Settings::load(config_path).context("Failed to load configuration")?;
    if let Some(level) = log_level {
        settings.log_level = level.to_string();
    }
    Ok(settings)
}

/// Install the global tracing subscriber. RUST_LOG wins over `log_level`.
pub fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn load_vocabulary(settings: &Settings) -> Result<Vocabulary> {
    Vocabulary::load_or_builtin(settings.expanded_vocabulary_path().as_deref())
        .context("Failed to load vocabulary")
}

fn load_embedder(settings: &Settings) -> Result<CandleEmbedder> {
    let cache = ModelCache::from_settings(settings);
    info!(model = %settings.model_repo, "Loading embedding model");
    CandleEmbedder::load(&cache).context("Failed to load embedding model")
}

/// Train the skill index.
///
/// Corpus files are checked before the model is loaded so a bad path fails fast.
pub async fn handle_train(mut settings: Settings, cmd: TrainCommands) -> Result<()> {
    let (source, columns, args) = match cmd {
        TrainCommands::Postings {
            corpus,
            text_column,
            args,
        } => {
            let columns = CorpusColumns {
                description: text_column,
                ..Default::default()
            };
            (CorpusSource::Postings { path: corpus }, columns, args)
        }
        TrainCommands::Joined {
            summaries,
            skills,
            skills_column,
            skill_delimiter,
            args,
        } => {
            let columns = CorpusColumns {
                skills: skills_column,
                skill_delimiter,
                ..Default::default()
            };
            (CorpusSource::Joined { summaries, skills }, columns, args)
        }
    };
    apply_train_overrides(&mut settings, &args);
    source.check_exists()?;

    let options = TrainingOptions {
        batch_size: settings.batch_size,
        only_skills: only_skills(&args.only),
        sample_limit: settings.sample_limit,
    };
    options.validate()?;

    let vocabulary = load_vocabulary(&settings)?;
    let index_dir = settings.expanded_index_dir();

    let report = tokio::task::spawn_blocking(move || -> Result<_> {
        let (groups, stats) = source.load_groups(&columns, &vocabulary, &options)?;
        info!(
            rows_read = stats.rows_read,
            rows_dropped = stats.rows_dropped,
            skills = groups.len(),
            examples = groups.example_count(),
            "Corpus grouped by skill"
        );
        let embedder = load_embedder(&settings)?;
        let (_, report) = IndexBuilder::new(&embedder, options).build_and_save(&groups, &index_dir)?;
        info!(path = %index_dir.display(), "Skill index saved");
        Ok(report)
    })
    .await
    .context("Training task failed")??;

    print_json(&report)
}

fn apply_train_overrides(settings: &mut Settings, args: &TrainArgs) {
    if let Some(dir) = &args.index_dir {
        settings.index_dir = dir.clone();
    }
    if let Some(batch_size) = args.batch_size {
        settings.batch_size = batch_size;
    }
    if args.sample_limit.is_some() {
        settings.sample_limit = args.sample_limit;
    }
}

fn only_skills(only: &[String]) -> Option<HashSet<SkillLabel>> {
    let labels: HashSet<SkillLabel> = only
        .iter()
        .map(SkillLabel::new)
        .filter(|l| !l.is_empty())
        .collect();
    (!labels.is_empty()).then_some(labels)
}

/// Rank TEXT against the trained index. Fails when no index exists.
pub async fn handle_predict(settings: Settings, text: &str, top_k: Option<usize>) -> Result<()> {
    let index_dir = settings.expanded_index_dir();
    if !SkillIndex::exists(&index_dir) {
        bail!(
            "No skill index at {}; run `skillex train` first",
            index_dir.display()
        );
    }
    let k = top_k.unwrap_or(settings.top_k);
    let text = text.to_string();

    let predictions = tokio::task::spawn_blocking(move || -> Result<_> {
        let index = SkillIndex::load(&index_dir)
            .with_context(|| format!("Failed to load skill index from {}", index_dir.display()))?;
        let embedder: Arc<dyn EmbeddingModel> = Arc::new(load_embedder(&settings)?);
        Ok(SkillRanker::new(embedder).rank_text(&text, &index, k)?)
    })
    .await
    .context("Prediction task failed")??;

    print_json(&predictions)
}

/// Extract skills from TEXT, ranked when possible.
pub async fn handle_extract(settings: &Settings, text: &str) -> Result<()> {
    let extractor =
        SkillExtractor::from_settings(settings).context("Failed to initialize extractor")?;
    let extraction = extractor.extract(text).await;
    print_json(&extraction)
}

/// Vocabulary skills mentioned in `text`.
pub fn match_text(settings: &Settings, text: &str) -> Result<Vec<SkillLabel>> {
    let vocabulary = load_vocabulary(settings)?;
    let matcher = VocabularyMatcher::new(&vocabulary)?;
    Ok(matcher.matches(text))
}

pub fn handle_match(settings: &Settings, text: &str) -> Result<()> {
    print_json(&match_text(settings, text)?)
}

/// Active vocabulary and index status.
#[derive(Debug, Serialize)]
pub struct VocabReport {
    pub vocabulary_source: String,
    pub vocabulary: Vec<String>,
    pub index_dir: String,
    pub index: Option<IndexStats>,
}

pub fn vocab_report(settings: &Settings) -> Result<VocabReport> {
    let vocabulary_path = settings.expanded_vocabulary_path();
    let vocabulary = load_vocabulary(settings)?;
    let index_dir = settings.expanded_index_dir();
    let index = index_stats(&index_dir)?;

    Ok(VocabReport {
        vocabulary_source: vocabulary_path
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "builtin".to_string()),
        vocabulary: vocabulary.entries().to_vec(),
        index_dir: index_dir.display().to_string(),
        index,
    })
}

fn index_stats(dir: &Path) -> Result<Option<IndexStats>> {
    if !SkillIndex::exists(dir) {
        return Ok(None);
    }
    let index = SkillIndex::load(dir)
        .with_context(|| format!("Failed to load skill index from {}", dir.display()))?;
    Ok(Some(IndexStats {
        label_count: index.len(),
        dimension: index.dimension(),
        size_bytes: IndexPaths::resolve(dir)?.size_bytes(),
    }))
}

pub fn handle_vocab(settings: &Settings) -> Result<()> {
    print_json(&vocab_report(settings)?)
}
