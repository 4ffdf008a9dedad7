//! Labeled corpus readers.
//!
//! Two CSV shapes are supported:
//! - postings: one free-text column; skills come from vocabulary matching
//! - joined: a summaries table and a skills table sharing a job identifier
//!
//! Rows missing a required field are dropped and counted, never reported as
//! errors. Corpora are expected to have gaps.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Serialize;
use tracing::{debug, info};

use skill_types::{SkillLabel, Vocabulary, VocabularyMatcher};

use crate::builder::TrainingOptions;
use crate::error::TrainingError;
use crate::groups::SkillGroups;

/// Column names read from the corpus files.
#[derive(Debug, Clone)]
pub struct CorpusColumns {
    /// Free-text column of the postings table
    pub description: String,
    /// Job identifier shared by the summaries and skills tables
    pub job_id: String,
    /// Summary text column of the summaries table
    pub summary: String,
    /// Skill column of the skills table
    pub skills: String,
    /// Split each skills cell on this character. `None` reads one skill per
    /// row; set `Some(',')` for tables that list a job's skills in one cell.
    pub skill_delimiter: Option<char>,
}

impl Default for CorpusColumns {
    fn default() -> Self {
        Self {
            description: "description".to_string(),
            job_id: "job_link".to_string(),
            summary: "job_summary".to_string(),
            skills: "job_skill".to_string(),
            skill_delimiter: None,
        }
    }
}

/// Where the training corpus comes from.
#[derive(Debug, Clone)]
pub enum CorpusSource {
    /// Single postings table grouped by vocabulary match
    Postings { path: PathBuf },
    /// Summaries joined to per-job skill rows
    Joined { summaries: PathBuf, skills: PathBuf },
}

/// Counters from reading a corpus.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CorpusStats {
    /// Data rows read across all files
    pub rows_read: usize,
    /// Rows dropped for missing fields, unmatched ids or unreadable content
    pub rows_dropped: usize,
    /// Texts usable for training (postings with text, or joined skill rows)
    pub examples: usize,
}

impl CorpusSource {
    /// Fail with `CorpusNotFound` if any corpus file is missing.
    pub fn check_exists(&self) -> Result<(), TrainingError> {
        let paths: Vec<&PathBuf> = match self {
            CorpusSource::Postings { path } => vec![path],
            CorpusSource::Joined { summaries, skills } => vec![summaries, skills],
        };
        for path in paths {
            if !path.is_file() {
                return Err(TrainingError::CorpusNotFound(path.clone()));
            }
        }
        Ok(())
    }

    /// Read the corpus and group its texts by skill.
    ///
    /// Groups outside `options.only_skills` are dropped first. Then
    /// `options.sample_limit` caps input records for postings, or the
    /// remaining skill groups for the joined shape. `vocabulary` is only
    /// consulted for postings.
    pub fn load_groups(
        &self,
        columns: &CorpusColumns,
        vocabulary: &Vocabulary,
        options: &TrainingOptions,
    ) -> Result<(SkillGroups, CorpusStats), TrainingError> {
        self.check_exists()?;
        let (mut groups, stats) = match self {
            CorpusSource::Postings { path } => {
                let matcher = VocabularyMatcher::new(vocabulary)?;
                let (texts, stats) = read_postings(path, &columns.description, options.sample_limit)?;
                (group_by_vocabulary(&texts, &matcher), stats)
            }
            CorpusSource::Joined { summaries, skills } => read_joined(summaries, skills, columns)?,
        };

        if let Some(only) = &options.only_skills {
            groups.retain_labels(only);
            debug!(skills = groups.len(), "Kept requested skills only");
        }
        if let (CorpusSource::Joined { .. }, Some(limit)) = (self, options.sample_limit) {
            groups.truncate(limit);
        }
        Ok((groups, stats))
    }
}

/// Add each text to the group of every vocabulary skill it mentions.
pub fn group_by_vocabulary(texts: &[String], matcher: &VocabularyMatcher) -> SkillGroups {
    let mut groups = SkillGroups::new();
    for text in texts {
        for label in matcher.matches(text) {
            groups.push(label, text.as_str());
        }
    }
    info!(
        texts = texts.len(),
        skills = groups.len(),
        "Grouped postings by vocabulary skill"
    );
    groups
}

/// Read the free-text column of a postings table.
pub fn read_postings(
    path: &Path,
    column: &str,
    sample_limit: Option<usize>,
) -> Result<(Vec<String>, CorpusStats), TrainingError> {
    info!(path = ?path, "Loading postings corpus");
    let mut reader = open_csv(path)?;
    let col = column_index(reader.headers()?, path, column)?;

    let mut stats = CorpusStats::default();
    let mut texts = Vec::new();
    for record in reader.records() {
        if sample_limit.is_some_and(|limit| stats.rows_read >= limit) {
            break;
        }
        stats.rows_read += 1;
        let Some(record) = readable(record, &mut stats)? else {
            continue;
        };
        match field(&record, col) {
            Some(text) => texts.push(text.to_string()),
            None => stats.rows_dropped += 1,
        }
    }
    stats.examples = texts.len();

    info!(
        rows = stats.rows_read,
        dropped = stats.rows_dropped,
        "Loaded postings"
    );
    Ok((texts, stats))
}

/// Join summaries to skill rows on the job identifier.
pub fn read_joined(
    summaries_path: &Path,
    skills_path: &Path,
    columns: &CorpusColumns,
) -> Result<(SkillGroups, CorpusStats), TrainingError> {
    let mut stats = CorpusStats::default();

    info!(path = ?summaries_path, "Loading summaries");
    let mut reader = open_csv(summaries_path)?;
    let headers = reader.headers()?.clone();
    let id_col = column_index(&headers, summaries_path, &columns.job_id)?;
    let summary_col = column_index(&headers, summaries_path, &columns.summary)?;

    let mut summaries: HashMap<String, String> = HashMap::new();
    for record in reader.records() {
        stats.rows_read += 1;
        let Some(record) = readable(record, &mut stats)? else {
            continue;
        };
        match (field(&record, id_col), field(&record, summary_col)) {
            (Some(id), Some(summary)) => {
                summaries.insert(id.to_string(), summary.to_string());
            }
            _ => stats.rows_dropped += 1,
        }
    }
    info!(summaries = summaries.len(), "Built job id -> summary map");

    info!(path = ?skills_path, "Loading skill rows");
    let mut reader = open_csv(skills_path)?;
    let headers = reader.headers()?.clone();
    let id_col = column_index(&headers, skills_path, &columns.job_id)?;
    let skill_col = column_index(&headers, skills_path, &columns.skills)?;

    let mut groups = SkillGroups::new();
    for record in reader.records() {
        stats.rows_read += 1;
        let Some(record) = readable(record, &mut stats)? else {
            continue;
        };
        let (Some(id), Some(skills)) = (field(&record, id_col), field(&record, skill_col)) else {
            stats.rows_dropped += 1;
            continue;
        };
        let Some(summary) = summaries.get(id) else {
            stats.rows_dropped += 1;
            continue;
        };

        // A cell lists each skill once even if it repeats it
        let mut seen = HashSet::new();
        for label in split_skills(skills, columns.skill_delimiter) {
            if !label.is_empty() && seen.insert(label.clone()) {
                groups.push(label, summary.as_str());
                stats.examples += 1;
            }
        }
    }

    info!(
        skills = groups.len(),
        examples = stats.examples,
        dropped = stats.rows_dropped,
        "Grouped summaries by skill"
    );
    Ok((groups, stats))
}

fn split_skills(cell: &str, delimiter: Option<char>) -> Vec<SkillLabel> {
    match delimiter {
        Some(d) => cell.split(d).map(SkillLabel::new).collect(),
        None => vec![SkillLabel::new(cell)],
    }
}

fn open_csv(path: &Path) -> Result<csv::Reader<std::fs::File>, TrainingError> {
    if !path.is_file() {
        return Err(TrainingError::CorpusNotFound(path.to_path_buf()));
    }
    Ok(ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_path(path)?)
}

fn column_index(headers: &StringRecord, path: &Path, column: &str) -> Result<usize, TrainingError> {
    headers
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| TrainingError::MissingColumn {
            path: path.to_path_buf(),
            column: column.to_string(),
        })
}

/// Pass IO failures up; count and skip rows the CSV reader could not decode.
fn readable(
    record: Result<StringRecord, csv::Error>,
    stats: &mut CorpusStats,
) -> Result<Option<StringRecord>, TrainingError> {
    match record {
        Ok(record) => Ok(Some(record)),
        Err(e) if e.is_io_error() => Err(e.into()),
        Err(e) => {
            debug!(error = %e, "Skipping unreadable corpus row");
            stats.rows_dropped += 1;
            Ok(None)
        }
    }
}

fn field(record: &StringRecord, col: usize) -> Option<&str> {
    record.get(col).filter(|v| !v.is_empty())
}
