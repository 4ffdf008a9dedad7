//! CLI argument parsing for skillex.
//!
//! CLI flags override all other config sources.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Skill extraction from job-posting text
#[derive(Parser, Debug)]
#[command(name = "skillex")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/skillex/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the skill index from a labeled corpus
    #[command(subcommand)]
    Train(TrainCommands),

    /// Rank skills for TEXT against the index (requires a trained index)
    Predict {
        /// Posting text
        text: String,

        /// Number of skills to return
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Extract skills from TEXT, falling back to vocabulary matching
    Extract {
        /// Posting text
        text: String,
    },

    /// Vocabulary skills mentioned in TEXT
    Match {
        /// Posting text
        text: String,
    },

    /// Show the active vocabulary and index statistics
    Vocab,
}

/// Corpus shapes accepted by `train`
#[derive(Subcommand, Debug)]
pub enum TrainCommands {
    /// Single postings table; skills found by vocabulary match
    Postings {
        /// Postings CSV
        #[arg(long)]
        corpus: PathBuf,

        /// Column holding the posting text
        #[arg(long, default_value = "description")]
        text_column: String,

        #[command(flatten)]
        args: TrainArgs,
    },

    /// Summaries table joined to a skills table on the job id
    Joined {
        /// Summaries CSV (job_link, job_summary)
        #[arg(long)]
        summaries: PathBuf,

        /// Skills CSV (job_link, job_skill)
        #[arg(long)]
        skills: PathBuf,

        /// Column of the skills CSV holding the skill
        #[arg(long, default_value = "job_skill")]
        skills_column: String,

        /// Split each skills cell on this character (e.g. ',')
        #[arg(long)]
        skill_delimiter: Option<char>,

        #[command(flatten)]
        args: TrainArgs,
    },
}

/// Options shared by both corpus shapes
#[derive(Args, Debug, Clone, Default)]
pub struct TrainArgs {
    /// Override index output directory
    #[arg(long)]
    pub index_dir: Option<String>,

    /// Texts per embedding call
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Cap on input records (postings) or skill groups (joined)
    #[arg(long)]
    pub sample_limit: Option<usize>,

    /// Only train these skills (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<String>,
}
