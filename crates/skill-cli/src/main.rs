//! Skill extraction CLI
//!
//! Trains a skill index from a labeled job-posting corpus and extracts
//! skills from free text.
//!
//! # Usage
//!
//! ```bash
//! skillex train postings --corpus postings.csv [--text-column description]
//! skillex train joined --summaries job_summary.csv --skills job_skills.csv
//! skillex predict "Senior data engineer, Spark and SQL" [--top-k 5]
//! skillex extract "Senior data engineer, Spark and SQL"
//! skillex match "Senior data engineer, Spark and SQL"
//! skillex vocab
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/skillex/config.toml)
//! 3. --config file
//! 4. Environment variables (SKILLEX_*)
//! 5. CLI flags

use anyhow::Result;
use clap::Parser;

use skill_cli::{
    handle_extract, handle_match, handle_predict, handle_train, handle_vocab, init_logging,
    load_settings, Cli, Commands,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref(), cli.log_level.as_deref())?;
    init_logging(&settings.log_level)?;

    match cli.command {
        Commands::Train(cmd) => {
            handle_train(settings, cmd).await?;
        }
        Commands::Predict { text, top_k } => {
            handle_predict(settings, &text, top_k).await?;
        }
        Commands::Extract { text } => {
            handle_extract(&settings, &text).await?;
        }
        Commands::Match { text } => {
            handle_match(&settings, &text)?;
        }
        Commands::Vocab => {
            handle_vocab(&settings)?;
        }
    }

    Ok(())
}
