//! skillex library exports.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Command implementations (train, predict, extract, match, vocab)

pub mod cli;
pub mod commands;

pub use cli::{Cli, Commands, TrainArgs, TrainCommands};
pub use commands::{
    handle_extract, handle_match, handle_predict, handle_train, handle_vocab, init_logging,
    load_settings, match_text, vocab_report, VocabReport,
};
