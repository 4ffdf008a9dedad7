//! Configuration loading for skillex.
//!
//! Layered config: defaults -> config file -> env vars -> CLI flags.
//! The default config file lives at ~/.config/skillex/config.toml.

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::SkillError;

/// Default embedding model repository on HuggingFace.
pub const DEFAULT_MODEL_REPO: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Directory the skill index is published under
    #[serde(default = "default_index_dir")]
    pub index_dir: String,

    /// HuggingFace repository of the sentence-embedding model
    #[serde(default = "default_model_repo")]
    pub model_repo: String,

    /// Override for the model file cache directory
    #[serde(default)]
    pub model_cache_dir: Option<String>,

    /// Number of ranked skills returned per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Texts embedded per model call during training
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Cap on training input (records or skill groups, depending on corpus shape)
    #[serde(default)]
    pub sample_limit: Option<usize>,

    /// Upper bound on one embed-and-rank call before falling back (ms)
    #[serde(default = "default_predict_timeout_ms")]
    pub predict_timeout_ms: u64,

    /// Ranking calls allowed on the blocking pool at once, counting calls
    /// that already timed out but are still running
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// JSON array of skills replacing the built-in vocabulary
    #[serde(default)]
    pub vocabulary_path: Option<String>,
}

fn default_index_dir() -> String {
    ProjectDirs::from("", "", "skillex")
        .map(|p| p.data_local_dir().join("index"))
        .unwrap_or_else(|| PathBuf::from("./index"))
        .to_string_lossy()
        .to_string()
}

fn default_model_repo() -> String {
    DEFAULT_MODEL_REPO.to_string()
}

fn default_top_k() -> usize {
    5
}

fn default_batch_size() -> usize {
    100
}

fn default_predict_timeout_ms() -> u64 {
    2000
}

fn default_max_in_flight() -> usize {
    4
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            index_dir: default_index_dir(),
            model_repo: default_model_repo(),
            model_cache_dir: None,
            top_k: default_top_k(),
            batch_size: default_batch_size(),
            sample_limit: None,
            predict_timeout_ms: default_predict_timeout_ms(),
            max_in_flight: default_max_in_flight(),
            log_level: default_log_level(),
            vocabulary_path: None,
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/skillex/config.toml)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (SKILLEX_*)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, SkillError> {
        let config_dir = ProjectDirs::from("", "", "skillex")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("index_dir", default_index_dir())
            .map_err(|e| SkillError::Config(e.to_string()))?
            .set_default("model_repo", default_model_repo())
            .map_err(|e| SkillError::Config(e.to_string()))?
            .set_default("top_k", default_top_k() as i64)
            .map_err(|e| SkillError::Config(e.to_string()))?
            .set_default("batch_size", default_batch_size() as i64)
            .map_err(|e| SkillError::Config(e.to_string()))?
            .set_default("predict_timeout_ms", default_predict_timeout_ms() as i64)
            .map_err(|e| SkillError::Config(e.to_string()))?
            .set_default("max_in_flight", default_max_in_flight() as i64)
            .map_err(|e| SkillError::Config(e.to_string()))?
            .set_default("log_level", default_log_level())
            .map_err(|e| SkillError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Field names contain underscores, so nested keys use a double underscore:
        // SKILLEX_TOP_K, SKILLEX_INDEX_DIR, SKILLEX_PREDICT_TIMEOUT_MS
        builder = builder.add_source(
            Environment::with_prefix("SKILLEX")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| SkillError::Config(e.to_string()))?;

        let settings: Settings = config
            .try_deserialize()
            .map_err(|e| SkillError::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), SkillError> {
        if self.top_k == 0 {
            return Err(SkillError::Config("top_k must be > 0".to_string()));
        }
        if self.batch_size == 0 {
            return Err(SkillError::Config("batch_size must be > 0".to_string()));
        }
        if self.predict_timeout_ms == 0 {
            return Err(SkillError::Config(
                "predict_timeout_ms must be > 0".to_string(),
            ));
        }
        if self.max_in_flight == 0 {
            return Err(SkillError::Config("max_in_flight must be > 0".to_string()));
        }
        Ok(())
    }

    pub fn predict_timeout(&self) -> Duration {
        Duration::from_millis(self.predict_timeout_ms)
    }

    /// Expand ~ in index_dir to the home directory
    pub fn expanded_index_dir(&self) -> PathBuf {
        expand_home(&self.index_dir)
    }

    pub fn expanded_vocabulary_path(&self) -> Option<PathBuf> {
        self.vocabulary_path.as_deref().map(expand_home)
    }

    pub fn expanded_model_cache_dir(&self) -> Option<PathBuf> {
        self.model_cache_dir.as_deref().map(expand_home)
    }
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(dirs) = directories::BaseDirs::new() {
            return dirs.home_dir().join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.top_k, 5);
        assert_eq!(settings.batch_size, 100);
        assert_eq!(settings.model_repo, DEFAULT_MODEL_REPO);
        assert!(settings.sample_limit.is_none());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_load_from_cli_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("skillex.toml");
        std::fs::write(
            &path,
            "index_dir = \"/srv/skills\"\nbatch_size = 16\nsample_limit = 200\n",
        )
        .unwrap();

        let settings = Settings::load(Some(&path.to_string_lossy())).unwrap();
        assert_eq!(settings.index_dir, "/srv/skills");
        assert_eq!(settings.batch_size, 16);
        assert_eq!(settings.sample_limit, Some(200));
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("skillex.toml");
        std::fs::write(&path, "top_k = 0\n").unwrap();

        let err = Settings::load(Some(&path.to_string_lossy())).unwrap_err();
        assert!(matches!(err, SkillError::Config(_)));
    }

    #[test]
    fn test_missing_cli_file_is_error() {
        assert!(Settings::load(Some("/nonexistent/skillex.toml")).is_err());
    }

    #[test]
    fn test_validate() {
        let mut settings = Settings::default();
        settings.batch_size = 0;
        assert!(settings.validate().is_err());

        settings.batch_size = 8;
        settings.predict_timeout_ms = 0;
        assert!(settings.validate().is_err());

        settings.predict_timeout_ms = 100;
        settings.max_in_flight = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_expand_home() {
        let settings = Settings {
            index_dir: "/abs/index".to_string(),
            ..Default::default()
        };
        assert_eq!(settings.expanded_index_dir(), PathBuf::from("/abs/index"));

        let expanded = expand_home("~/skills");
        assert!(!expanded.to_string_lossy().starts_with('~'));
    }
}
