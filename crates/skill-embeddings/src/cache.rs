//! Local cache of sentence-transformer model files.
//!
//! Files live under `<root>/<owner>_<name>/`. Only files missing from that
//! directory are fetched from HuggingFace Hub, and each is copied in under a
//! temporary name first so an interrupted download never looks cached.

use std::path::{Path, PathBuf};

use hf_hub::api::sync::Api;
use tracing::{debug, info};

use skill_types::Settings;
pub use skill_types::DEFAULT_MODEL_REPO;

use crate::error::EmbeddingError;

/// Files a BERT sentence-transformer needs
pub const MODEL_FILES: &[&str] = &["config.json", "tokenizer.json", "model.safetensors"];

/// Where one model's files are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCache {
    root: PathBuf,
    repo_id: String,
}

impl Default for ModelCache {
    fn default() -> Self {
        Self::new(default_cache_root(), DEFAULT_MODEL_REPO)
    }
}

fn default_cache_root() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("skillex")
        .join("models")
}

impl ModelCache {
    pub fn new(root: impl Into<PathBuf>, repo_id: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            repo_id: repo_id.into(),
        }
    }

    /// Cache for `model_repo`, under `model_cache_dir` when set.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings
                .expanded_model_cache_dir()
                .unwrap_or_else(default_cache_root),
            settings.model_repo.clone(),
        )
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn repo_id(&self) -> &str {
        &self.repo_id
    }

    /// Short model name, e.g. "all-MiniLM-L6-v2"
    pub fn model_name(&self) -> &str {
        self.repo_id.rsplit('/').next().unwrap_or(&self.repo_id)
    }

    pub fn model_dir(&self) -> PathBuf {
        self.root.join(self.repo_id.replace('/', "_"))
    }

    pub fn paths(&self) -> ModelPaths {
        ModelPaths::in_dir(&self.model_dir())
    }

    /// Model files not yet present on disk.
    pub fn missing_files(&self) -> Vec<&'static str> {
        let dir = self.model_dir();
        MODEL_FILES
            .iter()
            .copied()
            .filter(|f| !dir.join(f).is_file())
            .collect()
    }

    pub fn is_cached(&self) -> bool {
        self.missing_files().is_empty()
    }

    /// Paths to the model files, fetching whichever are missing.
    pub fn ensure(&self) -> Result<ModelPaths, EmbeddingError> {
        check_repo_id(&self.repo_id)?;

        let missing = self.missing_files();
        if missing.is_empty() {
            debug!(path = %self.model_dir().display(), "Using cached model");
        } else {
            info!(repo = %self.repo_id, missing = missing.len(), "Downloading model files...");
            self.fetch(&missing)?;
        }
        Ok(self.paths())
    }

    fn fetch(&self, files: &[&str]) -> Result<(), EmbeddingError> {
        let api = Api::new().map_err(|e| EmbeddingError::Download(e.to_string()))?;
        let repo = api.model(self.repo_id.clone());

        let dir = self.model_dir();
        std::fs::create_dir_all(&dir)?;

        for filename in files {
            info!(file = filename, "Downloading...");
            let source = repo
                .get(filename)
                .map_err(|e| EmbeddingError::Download(format!("{}: {}", filename, e)))?;

            let partial = dir.join(format!(".{}.part", filename));
            std::fs::copy(&source, &partial)?;
            std::fs::rename(&partial, dir.join(filename))?;
            debug!(file = filename, path = %dir.display(), "Cached");
        }
        Ok(())
    }
}

/// Reject ids that are not `owner/name`; they would escape the cache root.
fn check_repo_id(repo_id: &str) -> Result<(), EmbeddingError> {
    let valid = match repo_id.split_once('/') {
        Some((owner, name)) => {
            !owner.is_empty()
                && !name.is_empty()
                && !name.contains('/')
                && owner != ".."
                && name != ".."
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(EmbeddingError::ModelNotFound(format!(
            "Invalid model repository '{}', expected owner/name",
            repo_id
        )))
    }
}

/// Paths to model files
#[derive(Debug, Clone)]
pub struct ModelPaths {
    pub config: PathBuf,
    pub tokenizer: PathBuf,
    pub weights: PathBuf,
}

impl ModelPaths {
    fn in_dir(dir: &Path) -> Self {
        Self {
            config: dir.join("config.json"),
            tokenizer: dir.join("tokenizer.json"),
            weights: dir.join("model.safetensors"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fill(cache: &ModelCache, files: &[&str]) {
        std::fs::create_dir_all(cache.model_dir()).unwrap();
        for file in files {
            std::fs::write(cache.model_dir().join(file), b"x").unwrap();
        }
    }

    #[test]
    fn test_cache_default() {
        let cache = ModelCache::default();
        assert!(cache.root().to_string_lossy().contains("skillex"));
        assert_eq!(cache.repo_id(), DEFAULT_MODEL_REPO);
        assert_eq!(cache.model_name(), "all-MiniLM-L6-v2");
    }

    #[test]
    fn test_from_settings_overrides() {
        let temp = TempDir::new().unwrap();
        let settings = Settings {
            model_cache_dir: Some(temp.path().to_string_lossy().to_string()),
            model_repo: "acme/skill-bert".to_string(),
            ..Default::default()
        };
        let cache = ModelCache::from_settings(&settings);
        assert_eq!(cache.root(), temp.path());
        assert_eq!(cache.model_name(), "skill-bert");
        assert_eq!(cache.model_dir(), temp.path().join("acme_skill-bert"));
    }

    #[test]
    fn test_missing_files_tracks_partial_cache() {
        let temp = TempDir::new().unwrap();
        let cache = ModelCache::new(temp.path(), "test/model");
        assert_eq!(cache.missing_files(), MODEL_FILES.to_vec());

        fill(&cache, &["config.json"]);
        assert_eq!(cache.missing_files(), vec!["tokenizer.json", "model.safetensors"]);
        assert!(!cache.is_cached());

        // A leftover partial download does not count
        std::fs::write(cache.model_dir().join(".tokenizer.json.part"), b"x").unwrap();
        assert!(cache.missing_files().contains(&"tokenizer.json"));
    }

    #[test]
    fn test_ensure_uses_complete_cache() {
        let temp = TempDir::new().unwrap();
        let cache = ModelCache::new(temp.path(), "test/model");
        fill(&cache, MODEL_FILES);

        let paths = cache.ensure().unwrap();
        assert!(cache.is_cached());
        assert_eq!(paths.weights, temp.path().join("test_model").join("model.safetensors"));
    }

    #[test]
    fn test_ensure_rejects_bad_repo_id() {
        let temp = TempDir::new().unwrap();
        for bad in ["no-owner", "/name", "owner/", "a/b/c", "../x"] {
            let cache = ModelCache::new(temp.path(), bad);
            assert!(
                matches!(cache.ensure(), Err(EmbeddingError::ModelNotFound(_))),
                "{} accepted",
                bad
            );
        }
    }
}
