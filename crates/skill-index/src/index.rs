//! Skill index data and on-disk artifact.
//!
//! One published build is two JSON documents in one directory:
//! - `labels.json`: ordered array of skill labels
//! - `embeddings.json`: ordered array of equal-length numeric arrays
//!
//! `save` writes every build into a fresh `builds/<id>/` directory and then
//! points `CURRENT` at it with a single rename. A build directory is never
//! modified after it is published, so a reader always sees both documents of
//! the same build. A directory holding the two documents directly, with no
//! `CURRENT` file, is read as-is.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};
use ulid::Ulid;

use skill_types::SkillLabel;

use crate::error::IndexError;

pub const LABELS_FILE: &str = "labels.json";
pub const EMBEDDINGS_FILE: &str = "embeddings.json";
/// Pointer file naming the published build
pub const CURRENT_FILE: &str = "CURRENT";
/// Subdirectory holding one directory per build
pub const BUILDS_DIR: &str = "builds";

/// Attempts to load when the pointed-to build is pruned mid-read
const LOAD_ATTEMPTS: usize = 5;

/// Locations of the two artifact files of one build.
#[derive(Debug, Clone)]
pub struct IndexPaths {
    pub dir: PathBuf,
    pub labels: PathBuf,
    pub embeddings: PathBuf,
}

impl IndexPaths {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref().to_path_buf();
        Self {
            labels: dir.join(LABELS_FILE),
            embeddings: dir.join(EMBEDDINGS_FILE),
            dir,
        }
    }

    /// Paths of the build currently published under `root`.
    ///
    /// Follows `CURRENT` when present, otherwise reads `root` itself.
    pub fn resolve(root: impl AsRef<Path>) -> Result<Self, IndexError> {
        let root = root.as_ref();
        match read_current(root)? {
            Some(id) => Ok(Self::new(root.join(BUILDS_DIR).join(id))),
            None => Ok(Self::new(root)),
        }
    }

    /// True when both artifact files are present.
    pub fn exists(&self) -> bool {
        self.labels.is_file() && self.embeddings.is_file()
    }

    /// Combined size of the two files on disk (0 for missing files).
    pub fn size_bytes(&self) -> u64 {
        [&self.labels, &self.embeddings]
            .iter()
            .filter_map(|p| fs::metadata(p).ok())
            .map(|m| m.len())
            .sum()
    }
}

/// Build id named by `root/CURRENT`, if the file exists.
fn read_current(root: &Path) -> Result<Option<String>, IndexError> {
    let raw = match fs::read_to_string(root.join(CURRENT_FILE)) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let id = raw.trim();
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(IndexError::InvalidEntry(format!(
            "{} does not name a build: {:?}",
            CURRENT_FILE, id
        )));
    }
    Ok(Some(id.to_string()))
}

/// Index statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    /// Number of skills in the index
    pub label_count: usize,
    /// Embedding dimension (None for an empty index)
    pub dimension: Option<usize>,
    /// Artifact size in bytes
    pub size_bytes: u64,
}

/// Skill labels and their representative embeddings, row-aligned.
///
/// Invariants, checked on construction and on load:
/// - `labels.len() == embeddings.len()`
/// - labels are non-empty and unique
/// - every vector has the same non-zero length and finite values
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SkillIndex {
    labels: Vec<SkillLabel>,
    embeddings: Vec<Vec<f32>>,
}

impl SkillIndex {
    pub fn new(labels: Vec<SkillLabel>, embeddings: Vec<Vec<f32>>) -> Result<Self, IndexError> {
        if labels.len() != embeddings.len() {
            return Err(IndexError::LengthMismatch {
                labels: labels.len(),
                embeddings: embeddings.len(),
            });
        }

        {
            let mut seen = HashSet::with_capacity(labels.len());
            for label in &labels {
                if label.is_empty() {
                    return Err(IndexError::InvalidEntry("blank skill label".to_string()));
                }
                if !seen.insert(label.as_str()) {
                    return Err(IndexError::DuplicateLabel(label.to_string()));
                }
            }
        }

        if let Some(first) = embeddings.first() {
            let expected = first.len();
            if expected == 0 {
                return Err(IndexError::InvalidEntry(format!(
                    "zero-length embedding for '{}'",
                    labels[0]
                )));
            }
            for (label, vector) in labels.iter().zip(&embeddings) {
                if vector.len() != expected {
                    return Err(IndexError::DimensionMismatch {
                        expected,
                        actual: vector.len(),
                    });
                }
                if vector.iter().any(|v| !v.is_finite()) {
                    return Err(IndexError::InvalidEntry(format!(
                        "non-finite embedding for '{}'",
                        label
                    )));
                }
            }
        }

        Ok(Self { labels, embeddings })
    }

    pub fn labels(&self) -> &[SkillLabel] {
        &self.labels
    }

    pub fn embeddings(&self) -> &[Vec<f32>] {
        &self.embeddings
    }

    /// Iterate `(label, vector)` rows in index order.
    pub fn rows(&self) -> impl Iterator<Item = (&SkillLabel, &[f32])> {
        self.labels
            .iter()
            .zip(self.embeddings.iter().map(Vec::as_slice))
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Embedding dimension D, or None when the index has no rows.
    pub fn dimension(&self) -> Option<usize> {
        self.embeddings.first().map(Vec::len)
    }

    /// Vector stored for `label`, if present.
    pub fn embedding_for(&self, label: &SkillLabel) -> Option<&[f32]> {
        self.labels
            .iter()
            .position(|l| l == label)
            .map(|i| self.embeddings[i].as_slice())
    }

    /// True when `dir` holds a published index.
    pub fn exists(dir: impl AsRef<Path>) -> bool {
        IndexPaths::resolve(dir).is_ok_and(|paths| paths.exists())
    }

    /// Load the index published under `dir`.
    ///
    /// A build pruned between reading `CURRENT` and opening its files is
    /// retried against the new pointer.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, IndexError> {
        let root = dir.as_ref();
        let mut attempt = 1;
        loop {
            let paths = IndexPaths::resolve(root)?;
            match Self::load_build(&paths) {
                Err(e) if attempt < LOAD_ATTEMPTS && paths.dir != root && is_missing(&e) => {
                    debug!(path = ?paths.dir, attempt, "Build vanished while loading, retrying");
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    fn load_build(paths: &IndexPaths) -> Result<Self, IndexError> {
        for path in [&paths.labels, &paths.embeddings] {
            if !path.is_file() {
                return Err(IndexError::NotFound(path.clone()));
            }
        }

        let labels: Vec<SkillLabel> =
            serde_json::from_reader(BufReader::new(File::open(&paths.labels)?))?;
        let embeddings: Vec<Vec<f32>> =
            serde_json::from_reader(BufReader::new(File::open(&paths.embeddings)?))?;

        let index = Self::new(labels, embeddings)?;
        info!(
            path = ?paths.dir,
            skills = index.len(),
            dim = ?index.dimension(),
            "Loaded skill index"
        );
        Ok(index)
    }

    /// Publish the index under `dir`, replacing any existing one.
    ///
    /// Both documents go into a new build directory, then `CURRENT` is
    /// replaced by rename. Until that rename readers keep loading the
    /// previous build; a crash before it leaves the previous build published.
    /// The previous build is kept for readers still holding its id; older
    /// builds are removed.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<IndexStats, IndexError> {
        let root = dir.as_ref();
        let previous = read_current(root).ok().flatten();

        let id = Ulid::new().to_string();
        let paths = IndexPaths::new(root.join(BUILDS_DIR).join(&id));
        fs::create_dir_all(&paths.dir)?;
        write_json(&paths.embeddings, &self.embeddings, false)?;
        write_json(&paths.labels, &self.labels, true)?;

        let current_tmp = root.join(format!(".{}.tmp.{}", CURRENT_FILE, id));
        {
            let mut file = File::create(&current_tmp)?;
            file.write_all(id.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&current_tmp, root.join(CURRENT_FILE))?;

        prune_builds(root, &id, previous.as_deref());
        remove_flat_documents(root);

        let stats = IndexStats {
            label_count: self.len(),
            dimension: self.dimension(),
            size_bytes: paths.size_bytes(),
        };
        info!(
            path = ?paths.dir,
            skills = stats.label_count,
            bytes = stats.size_bytes,
            "Saved skill index"
        );
        Ok(stats)
    }
}

fn is_missing(err: &IndexError) -> bool {
    match err {
        IndexError::NotFound(_) => true,
        IndexError::Io(e) => e.kind() == io::ErrorKind::NotFound,
        _ => false,
    }
}

/// Remove builds other than `current` and `previous`. Failures are logged only.
fn prune_builds(root: &Path, current: &str, previous: Option<&str>) {
    let entries = match fs::read_dir(root.join(BUILDS_DIR)) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(error = %e, "Failed to list index builds");
            return;
        }
    };
    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name == current || Some(&*name) == previous {
            continue;
        }
        match fs::remove_dir_all(entry.path()) {
            Ok(()) => debug!(build = %name, "Pruned index build"),
            Err(e) => debug!(build = %name, error = %e, "Failed to prune index build"),
        }
    }
}

/// Drop documents left directly in `root` by an unversioned layout.
fn remove_flat_documents(root: &Path) {
    for name in [LABELS_FILE, EMBEDDINGS_FILE] {
        let path = root.join(name);
        if path.is_file() {
            if let Err(e) = fs::remove_file(&path) {
                debug!(path = ?path, error = %e, "Failed to remove unversioned index file");
            }
        }
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T, pretty: bool) -> Result<(), IndexError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    if pretty {
        serde_json::to_writer_pretty(&mut writer, value)?;
    } else {
        serde_json::to_writer(&mut writer, value)?;
    }
    writer.flush()?;
    writer.get_ref().sync_all()?;
    debug!(path = ?path, "Wrote artifact");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn labels(names: &[&str]) -> Vec<SkillLabel> {
        names.iter().map(SkillLabel::new).collect()
    }

    #[test]
    fn test_new_rejects_length_mismatch() {
        let err = SkillIndex::new(labels(&["sql", "go"]), vec![vec![1.0, 0.0]]).unwrap_err();
        assert!(matches!(
            err,
            IndexError::LengthMismatch {
                labels: 2,
                embeddings: 1
            }
        ));
    }

    #[test]
    fn test_new_rejects_duplicate_labels() {
        let err = SkillIndex::new(
            labels(&["SQL", "sql"]),
            vec![vec![1.0, 0.0], vec![0.0, 1.0]],
        )
        .unwrap_err();
        assert!(matches!(err, IndexError::DuplicateLabel(l) if l == "sql"));
    }

    #[test]
    fn test_new_rejects_mixed_dimensions() {
        let err = SkillIndex::new(
            labels(&["sql", "go"]),
            vec![vec![1.0, 0.0], vec![0.0, 1.0, 0.0]],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            IndexError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_new_rejects_non_finite() {
        let err = SkillIndex::new(labels(&["sql"]), vec![vec![f32::NAN, 0.0]]).unwrap_err();
        assert!(matches!(err, IndexError::InvalidEntry(_)));
    }

    #[test]
    fn test_empty_index() {
        let index = SkillIndex::new(vec![], vec![]).unwrap();
        assert!(index.is_empty());
        assert_eq!(index.dimension(), None);
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let index = SkillIndex::new(
            labels(&["python", "rust"]),
            vec![vec![0.25, -0.5, 1.0], vec![0.0, 0.125, 0.75]],
        )
        .unwrap();

        let stats = index.save(temp.path()).unwrap();
        assert_eq!(stats.label_count, 2);
        assert_eq!(stats.dimension, Some(3));
        assert!(stats.size_bytes > 0);
        assert!(SkillIndex::exists(temp.path()));

        let loaded = SkillIndex::load(temp.path()).unwrap();
        assert_eq!(loaded, index);
        assert_eq!(
            loaded.embedding_for(&SkillLabel::new("rust")),
            Some(&[0.0, 0.125, 0.75][..])
        );
    }

    fn dir_names(path: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(path)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_save_publishes_single_build() {
        let temp = TempDir::new().unwrap();
        let index = SkillIndex::new(labels(&["go"]), vec![vec![1.0]]).unwrap();
        index.save(temp.path()).unwrap();

        assert_eq!(dir_names(temp.path()), vec![BUILDS_DIR, CURRENT_FILE]);
        let current = fs::read_to_string(temp.path().join(CURRENT_FILE)).unwrap();
        let build = temp.path().join(BUILDS_DIR).join(current.trim());
        assert_eq!(dir_names(&build), vec![EMBEDDINGS_FILE, LABELS_FILE]);
    }

    #[test]
    fn test_save_replaces_previous_index() {
        let temp = TempDir::new().unwrap();
        SkillIndex::new(labels(&["go", "sql"]), vec![vec![1.0], vec![2.0]])
            .unwrap()
            .save(temp.path())
            .unwrap();
        let replacement = SkillIndex::new(labels(&["rust"]), vec![vec![3.0]]).unwrap();
        replacement.save(temp.path()).unwrap();

        assert_eq!(SkillIndex::load(temp.path()).unwrap(), replacement);
    }

    #[test]
    fn test_old_builds_are_pruned() {
        let temp = TempDir::new().unwrap();
        for i in 0..5 {
            SkillIndex::new(labels(&["go"]), vec![vec![i as f32 + 1.0]])
                .unwrap()
                .save(temp.path())
                .unwrap();
        }
        assert!(dir_names(&temp.path().join(BUILDS_DIR)).len() <= 2);
        assert_eq!(
            SkillIndex::load(temp.path()).unwrap().embeddings()[0],
            vec![5.0]
        );
    }

    #[test]
    fn test_unpublished_build_is_ignored() {
        let temp = TempDir::new().unwrap();
        let published = SkillIndex::new(labels(&["sql", "go"]), vec![vec![1.0, 0.0], vec![0.0, 1.0]])
            .unwrap();
        published.save(temp.path()).unwrap();

        // A writer that died before swapping CURRENT leaves a complete build behind.
        let orphan = temp.path().join(BUILDS_DIR).join("01J0000000000000000000ORPH");
        fs::create_dir_all(&orphan).unwrap();
        fs::write(orphan.join(LABELS_FILE), r#"["rust", "java"]"#).unwrap();
        fs::write(orphan.join(EMBEDDINGS_FILE), "[[0.5, 0.5], [0.1, 0.9]]").unwrap();

        assert_eq!(SkillIndex::load(temp.path()).unwrap(), published);
    }

    #[test]
    fn test_save_over_flat_layout() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(LABELS_FILE), r#"["go"]"#).unwrap();
        fs::write(temp.path().join(EMBEDDINGS_FILE), "[[1.0]]").unwrap();
        assert_eq!(SkillIndex::load(temp.path()).unwrap().len(), 1);

        let index = SkillIndex::new(labels(&["sql", "rust"]), vec![vec![1.0], vec![2.0]]).unwrap();
        index.save(temp.path()).unwrap();
        assert_eq!(SkillIndex::load(temp.path()).unwrap(), index);
        assert!(!temp.path().join(LABELS_FILE).exists());
    }

    #[test]
    fn test_bad_current_pointer() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CURRENT_FILE), "../elsewhere").unwrap();
        assert!(matches!(
            SkillIndex::load(temp.path()),
            Err(IndexError::InvalidEntry(_))
        ));
        assert!(!SkillIndex::exists(temp.path()));
    }

    #[test]
    fn test_concurrent_load_never_mixes_builds() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;

        let temp = TempDir::new().unwrap();
        let root = temp.path().to_path_buf();
        let a = SkillIndex::new(labels(&["sql", "go"]), vec![vec![1.0, 0.0], vec![0.0, 1.0]])
            .unwrap();
        let b = SkillIndex::new(labels(&["rust", "java"]), vec![vec![0.5, 0.5], vec![0.1, 0.9]])
            .unwrap();
        a.save(&root).unwrap();

        let done = Arc::new(AtomicBool::new(false));
        let writer = {
            let (a, b, root, done) = (a.clone(), b.clone(), root.clone(), Arc::clone(&done));
            std::thread::spawn(move || {
                for i in 0..300 {
                    let next = if i % 2 == 0 { &b } else { &a };
                    next.save(&root).unwrap();
                }
                done.store(true, Ordering::SeqCst);
            })
        };

        let mut loads = 0;
        while !done.load(Ordering::SeqCst) || loads == 0 {
            if let Ok(loaded) = SkillIndex::load(&root) {
                assert!(loaded == a || loaded == b, "mixed builds: {:?}", loaded);
                loads += 1;
            }
        }
        writer.join().unwrap();
        assert!(loads > 0);
    }

    #[test]
    fn test_load_missing_artifact() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(LABELS_FILE), "[\"go\"]").unwrap();

        let err = SkillIndex::load(temp.path()).unwrap_err();
        assert!(matches!(err, IndexError::NotFound(p) if p.ends_with(EMBEDDINGS_FILE)));
        assert!(!SkillIndex::exists(temp.path()));
    }

    #[test]
    fn test_load_torn_pair_is_rejected() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(LABELS_FILE), r#"["go", "sql"]"#).unwrap();
        fs::write(temp.path().join(EMBEDDINGS_FILE), "[[1.0, 0.0]]").unwrap();

        assert!(matches!(
            SkillIndex::load(temp.path()),
            Err(IndexError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_load_corrupt_json() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(LABELS_FILE), "not json").unwrap();
        fs::write(temp.path().join(EMBEDDINGS_FILE), "[]").unwrap();

        assert!(matches!(
            SkillIndex::load(temp.path()),
            Err(IndexError::Serialization(_))
        ));
    }
}
