use crate::config::CACHE_FILENAME;
use crate::error::{AppError, Result};
use crate::gather::FileInfo;
use crate::metadata::{ChangeType, FileChange};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Hex SHA-256 of raw file bytes. Hashing raw bytes, not normalized text,
/// is what makes whitespace-only edits detectable.
pub fn hash_content(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Cross-run change tracking over a persisted relative-path → digest map.
///
/// The cache file is the only durable state of an aggregation run. A missing
/// or corrupt cache is treated as empty, never as a fatal error.
#[derive(Debug)]
pub struct ChangeTracker {
    cache_path: PathBuf,
    previous: BTreeMap<String, String>,
}

impl ChangeTracker {
    pub fn load(project_root: &Path) -> Self {
        let cache_path = project_root.join(CACHE_FILENAME);
        let previous = match fs::read_to_string(&cache_path) {
            Ok(content) => match serde_json::from_str::<BTreeMap<String, String>>(&content) {
                Ok(map) => {
                    log::debug!(
                        "Loaded {} cached hashes from {}",
                        map.len(),
                        cache_path.display()
                    );
                    map
                }
                Err(e) => {
                    log::warn!(
                        "Corrupt change-tracking cache {} ({}); treating as empty",
                        cache_path.display(),
                        e
                    );
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No change-tracking cache at {}", cache_path.display());
                BTreeMap::new()
            }
            Err(e) => {
                log::warn!(
                    "Could not read change-tracking cache {} ({}); treating as empty",
                    cache_path.display(),
                    e
                );
                BTreeMap::new()
            }
        };
        Self {
            cache_path,
            previous,
        }
    }

    /// Digest map for the current file set, keyed by relative path.
    pub fn compute_hashes(files: &[FileInfo]) -> BTreeMap<String, String> {
        files
            .iter()
            .map(|f| {
                (
                    f.relative_path.to_string_lossy().into_owned(),
                    hash_content(f.content.as_bytes()),
                )
            })
            .collect()
    }

    /// Classify every difference between the previous and current maps.
    /// Added and modified entries come first in path order, then removals.
    pub fn diff(&self, current: &BTreeMap<String, String>) -> Vec<FileChange> {
        let mut changes = Vec::new();
        for (path, new_hash) in current {
            match self.previous.get(path) {
                None => changes.push(FileChange {
                    file_path: path.clone(),
                    change_type: ChangeType::Added,
                    old_hash: None,
                    new_hash: Some(new_hash.clone()),
                }),
                Some(old_hash) if old_hash != new_hash => changes.push(FileChange {
                    file_path: path.clone(),
                    change_type: ChangeType::Modified,
                    old_hash: Some(old_hash.clone()),
                    new_hash: Some(new_hash.clone()),
                }),
                Some(_) => {}
            }
        }
        for (path, old_hash) in &self.previous {
            if !current.contains_key(path) {
                changes.push(FileChange {
                    file_path: path.clone(),
                    change_type: ChangeType::Removed,
                    old_hash: Some(old_hash.clone()),
                    new_hash: None,
                });
            }
        }
        changes
    }

    /// True when the file's digest matches the previous run's entry.
    pub fn is_unchanged(&self, relative_path: &str, hash: &str) -> bool {
        self.previous.get(relative_path).is_some_and(|h| h == hash)
    }

    /// Persist the current map unconditionally, replacing the cache
    /// atomically via a temp file so a crashed run never leaves a torn cache.
    pub fn persist(&self, current: &BTreeMap<String, String>) -> Result<()> {
        let serialized = serde_json::to_string_pretty(current)?;
        let tmp_path = self.cache_path.with_extension("json.tmp");
        fs::write(&tmp_path, serialized).map_err(|e| AppError::FileWrite {
            path: tmp_path.clone(),
            source: e,
        })?;
        fs::rename(&tmp_path, &self.cache_path).map_err(|e| AppError::FileWrite {
            path: self.cache_path.clone(),
            source: e,
        })?;
        log::debug!(
            "Persisted {} hashes to {}",
            current.len(),
            self.cache_path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn file(rel: &str, content: &str) -> FileInfo {
        FileInfo {
            path: PathBuf::from("/project").join(rel),
            relative_path: PathBuf::from(rel),
            content: content.to_string(),
            size: content.len() as u64,
            modified: String::new(),
        }
    }

    fn run(root: &Path, files: &[FileInfo]) -> Vec<FileChange> {
        let tracker = ChangeTracker::load(root);
        let current = ChangeTracker::compute_hashes(files);
        let changes = tracker.diff(&current);
        tracker.persist(&current).unwrap();
        changes
    }

    #[test]
    fn whitespace_only_edits_change_the_digest() {
        assert_ne!(hash_content(b"x = 1"), hash_content(b"x = 1 "));
        assert_eq!(hash_content(b"same"), hash_content(b"same"));
    }

    #[test]
    fn second_run_with_no_edits_reports_zero_changes() {
        let tmp = TempDir::new().unwrap();
        let files = vec![file("a.py", "a = 1\n"), file("b.py", "b = 2\n")];

        let first = run(tmp.path(), &files);
        assert_eq!(first.len(), 2);
        assert!(first.iter().all(|c| c.change_type == ChangeType::Added));
        assert!(first.iter().all(|c| c.old_hash.is_none()));

        let second = run(tmp.path(), &files);
        assert!(second.is_empty());
    }

    #[test]
    fn single_byte_edit_yields_exactly_one_modification() {
        let tmp = TempDir::new().unwrap();
        run(
            tmp.path(),
            &[file("a.py", "a = 1\n"), file("b.py", "b = 2\n")],
        );
        let changes = run(
            tmp.path(),
            &[file("a.py", "a = 2\n"), file("b.py", "b = 2\n")],
        );
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].file_path, "a.py");
        assert_eq!(changes[0].change_type, ChangeType::Modified);
        assert!(changes[0].old_hash.is_some());
        assert!(changes[0].new_hash.is_some());
        assert_ne!(changes[0].old_hash, changes[0].new_hash);
    }

    #[test]
    fn deleting_a_seen_file_yields_exactly_one_removal() {
        let tmp = TempDir::new().unwrap();
        run(
            tmp.path(),
            &[file("a.py", "a = 1\n"), file("b.py", "b = 2\n")],
        );
        let changes = run(tmp.path(), &[file("a.py", "a = 1\n")]);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].file_path, "b.py");
        assert_eq!(changes[0].change_type, ChangeType::Removed);
        assert!(changes[0].new_hash.is_none());
    }

    #[test]
    fn corrupt_cache_degrades_to_all_added() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CACHE_FILENAME), "not json {").unwrap();
        let changes = run(tmp.path(), &[file("a.py", "a = 1\n")]);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].change_type, ChangeType::Added);
    }

    #[test]
    fn incremental_lookup_matches_previous_hashes() {
        let tmp = TempDir::new().unwrap();
        let files = vec![file("a.py", "a = 1\n")];
        run(tmp.path(), &files);

        let tracker = ChangeTracker::load(tmp.path());
        let hash = hash_content(b"a = 1\n");
        assert!(tracker.is_unchanged("a.py", &hash));
        assert!(!tracker.is_unchanged("a.py", &hash_content(b"a = 2\n")));
        assert!(!tracker.is_unchanged("missing.py", &hash));
    }
}
