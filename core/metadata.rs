use crate::analysis::{self, FileAnalysis};
use crate::chunking::{self, ChunkMode};
use crate::config::{Config, NOTES_DIR, NOTES_SUFFIX};
use crate::gather::FileInfo;
use crate::language;
use crate::tracking;
use indexmap::IndexSet;
use std::fs;
use std::path::Path;

/// A bounded, contiguous line range of a file's content. Line numbers are
/// 1-based, inclusive, and refer to the original file's numbering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkMetadata {
    pub start_line: usize,
    pub end_line: usize,
    pub content: String,
    pub summary: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeType {
    Added,
    Modified,
    Removed,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Added => "added",
            ChangeType::Modified => "modified",
            ChangeType::Removed => "removed",
        }
    }
}

/// One classified difference against the previous run's hash cache.
/// `old_hash` is absent for added files, `new_hash` for removed ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub file_path: String,
    pub change_type: ChangeType,
    pub old_hash: Option<String>,
    pub new_hash: Option<String>,
}

/// A navigable table-of-contents entry. Level 1 is a file, level 2 a
/// sub-entity or chunk. Anchors are unique within one rendered document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TOCEntry {
    pub title: String,
    pub level: usize,
    pub anchor: String,
    pub summary: Option<String>,
}

/// Everything known about one aggregated file. Constructed fresh per run;
/// `content_hash` is derived solely from `content` at construction and is
/// never recomputed afterwards.
#[derive(Debug, Clone)]
pub struct FileMetadata {
    pub file_name: String,
    pub relative_path: String,
    pub content: String,
    pub size: u64,
    pub last_modified: String,
    pub language_id: String,
    pub purpose: String,
    pub dependencies: IndexSet<String>,
    pub directory_context: String,
    pub user_summary: Option<String>,
    pub chunks: Vec<ChunkMetadata>,
    pub chunk_info: Option<String>,
    pub content_hash: String,
    pub toc_entries: Vec<TOCEntry>,
    pub analysis: FileAnalysis,
}

/// Look up an externally supplied annotation for a file: a sidecar
/// `<name>.notes` next to it, or `<dir>/.notes/<name>`.
pub fn load_user_summary(file_path: &Path) -> Option<String> {
    let file_name = file_path.file_name()?.to_str()?;
    let parent = file_path.parent()?;

    let sidecar = parent.join(format!("{}.{}", file_name, NOTES_SUFFIX));
    let notes_dir_file = parent.join(NOTES_DIR).join(file_name);
    for candidate in [sidecar, notes_dir_file] {
        if candidate.is_file() {
            match fs::read_to_string(&candidate) {
                Ok(text) if !text.trim().is_empty() => {
                    log::debug!("Loaded user summary from {}", candidate.display());
                    return Some(text.trim_end().to_string());
                }
                Ok(_) => {}
                Err(e) => log::warn!(
                    "Could not read user summary {}: {}",
                    candidate.display(),
                    e
                ),
            }
        }
    }
    None
}

/// Assemble the full per-file model: classify, analyze, chunk, hash.
/// Analysis is computed once here and stored; nothing recomputes it later.
pub fn build_file_metadata(
    info: FileInfo,
    config: &Config,
    chunk_mode: Option<ChunkMode>,
    directory_context: String,
    user_summary: Option<String>,
) -> FileMetadata {
    let language_id = language::language_from_path(&info.path);
    let file_name = info
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let analysis =
        analysis::analyze_structure(&info.content, language_id, &file_name, &config.analysis);

    let chunks = match chunk_mode {
        Some(mode) if chunking::should_chunk(&info.content, mode) => {
            chunking::split_into_chunks(&info.content, mode)
        }
        _ => Vec::new(),
    };
    let chunk_info = match chunks.len() {
        0 => None,
        n => Some(format!("{} chunks", n)),
    };

    let content_hash = tracking::hash_content(info.content.as_bytes());

    FileMetadata {
        file_name,
        relative_path: info.relative_path.to_string_lossy().into_owned(),
        purpose: analysis.purpose.clone(),
        dependencies: analysis.dependencies.clone(),
        directory_context,
        user_summary,
        chunks,
        chunk_info,
        content_hash,
        toc_entries: Vec::new(),
        size: info.size,
        last_modified: info.modified,
        language_id: language_id.to_string(),
        content: info.content,
        analysis,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn info_for(path: &Path, rel: &str, content: &str) -> FileInfo {
        FileInfo {
            path: path.to_path_buf(),
            relative_path: PathBuf::from(rel),
            content: content.to_string(),
            size: content.len() as u64,
            modified: "2026-01-01T00:00:00".to_string(),
        }
    }

    #[test]
    fn sub_threshold_files_keep_chunks_empty() {
        let info = info_for(Path::new("/p/small.py"), "small.py", "x = 1\n");
        let meta = build_file_metadata(
            info,
            &Config::default(),
            Some(ChunkMode::Lines(50)),
            String::new(),
            None,
        );
        assert!(meta.chunks.is_empty());
        assert!(meta.chunk_info.is_none());
        assert_eq!(meta.language_id, "python");
        assert!(!meta.content_hash.is_empty());
    }

    #[test]
    fn oversized_files_carry_chunk_info() {
        let content = (1..=120)
            .map(|i| format!("v{} = {}", i, i))
            .collect::<Vec<_>>()
            .join("\n");
        let info = info_for(Path::new("/p/big.py"), "big.py", &content);
        let meta = build_file_metadata(
            info,
            &Config::default(),
            Some(ChunkMode::Lines(50)),
            String::new(),
            None,
        );
        assert_eq!(meta.chunks.len(), 3);
        assert_eq!(meta.chunk_info.as_deref(), Some("3 chunks"));
    }

    #[test]
    fn content_hash_is_stable_for_identical_content() {
        let a = build_file_metadata(
            info_for(Path::new("/p/a.py"), "a.py", "x = 1\n"),
            &Config::default(),
            None,
            String::new(),
            None,
        );
        let b = build_file_metadata(
            info_for(Path::new("/p/b.py"), "b.py", "x = 1\n"),
            &Config::default(),
            None,
            String::new(),
            None,
        );
        let c = build_file_metadata(
            info_for(Path::new("/p/c.py"), "c.py", "x = 2\n"),
            &Config::default(),
            None,
            String::new(),
            None,
        );
        assert_eq!(a.content_hash, b.content_hash);
        assert_ne!(a.content_hash, c.content_hash);
    }

    #[test]
    fn user_summary_prefers_sidecar_then_notes_dir() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        let target = root.join("main.py");
        fs::write(&target, "print('hi')\n").unwrap();

        assert_eq!(load_user_summary(&target), None);

        fs::create_dir(root.join(".notes")).unwrap();
        fs::write(root.join(".notes/main.py"), "From the notes directory\n").unwrap();
        assert_eq!(
            load_user_summary(&target).as_deref(),
            Some("From the notes directory")
        );

        fs::write(root.join("main.py.notes"), "From the sidecar\n").unwrap();
        assert_eq!(load_user_summary(&target).as_deref(), Some("From the sidecar"));
    }
}
