use crate::config::{CACHE_FILENAME, Config, IGNORE_FILENAME, NOTES_DIR, NOTES_SUFFIX};
use crate::error::{AppError, Result};
use chrono::{DateTime, Local};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// A candidate file surviving all exclusion layers, with its raw content.
#[derive(Debug, Clone)]
pub struct FileInfo {
    pub path: PathBuf,
    pub relative_path: PathBuf,
    pub content: String,
    pub size: u64,
    pub modified: String,
}

/// Extensions never treated as aggregatable text.
const BINARY_EXTENSIONS: &[&str] = &[
    "pdf", "doc", "docx", "xls", "xlsx", "zip", "tar", "gz", "7z", "rar", "exe", "dll", "so",
    "dylib", "jpg", "jpeg", "png", "gif", "bmp", "ico", "mp3", "mp4", "avi", "mov", "ttf", "otf",
    "woff", "woff2", "class", "o", "a", "bin", "wasm",
];

#[derive(Debug, Default, Deserialize)]
pub struct BuiltinIgnores {
    #[serde(default)]
    pub patterns: Vec<String>,
}

static BUILTIN_IGNORE_PATTERNS: Lazy<BuiltinIgnores> = Lazy::new(|| {
    let yaml_content = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../data/builtin_ignores.yaml"
    ));
    serde_yml::from_str(yaml_content).expect("Failed to parse embedded data/builtin_ignores.yaml")
});

pub fn get_builtin_ignore_patterns() -> &'static BuiltinIgnores {
    &BUILTIN_IGNORE_PATTERNS
}

/// Load project ignore rules from the root-relative ignore file.
/// Missing file means no rules; `#` comments and blank lines are skipped.
pub fn load_ignore_rules(project_root: &Path) -> Result<Vec<String>> {
    let ignore_path = project_root.join(IGNORE_FILENAME);
    if !ignore_path.is_file() {
        log::debug!("No ignore file at {}", ignore_path.display());
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(&ignore_path).map_err(|e| AppError::FileRead {
        path: ignore_path.clone(),
        source: e,
    })?;
    let rules: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect();
    log::debug!(
        "Loaded {} ignore rules from {}",
        rules.len(),
        ignore_path.display()
    );
    Ok(rules)
}

/// Normalize a raw ignore pattern for matching against relative paths.
///
/// A leading `/` anchors the pattern to the aggregation root; otherwise it
/// matches at any depth. A trailing `/` marks a directory pattern that also
/// matches everything beneath it.
fn normalize_pattern(raw: &str) -> String {
    let mut pattern = raw.trim().to_string();
    let anchored = pattern.starts_with('/');
    if anchored {
        pattern.remove(0);
    }
    if pattern.ends_with('/') && pattern.len() > 1 {
        pattern.push_str("**");
    }
    if !anchored && !pattern.starts_with("**/") {
        pattern = format!("**/{}", pattern);
    }
    pattern
}

fn build_glob_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern_str in patterns {
        let processed_pattern = normalize_pattern(pattern_str);
        match Glob::new(&processed_pattern) {
            Ok(glob) => {
                log::trace!(
                    "Adding glob pattern: {} (processed as {})",
                    pattern_str,
                    processed_pattern
                );
                builder.add(glob);
            }
            Err(e) => {
                log::error!("Invalid glob pattern \"{}\": {}", pattern_str, e);
                return Err(AppError::Glob(format!(
                    "Invalid glob pattern \"{}\" (processed as \"{}\"): {}",
                    pattern_str, processed_pattern, e
                )));
            }
        }
    }
    builder.build().map_err(|e| {
        log::error!("Error building glob set: {}", e);
        AppError::Glob(e.to_string())
    })
}

fn has_binary_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .is_some_and(|e| BINARY_EXTENSIONS.contains(&e.as_str()))
}

/// Tool-owned artifacts (the hash cache, user-summary sidecars) are never
/// aggregated as content.
fn is_tool_artifact(relative_path: &Path) -> bool {
    if relative_path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n == CACHE_FILENAME || n.ends_with(&format!(".{}", NOTES_SUFFIX)))
    {
        return true;
    }
    relative_path
        .components()
        .any(|c| matches!(c, Component::Normal(name) if name.to_str() == Some(NOTES_DIR)))
}

fn format_modified(metadata: &fs::Metadata) -> String {
    metadata
        .modified()
        .map(|t| {
            DateTime::<Local>::from(t)
                .format("%Y-%m-%dT%H:%M:%S")
                .to_string()
        })
        .unwrap_or_default()
}

/// Walk the root and return every regular file surviving all exclusion
/// layers, sorted lexicographically by relative path.
///
/// Exclusion layers are cumulative: built-in patterns, project ignore rules,
/// and caller-supplied substrings each veto a path independently. Unreadable
/// and non-UTF-8 files are logged and skipped without aborting the walk.
pub fn gather_files(
    project_root: &Path,
    config: &Config,
    extra_excludes: &[String],
) -> Result<Vec<FileInfo>> {
    log::debug!("Starting file gathering in {}", project_root.display());

    let builtin_set = if config.filter.use_builtin_ignores {
        build_glob_set(&get_builtin_ignore_patterns().patterns)?
    } else {
        GlobSet::empty()
    };
    let project_rules = load_ignore_rules(project_root)?;
    let rules_set = build_glob_set(&project_rules)?;

    let mut exclude_substrings: Vec<&str> =
        config.filter.exclude.iter().map(String::as_str).collect();
    exclude_substrings.extend(extra_excludes.iter().map(String::as_str));

    let mut builder = WalkBuilder::new(project_root);
    builder
        .hidden(false)
        .ignore(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .parents(false)
        .require_git(false);

    let mut files = Vec::new();
    for entry_result in builder.build() {
        let entry = match entry_result {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Error walking directory: {}", e);
                continue;
            }
        };
        if entry.depth() == 0 || entry.file_type().is_none_or(|ft| !ft.is_file()) {
            continue;
        }
        let path = entry.path();
        let Some(relative_path) = pathdiff::diff_paths(path, project_root) else {
            log::warn!("Could not get relative path for: {}", path.display());
            continue;
        };

        if is_tool_artifact(&relative_path) {
            log::trace!("Skipping tool artifact: {}", relative_path.display());
            continue;
        }
        if builtin_set.is_match(&relative_path) {
            log::trace!(
                "Path excluded by built-in ignores: {}",
                relative_path.display()
            );
            continue;
        }
        if rules_set.is_match(&relative_path) {
            log::trace!(
                "Path excluded by project ignore rules: {}",
                relative_path.display()
            );
            continue;
        }
        let absolute_str = path.to_string_lossy();
        if exclude_substrings.iter().any(|s| absolute_str.contains(s)) {
            log::trace!("Path excluded by caller substring: {}", path.display());
            continue;
        }
        if has_binary_extension(path) {
            log::trace!("Skipping binary extension: {}", relative_path.display());
            continue;
        }

        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(e) => {
                log::warn!("Could not stat {}: {}", path.display(), e);
                continue;
            }
        };
        if metadata.len() > config.filter.max_file_size {
            log::debug!(
                "Skipping oversized file {} ({} bytes > {} max)",
                relative_path.display(),
                metadata.len(),
                config.filter.max_file_size
            );
            continue;
        }

        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("Could not read {}: {}", path.display(), e);
                continue;
            }
        };
        let content = match String::from_utf8(bytes) {
            Ok(content) => content,
            Err(e) => {
                log::debug!("Skipping non-UTF-8 file: {} ({})", path.display(), e);
                continue;
            }
        };

        files.push(FileInfo {
            path: path.to_path_buf(),
            relative_path,
            content,
            size: metadata.len(),
            modified: format_modified(&metadata),
        });
    }

    // Lexicographic order by relative path keeps every downstream stage
    // deterministic regardless of traversal order.
    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    log::info!("Gathered {} files from {}", files.len(), project_root.display());
    Ok(files)
}
