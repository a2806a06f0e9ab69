use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Aggregate description of one directory, used as the `directory_context`
/// of every file it contains.
#[derive(Debug, Clone, Default)]
pub struct DirectoryMetadata {
    pub name: String,
    pub purpose: String,
    pub files: Vec<String>,
    pub subdirectories: Vec<String>,
    pub parent: Option<String>,
    pub file_count: usize,
    pub subdirectory_count: usize,
    pub total_size: u64,
}

const README_NAMES: &[&str] = &["README.md", "README.rst", "README.txt", "README"];

/// Documentation, license, and manifest files are excluded from a
/// directory's content listing.
fn is_documentation_or_manifest(name: &str) -> bool {
    let lower = name.to_lowercase();
    const PREFIXES: &[&str] = &[
        "readme",
        "license",
        "licence",
        "changelog",
        "contributing",
        "notice",
        "copying",
    ];
    const MANIFESTS: &[&str] = &[
        "cargo.toml",
        "cargo.lock",
        "package.json",
        "package-lock.json",
        "pyproject.toml",
        "setup.cfg",
        "setup.py",
        "requirements.txt",
        "go.mod",
        "go.sum",
        "gemfile",
        "makefile",
    ];
    PREFIXES.iter().any(|p| lower.starts_with(p)) || MANIFESTS.contains(&lower.as_str())
}

/// First content paragraph line of a README in `dir`, if any.
fn readme_purpose(dir: &Path) -> Option<String> {
    for name in README_NAMES {
        let candidate = dir.join(name);
        if !candidate.is_file() {
            continue;
        }
        match fs::read_to_string(&candidate) {
            Ok(text) => {
                let first = text
                    .lines()
                    .map(str::trim)
                    .find(|l| !l.is_empty() && !l.starts_with('#') && !l.starts_with('='));
                if let Some(line) = first {
                    return Some(line.to_string());
                }
            }
            Err(e) => log::warn!("Could not read {}: {}", candidate.display(), e),
        }
    }
    None
}

fn inferred_purpose(name: &str) -> String {
    match name.to_lowercase().as_str() {
        "src" | "lib" => "Source code".to_string(),
        "tests" | "test" => "Test suite".to_string(),
        "docs" | "doc" => "Documentation".to_string(),
        "config" | "conf" | "settings" => "Configuration".to_string(),
        "scripts" | "bin" | "tools" => "Utility scripts".to_string(),
        "examples" | "demos" => "Usage examples".to_string(),
        "assets" | "static" | "resources" => "Static assets".to_string(),
        _ => format!("Directory {}", name),
    }
}

/// Summarize one directory: README-sourced or inferred purpose, contained
/// file and subdirectory names, and aggregate counts over the whole subtree.
pub fn create_directory_summary(dir: &Path, project_root: &Path) -> DirectoryMetadata {
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.to_string_lossy().into_owned());

    let mut files = Vec::new();
    let mut subdirectories = Vec::new();
    match fs::read_dir(dir) {
        Ok(entries) => {
            for entry in entries.flatten() {
                let entry_name = entry.file_name().to_string_lossy().into_owned();
                match entry.file_type() {
                    Ok(ft) if ft.is_dir() => {
                        if !entry_name.starts_with('.') {
                            subdirectories.push(entry_name);
                        }
                    }
                    Ok(ft) if ft.is_file() => {
                        if !is_documentation_or_manifest(&entry_name) {
                            files.push(entry_name);
                        }
                    }
                    _ => {}
                }
            }
        }
        Err(e) => log::warn!("Could not list {}: {}", dir.display(), e),
    }
    files.sort();
    subdirectories.sort();

    let total_size: u64 = WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok())
        .map(|m| m.len())
        .sum();

    let parent = if dir == project_root {
        None
    } else {
        dir.parent()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
    };

    let purpose = readme_purpose(dir).unwrap_or_else(|| inferred_purpose(&name));

    DirectoryMetadata {
        purpose,
        file_count: files.len(),
        subdirectory_count: subdirectories.len(),
        files,
        subdirectories,
        parent,
        total_size,
        name,
    }
}
