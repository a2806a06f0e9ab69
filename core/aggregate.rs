use crate::config::Config;
use crate::directory::{self, DirectoryMetadata};
use crate::error::{AppError, Result};
use crate::gather;
use crate::metadata::{self, FileChange, FileMetadata};
use crate::output_formats::OutputFormat;
use crate::toc;
use crate::tracking::ChangeTracker;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Result of one aggregation run: the rendered document plus the change
/// classification against the previous run (empty when tracking is off).
#[derive(Debug)]
pub struct AggregateOutput {
    pub document: String,
    pub changes: Vec<FileChange>,
    pub file_count: usize,
}

/// Run the whole pipeline: gather, track, analyze, chunk, build the TOC,
/// render. Strictly sequential over the sorted file list; per-file failures
/// degrade locally and never abort the run.
pub fn aggregate(project_root: &Path, config: &Config) -> Result<AggregateOutput> {
    if !project_root.is_dir() {
        return Err(AppError::Config(format!(
            "'{}' is not a directory",
            project_root.display()
        )));
    }
    let format: OutputFormat = config.output.format.parse()?;
    let chunk_mode = config.chunk_mode()?;

    let mut files = gather::gather_files(project_root, config, &[])?;

    let mut changes = Vec::new();
    if config.tracking.enabled || config.tracking.incremental {
        let tracker = ChangeTracker::load(project_root);
        let current = ChangeTracker::compute_hashes(&files);
        changes = tracker.diff(&current);
        // Persist after diffing, even with zero changes, so the next run
        // compares against this one.
        tracker.persist(&current)?;

        if config.tracking.incremental {
            let before = files.len();
            files.retain(|f| {
                let rel = f.relative_path.to_string_lossy();
                !current
                    .get(rel.as_ref())
                    .is_some_and(|hash| tracker.is_unchanged(&rel, hash))
            });
            log::info!(
                "Incremental mode: skipping {} unchanged files",
                before - files.len()
            );
        }
    }

    let mut directory_cache: HashMap<PathBuf, DirectoryMetadata> = HashMap::new();
    let mut metas: Vec<FileMetadata> = Vec::with_capacity(files.len());
    for info in files {
        let parent = info
            .path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| project_root.to_path_buf());
        let directory_context = directory_cache
            .entry(parent.clone())
            .or_insert_with(|| directory::create_directory_summary(&parent, project_root))
            .purpose
            .clone();
        let user_summary = metadata::load_user_summary(&info.path);
        metas.push(metadata::build_file_metadata(
            info,
            config,
            chunk_mode,
            directory_context,
            user_summary,
        ));
    }

    toc::build_toc(&mut metas);

    let document = format.formatter(config.output.extra_spacing).format(&metas);
    log::info!(
        "Aggregated {} files into a {} byte document",
        metas.len(),
        document.len()
    );

    Ok(AggregateOutput {
        document,
        changes,
        file_count: metas.len(),
    })
}
