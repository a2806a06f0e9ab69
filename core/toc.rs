use crate::analysis::EntityKind;
use crate::metadata::{FileMetadata, TOCEntry};
use std::collections::HashSet;

/// Lowercase the text and collapse every non-alphanumeric run to a single
/// hyphen, trimming leading and trailing hyphens.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;
    for c in text.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

/// Document-wide anchor bookkeeping: identical slugs get `-2`, `-3`, …
/// suffixes so every anchor stays unique across files.
#[derive(Debug, Default)]
pub struct AnchorSet {
    seen: HashSet<String>,
}

impl AnchorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unique(&mut self, base: &str) -> String {
        let base = if base.is_empty() { "section" } else { base };
        if self.seen.insert(base.to_string()) {
            return base.to_string();
        }
        let mut ordinal = 2;
        loop {
            let candidate = format!("{}-{}", base, ordinal);
            if self.seen.insert(candidate.clone()) {
                return candidate;
            }
            ordinal += 1;
        }
    }
}

/// Populate `toc_entries` for every file: a level-1 entry for the file,
/// then level-2 entries for classes, functions (each group alphabetical),
/// and chunks (only when more than one exists).
pub fn build_toc(files: &mut [FileMetadata]) {
    let mut anchors = AnchorSet::new();

    for file in files.iter_mut() {
        let mut entries = Vec::new();

        let file_summary = file
            .user_summary
            .clone()
            .or_else(|| (!file.purpose.is_empty()).then(|| file.purpose.clone()));
        entries.push(TOCEntry {
            title: file.file_name.clone(),
            level: 1,
            anchor: anchors.unique(&slugify(&file.file_name)),
            summary: file_summary,
        });

        let mut class_names: Vec<&str> = file
            .analysis
            .entities
            .iter()
            .filter(|e| e.kind == EntityKind::Class)
            .map(|e| e.name.as_str())
            .collect();
        class_names.sort_unstable();
        for name in class_names {
            entries.push(TOCEntry {
                title: name.to_string(),
                level: 2,
                anchor: anchors.unique(&slugify(&format!("{}-class-{}", file.file_name, name))),
                summary: None,
            });
        }

        let mut function_names: Vec<&str> = file
            .analysis
            .entities
            .iter()
            .filter(|e| e.kind == EntityKind::Function)
            .map(|e| e.name.as_str())
            .collect();
        function_names.sort_unstable();
        for name in function_names {
            entries.push(TOCEntry {
                title: name.to_string(),
                level: 2,
                anchor: anchors.unique(&slugify(&format!("{}-fn-{}", file.file_name, name))),
                summary: None,
            });
        }

        if file.chunks.len() > 1 {
            for (idx, chunk) in file.chunks.iter().enumerate() {
                entries.push(TOCEntry {
                    title: chunk.summary.clone(),
                    level: 2,
                    anchor: anchors
                        .unique(&slugify(&format!("{}-chunk-{}", file.file_name, idx + 1))),
                    summary: None,
                });
            }
        }

        file.toc_entries = entries;
    }
}
