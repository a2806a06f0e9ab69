use crate::analysis::{AnalysisStatus, UNPARSED_SUMMARY};
use crate::error::{AppError, Result};
use crate::metadata::{FileMetadata, TOCEntry};
use crate::toc::slugify;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    PlainText,
    Markdown,
    Html,
}

impl FromStr for OutputFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "plaintext" | "plain" | "text" => Ok(OutputFormat::PlainText),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "html" => Ok(OutputFormat::Html),
            other => Err(AppError::InvalidArgument(format!(
                "Unknown output format '{}'. Use plaintext, markdown or html.",
                other
            ))),
        }
    }
}

impl OutputFormat {
    pub fn formatter(&self, extra_spacing: bool) -> Box<dyn Formatter> {
        match self {
            OutputFormat::PlainText => Box::new(PlainTextFormatter { extra_spacing }),
            OutputFormat::Markdown => Box::new(MarkdownFormatter { extra_spacing }),
            OutputFormat::Html => Box::new(HtmlFormatter { extra_spacing }),
        }
    }
}

/// Renders the ordered, TOC-populated file list into one document string.
/// Formatters differ only in syntax and escaping; each file renders
/// independently and linearly.
pub trait Formatter {
    fn format(&self, files: &[FileMetadata]) -> String;
}

/// One renderable source block: the whole file, or one chunk with its
/// chunk-count and line-range header.
struct ChunkView<'a> {
    content: &'a str,
    header: Option<String>,
}

fn chunk_views(file: &FileMetadata) -> Vec<ChunkView<'_>> {
    match file.chunks.len() {
        0 => vec![ChunkView {
            content: &file.content,
            header: None,
        }],
        1 => vec![ChunkView {
            content: &file.chunks[0].content,
            header: None,
        }],
        total => file
            .chunks
            .iter()
            .enumerate()
            .map(|(i, c)| ChunkView {
                content: &c.content,
                header: Some(format!("Chunk {}/{}: {}", i + 1, total, c.summary)),
            })
            .collect(),
    }
}

/// Flat structural-analysis lines shared by every formatter. Empty for
/// languages without a parser; the sentinel line when parsing failed.
fn structural_summary_lines(file: &FileMetadata) -> Vec<String> {
    match file.analysis.status {
        AnalysisStatus::Failed => vec![UNPARSED_SUMMARY.to_string()],
        AnalysisStatus::Unsupported => Vec::new(),
        AnalysisStatus::Parsed => {
            let mut lines = Vec::new();
            for entity in &file.analysis.entities {
                let signature = entity.signature.as_deref().unwrap_or("");
                lines.push(format!(
                    "{} {}{} (line {})",
                    entity.kind.as_str(),
                    entity.name,
                    signature,
                    entity.line
                ));
            }
            for decorator in &file.analysis.decorators {
                lines.push(format!("decorator {}", decorator));
            }
            for todo in &file.analysis.todos {
                lines.push(format!("{} (line {}): {}", todo.kind, todo.line, todo.text));
            }
            lines
        }
    }
}

fn file_anchor(file: &FileMetadata) -> String {
    file.toc_entries
        .first()
        .map(|e| e.anchor.clone())
        .unwrap_or_else(|| slugify(&file.file_name))
}

/// Anchor of chunk `idx`, present only when the file has multiple chunks.
/// Chunk entries are always the tail of a file's TOC entry list.
fn chunk_anchor(file: &FileMetadata, idx: usize) -> Option<&str> {
    if file.chunks.len() < 2 {
        return None;
    }
    let start = file.toc_entries.len().checked_sub(file.chunks.len())?;
    file.toc_entries.get(start + idx).map(|e| e.anchor.as_str())
}

fn metadata_rows(file: &FileMetadata) -> Vec<(&'static str, String)> {
    let mut rows = vec![
        ("Language", file.language_id.clone()),
        ("Size", format!("{} bytes", file.size)),
        ("Last Modified", file.last_modified.clone()),
        ("Path", file.relative_path.clone()),
    ];
    if let Some(chunk_info) = &file.chunk_info {
        rows.push(("Chunks", chunk_info.clone()));
    }
    rows
}

const SEPARATOR_WIDTH: usize = 79;

pub struct PlainTextFormatter {
    extra_spacing: bool,
}

impl Formatter for PlainTextFormatter {
    fn format(&self, files: &[FileMetadata]) -> String {
        let separator = "=".repeat(SEPARATOR_WIDTH);
        let mut output: Vec<String> = Vec::new();

        output.push(format!("//{}", separator));
        output.push("// Table of Contents".to_string());
        output.push(format!("//{}", separator));
        for entry in files.iter().flat_map(|f| &f.toc_entries) {
            let indent = "  ".repeat(entry.level.saturating_sub(1));
            match &entry.summary {
                Some(summary) => output.push(format!("// {}{} - {}", indent, entry.title, summary)),
                None => output.push(format!("// {}{}", indent, entry.title)),
            }
        }

        for file in files {
            output.push(format!("\n//{}", separator));
            output.push(format!("// File: {}", file.file_name));
            output.push(format!("//{}", separator));
            output.push(String::new());

            output.push(format!("// Purpose: {}", file.purpose));
            output.push(format!("// Directory Context: {}", file.directory_context));
            if !file.dependencies.is_empty() {
                output.push("// Dependencies:".to_string());
                for dep in &file.dependencies {
                    output.push(format!("//   - {}", dep));
                }
            }
            let summary_lines = structural_summary_lines(file);
            if !summary_lines.is_empty() {
                output.push("// Structural Analysis:".to_string());
                for line in summary_lines {
                    output.push(format!("//   - {}", line));
                }
            }
            if let Some(user_summary) = &file.user_summary {
                output.push("// User Summary:".to_string());
                for line in user_summary.lines() {
                    output.push(format!("//   {}", line));
                }
            }
            output.push(String::new());

            output.push("// File Metadata".to_string());
            output.push("// -------------".to_string());
            for (key, value) in metadata_rows(file) {
                output.push(format!("// {}: {}", key, value));
            }
            output.push(String::new());
            output.push(format!("//{}", separator));

            for view in chunk_views(file) {
                if self.extra_spacing {
                    output.push(String::new());
                }
                if let Some(header) = &view.header {
                    output.push(format!("// {}", header));
                }
                output.push(view.content.to_string());
                if self.extra_spacing {
                    output.push(String::new());
                }
                output.push(format!("//{}\n", separator));
            }
        }

        output.join("\n")
    }
}

pub struct MarkdownFormatter {
    extra_spacing: bool,
}

impl Formatter for MarkdownFormatter {
    fn format(&self, files: &[FileMetadata]) -> String {
        let mut output: Vec<String> = vec!["# Aggregated Files\n".to_string()];

        output.push("## Table of Contents\n".to_string());
        for entry in files.iter().flat_map(|f| &f.toc_entries) {
            let indent = "  ".repeat(entry.level.saturating_sub(1));
            let line = match &entry.summary {
                Some(summary) => format!(
                    "{}- [{}](#{}) - {}",
                    indent, entry.title, entry.anchor, summary
                ),
                None => format!("{}- [{}](#{})", indent, entry.title, entry.anchor),
            };
            output.push(line);
        }
        output.push(String::new());

        for file in files {
            if self.extra_spacing {
                output.push(String::new());
            }
            output.push(format!("<a id=\"{}\"></a>", file_anchor(file)));
            output.push(format!("## {}\n", file.file_name));

            output.push("### File Purpose\n".to_string());
            output.push(format!("{}\n", file.purpose));

            output.push("### Directory Context\n".to_string());
            output.push(format!("{}\n", file.directory_context));

            if !file.dependencies.is_empty() {
                output.push("### Dependencies\n".to_string());
                for dep in &file.dependencies {
                    output.push(format!("- {}", dep));
                }
                output.push(String::new());
            }

            let summary_lines = structural_summary_lines(file);
            if !summary_lines.is_empty() {
                output.push("### Structural Analysis\n".to_string());
                for line in summary_lines {
                    output.push(format!("- {}", line));
                }
                output.push(String::new());
            }

            output.push("<details><summary>File Metadata</summary>\n".to_string());
            output.push("| Property | Value |".to_string());
            output.push("|----------|--------|".to_string());
            for (key, value) in metadata_rows(file) {
                output.push(format!("| {} | {} |", key, value));
            }
            output.push(String::new());
            output.push("</details>\n".to_string());

            if let Some(user_summary) = &file.user_summary {
                output.push("### User Summary\n".to_string());
                output.push(format!("{}\n", user_summary));
            }

            for (idx, view) in chunk_views(file).iter().enumerate() {
                if let Some(header) = &view.header {
                    if let Some(anchor) = chunk_anchor(file, idx) {
                        output.push(format!("<a id=\"{}\"></a>", anchor));
                    }
                    output.push(format!("**{}**\n", header));
                }
                output.push(format!("```{}", file.language_id));
                output.push(view.content.to_string());
                output.push("```".to_string());
                output.push(String::new());
            }
        }

        output.join("\n")
    }
}

pub struct HtmlFormatter {
    extra_spacing: bool,
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#039;")
}

impl Formatter for HtmlFormatter {
    fn format(&self, files: &[FileMetadata]) -> String {
        let mut output: Vec<String> = vec![
            "<!DOCTYPE html>".to_string(),
            "<html>".to_string(),
            "<head>".to_string(),
            "<meta charset=\"utf-8\">".to_string(),
            "<title>Aggregated Files</title>".to_string(),
            "<style>".to_string(),
            "body { font-family: system-ui, -apple-system, sans-serif; line-height: 1.5; max-width: 1200px; margin: 0 auto; padding: 2rem; }".to_string(),
            ".file-section { margin: 2em 0; }".to_string(),
            ".file-title { color: #333; border-bottom: 2px solid #eee; padding-bottom: 0.5em; }".to_string(),
            ".file-metadata table { border-collapse: collapse; width: 100%; margin-bottom: 1em; }".to_string(),
            ".file-metadata th, .file-metadata td { padding: 0.5em; text-align: left; border: 1px solid #ddd; }".to_string(),
            ".file-metadata th { background: #f5f5f5; }".to_string(),
            "pre { background: #f6f8fa; padding: 1em; border-radius: 6px; overflow-x: auto; }".to_string(),
            "</style>".to_string(),
            "</head>".to_string(),
            "<body>".to_string(),
            "<h1>Aggregated Files</h1>".to_string(),
        ];

        output.push("<h2>Table of Contents</h2>".to_string());
        output.push("<ul>".to_string());
        let entries: Vec<&TOCEntry> = files.iter().flat_map(|f| &f.toc_entries).collect();
        let mut nested = false;
        for (i, entry) in entries.iter().enumerate() {
            if entry.level > 1 && !nested {
                output.push("<ul>".to_string());
                nested = true;
            }
            let label = escape_html(&entry.title);
            let item = match &entry.summary {
                Some(summary) => format!(
                    "<li><a href=\"#{}\">{}</a> - {}</li>",
                    entry.anchor,
                    label,
                    escape_html(summary)
                ),
                None => format!("<li><a href=\"#{}\">{}</a></li>", entry.anchor, label),
            };
            output.push(item);
            let next_level = entries.get(i + 1).map(|e| e.level).unwrap_or(1);
            if nested && next_level == 1 {
                output.push("</ul>".to_string());
                nested = false;
            }
        }
        if nested {
            output.push("</ul>".to_string());
        }
        output.push("</ul>".to_string());

        for file in files {
            if self.extra_spacing {
                output.push(String::new());
            }
            output.push(format!(
                "<div class=\"file-section\" id=\"{}\">",
                file_anchor(file)
            ));
            output.push(format!(
                "<h2 class=\"file-title\">{}</h2>",
                escape_html(&file.file_name)
            ));
            output.push(format!(
                "<p><strong>Purpose:</strong> {}</p>",
                escape_html(&file.purpose)
            ));
            output.push(format!(
                "<p><strong>Directory Context:</strong> {}</p>",
                escape_html(&file.directory_context)
            ));

            if !file.dependencies.is_empty() {
                output.push("<div class=\"dependencies\"><strong>Dependencies:</strong><ul>".to_string());
                for dep in &file.dependencies {
                    output.push(format!("<li>{}</li>", escape_html(dep)));
                }
                output.push("</ul></div>".to_string());
            }

            let summary_lines = structural_summary_lines(file);
            if !summary_lines.is_empty() {
                output.push(
                    "<div class=\"structural-analysis\"><strong>Structural Analysis:</strong><ul>"
                        .to_string(),
                );
                for line in summary_lines {
                    output.push(format!("<li>{}</li>", escape_html(&line)));
                }
                output.push("</ul></div>".to_string());
            }

            output.push("<div class=\"file-metadata\">".to_string());
            output.push("<table>".to_string());
            output.push("<tr><th>Property</th><th>Value</th></tr>".to_string());
            for (key, value) in metadata_rows(file) {
                output.push(format!(
                    "<tr><td>{}</td><td>{}</td></tr>",
                    key,
                    escape_html(&value)
                ));
            }
            output.push("</table>".to_string());
            output.push("</div>".to_string());

            if let Some(user_summary) = &file.user_summary {
                output.push(format!(
                    "<p><strong>User Summary:</strong> {}</p>",
                    escape_html(user_summary)
                ));
            }

            for (idx, view) in chunk_views(file).iter().enumerate() {
                match (&view.header, chunk_anchor(file, idx)) {
                    (Some(header), Some(anchor)) => {
                        output.push(format!("<div class=\"chunk\" id=\"{}\">", anchor));
                        output.push(format!("<h3>{}</h3>", escape_html(header)));
                    }
                    _ => output.push("<div class=\"chunk\">".to_string()),
                }
                output.push(format!(
                    "<pre><code class=\"language-{}\">",
                    file.language_id
                ));
                output.push(escape_html(view.content));
                output.push("</code></pre>".to_string());
                output.push("</div>".to_string());
            }
            output.push("</div>".to_string());
        }

        output.push("</body>".to_string());
        output.push("</html>".to_string());
        output.join("\n")
    }
}
