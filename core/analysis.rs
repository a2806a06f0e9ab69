use crate::config::AnalysisConfig;
use crate::error::{AppError, Result};
use indexmap::IndexSet;
use once_cell::sync::Lazy;
use regex::Regex;

/// Rendered in place of the entity summary when structural parsing fails.
pub const UNPARSED_SUMMARY: &str = "unable to analyze";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Class,
    Function,
    NestedFunction,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Class => "class",
            EntityKind::Function => "function",
            EntityKind::NestedFunction => "nested function",
        }
    }
}

/// One declaration found in a source file. Nested functions carry an
/// `outer -> inner` name. Line numbers use the original file's numbering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub kind: EntityKind,
    pub name: String,
    pub line: usize,
    pub signature: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoMarker {
    pub kind: String,
    pub text: String,
    pub line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalysisStatus {
    /// Structural parsing ran and produced entities.
    Parsed,
    /// No structural parser exists for the language.
    #[default]
    Unsupported,
    /// A structural parser exists but could not make sense of the content.
    Failed,
}

/// The structural model of one file: computed once, stored as plain data,
/// never recomputed behind an accessor.
#[derive(Debug, Clone, Default)]
pub struct FileAnalysis {
    pub purpose: String,
    pub dependencies: IndexSet<String>,
    pub entities: Vec<Entity>,
    pub decorators: Vec<String>,
    pub todos: Vec<TodoMarker>,
    pub status: AnalysisStatus,
}

/// Structural analysis strategy for one language.
trait StructureAnalyzer: Sync {
    fn analyze(
        &self,
        content: &str,
        file_name: &str,
        config: &AnalysisConfig,
    ) -> Result<FileAnalysis>;
}

fn analyzer_for(language_id: &str) -> Option<&'static dyn StructureAnalyzer> {
    match language_id {
        "python" => Some(&PythonAnalyzer),
        _ => None,
    }
}

/// Analyze a file's structure. Languages without a structural parser get a
/// best-effort purpose and an empty dependency set; a parser failure
/// degrades to the [`UNPARSED_SUMMARY`] sentinel instead of raising.
pub fn analyze_structure(
    content: &str,
    language_id: &str,
    file_name: &str,
    config: &AnalysisConfig,
) -> FileAnalysis {
    match analyzer_for(language_id) {
        Some(analyzer) => match analyzer.analyze(content, file_name, config) {
            Ok(analysis) => analysis,
            Err(e) => {
                log::warn!("Structural analysis failed for {}: {}", file_name, e);
                FileAnalysis {
                    purpose: filename_purpose(file_name),
                    status: AnalysisStatus::Failed,
                    ..FileAnalysis::default()
                }
            }
        },
        None => fallback_analysis(content, language_id),
    }
}

fn filename_purpose(file_name: &str) -> String {
    let stem = file_name.strip_suffix(".py").unwrap_or(file_name);
    format!("Python module {}", stem)
}

/// Comment prefixes recognized for first-line purpose inference in
/// languages without a structural parser.
const COMMENT_MARKERS: &[(&str, &str)] = &[
    ("//", ""),
    ("#", ""),
    ("/*", "*/"),
    ("<!--", "-->"),
    ("--", ""),
    (";", ""),
];

fn fallback_analysis(content: &str, language_id: &str) -> FileAnalysis {
    let purpose = content
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .and_then(|first| {
            if first.starts_with("#!") {
                return None;
            }
            COMMENT_MARKERS.iter().find_map(|(prefix, suffix)| {
                first.strip_prefix(prefix).map(|rest| {
                    rest.strip_suffix(suffix)
                        .unwrap_or(rest)
                        .trim_matches(&['*', ' ', '\t'][..])
                        .to_string()
                })
            })
        })
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| format!("{} source file", language_id));

    FileAnalysis {
        purpose,
        status: AnalysisStatus::Unsupported,
        ..FileAnalysis::default()
    }
}

static FROM_IMPORT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^from\s+([.\w]+)\s+import\s+(.+)$").unwrap());
static CLASS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\s*)class\s+([A-Za-z_]\w*)").unwrap());
static DEF_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\s*)def\s+([A-Za-z_]\w*)\s*\(").unwrap());
static DECORATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*@([\w.]+)\s*(?:\((.*)\))?\s*$").unwrap());
static SIMPLE_ARGS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"^[\w\s.,'"=/\-]*$"#).unwrap());
static MAIN_GUARD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^if\s+__name__\s*==\s*['"]__main__['"]"#).unwrap());
static TODO_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"#.*?\b(TODO|FIXME):\s*(.*)$").unwrap());

struct PythonAnalyzer;

impl StructureAnalyzer for PythonAnalyzer {
    fn analyze(
        &self,
        content: &str,
        file_name: &str,
        config: &AnalysisConfig,
    ) -> Result<FileAnalysis> {
        let all_lines: Vec<&str> = content.lines().collect();
        // Parsing runs on content with leading blank lines stripped; every
        // reported line number is shifted back by this offset so it matches
        // the original numbering used in chunk headers. Interior blank runs
        // are not compensated further; entity lines after large interior
        // gaps are best-effort only.
        let offset = all_lines
            .iter()
            .take_while(|l| l.trim().is_empty())
            .count();
        let lines = &all_lines[offset..];

        let (entities, decorators) = extract_entities(lines, offset)?;
        let dependencies = extract_dependencies(lines, config);
        let todos = extract_todos(lines, offset);
        let purpose = infer_purpose(lines, file_name, &entities);

        Ok(FileAnalysis {
            purpose,
            dependencies,
            entities,
            decorators,
            todos,
            status: AnalysisStatus::Parsed,
        })
    }
}

fn correct_line(reported: usize, offset: usize) -> usize {
    reported.saturating_add(offset).max(1)
}

#[derive(Debug, PartialEq, Eq)]
enum ScopeKind {
    Class,
    Function,
}

struct Scope {
    indent: usize,
    kind: ScopeKind,
    name: String,
}

fn indent_width(ws: &str) -> usize {
    // Tabs count as a single level step; mixed indentation stays heuristic.
    ws.chars().map(|c| if c == '\t' { 4 } else { 1 }).sum()
}

fn extract_entities(lines: &[&str], offset: usize) -> Result<(Vec<Entity>, Vec<String>)> {
    let mut entities = Vec::new();
    let mut decorators = Vec::new();
    let mut scopes: Vec<Scope> = Vec::new();
    let mut in_doc: Option<&str> = None;
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        let reported_line = i + 1;

        if let Some(delim) = in_doc {
            if line.contains(delim) {
                in_doc = None;
            }
            i += 1;
            continue;
        }

        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            i += 1;
            continue;
        }
        if trimmed.starts_with("\"\"\"") || trimmed.starts_with("'''") {
            let delim = if trimmed.starts_with("\"\"\"") { "\"\"\"" } else { "'''" };
            if !trimmed[3..].contains(delim) {
                in_doc = Some(delim);
            }
            i += 1;
            continue;
        }

        if let Some(caps) = DECORATOR_RE.captures(line) {
            decorators.push(render_decorator(&caps));
            i += 1;
            continue;
        }

        if let Some(caps) = CLASS_RE.captures(line) {
            let indent = indent_width(&caps[1]);
            let name = caps[2].to_string();
            scopes.retain(|s| s.indent < indent);
            let (_, consumed) = read_header(lines, i)?;
            entities.push(Entity {
                kind: EntityKind::Class,
                name: name.clone(),
                line: correct_line(reported_line, offset),
                signature: None,
            });
            scopes.push(Scope {
                indent,
                kind: ScopeKind::Class,
                name,
            });
            i += consumed;
            continue;
        }

        if let Some(caps) = DEF_RE.captures(line) {
            let indent = indent_width(&caps[1]);
            let name = caps[2].to_string();
            scopes.retain(|s| s.indent < indent);
            let (header, consumed) = read_header(lines, i)?;
            let signature = Some(render_signature(&header));
            match scopes.last() {
                None => entities.push(Entity {
                    kind: EntityKind::Function,
                    name: name.clone(),
                    line: correct_line(reported_line, offset),
                    signature,
                }),
                Some(parent) if parent.kind == ScopeKind::Function => entities.push(Entity {
                    kind: EntityKind::NestedFunction,
                    name: format!("{} -> {}", parent.name, name),
                    line: correct_line(reported_line, offset),
                    signature,
                }),
                // Methods are structural noise at file level; they stay out
                // of the entity list but still open a scope for nesting.
                Some(_) => {}
            }
            scopes.push(Scope {
                indent,
                kind: ScopeKind::Function,
                name,
            });
            i += consumed;
            continue;
        }

        i += 1;
    }

    Ok((entities, decorators))
}

/// Accumulate a `def`/`class` header across continuation lines until the
/// terminating `:` at bracket depth zero. Errors when the header never
/// terminates, which is how malformed sources surface as analysis failures.
fn read_header(lines: &[&str], start: usize) -> Result<(String, usize)> {
    let mut header = String::new();
    let mut depth = 0i32;
    let mut in_string: Option<char> = None;

    for (consumed, line) in lines[start..].iter().enumerate() {
        if !header.is_empty() {
            header.push(' ');
        }
        let mut upto = line.len();
        for (pos, c) in line.char_indices() {
            if let Some(quote) = in_string {
                if c == quote {
                    in_string = None;
                }
                continue;
            }
            match c {
                '\'' | '"' => in_string = Some(c),
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' => depth -= 1,
                '#' => {
                    upto = pos;
                    break;
                }
                ':' if depth == 0 => {
                    header.push_str(line[..pos].trim_end());
                    return Ok((header, consumed + 1));
                }
                _ => {}
            }
        }
        header.push_str(line[..upto].trim_end());
    }

    Err(AppError::Analysis(format!(
        "definition header starting at line {} never terminates",
        start + 1
    )))
}

fn render_decorator(caps: &regex::Captures) -> String {
    let name = &caps[1];
    match caps.get(2) {
        Some(args) => {
            let args = args.as_str().trim();
            // Only literal/identifier arguments are worth reproducing;
            // arbitrary expressions collapse to the bare decorator name.
            if SIMPLE_ARGS_RE.is_match(args) {
                format!("@{}({})", name, args)
            } else {
                format!("@{}", name)
            }
        }
        None => format!("@{}", name),
    }
}

/// Collapse whitespace inside an annotation while keeping nested generics
/// intact: `Dict[str,  List[int]]` renders as `Dict[str, List[int]]`.
fn normalize_annotation(raw: &str) -> String {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    compact.replace(',', ", ")
}

fn split_top_level(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (pos, c) in s.char_indices() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            c if c == sep && depth == 0 => {
                parts.push(&s[start..pos]);
                start = pos + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

/// Render a collapsed `def` header into `(params) -> Ret` form with
/// normalized parameter and return annotations.
fn render_signature(header: &str) -> String {
    let Some(open) = header.find('(') else {
        return String::new();
    };
    let mut depth = 0i32;
    let mut close = header.len();
    for (pos, c) in header[open..].char_indices() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => {
                depth -= 1;
                if depth == 0 {
                    close = open + pos;
                    break;
                }
            }
            _ => {}
        }
    }
    let params_raw = &header[open + 1..close.min(header.len())];

    let params: Vec<String> = split_top_level(params_raw, ',')
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|param| {
            let before_default = split_top_level(param, '=')[0].trim();
            match split_top_level(before_default, ':').as_slice() {
                [name, annotation, ..] => {
                    format!("{}: {}", name.trim(), normalize_annotation(annotation))
                }
                _ => before_default.to_string(),
            }
        })
        .collect();

    let tail = &header[close.min(header.len())..];
    let ret = tail
        .find("->")
        .map(|pos| normalize_annotation(tail[pos + 2..].trim()))
        .filter(|r| !r.is_empty());

    match ret {
        Some(ret) => format!("({}) -> {}", params.join(", "), ret),
        None => format!("({})", params.join(", ")),
    }
}

/// Lines that are neither comments nor inside a docstring, with their
/// 1-based position in the trimmed content.
fn code_lines<'a>(lines: &[&'a str]) -> Vec<(usize, &'a str)> {
    let mut out = Vec::new();
    let mut in_doc: Option<&str> = None;
    for (i, line) in lines.iter().enumerate() {
        if let Some(delim) = in_doc {
            if line.contains(delim) {
                in_doc = None;
            }
            continue;
        }
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if trimmed.starts_with("\"\"\"") || trimmed.starts_with("'''") {
            let delim = if trimmed.starts_with("\"\"\"") { "\"\"\"" } else { "'''" };
            if !trimmed[3..].contains(delim) {
                in_doc = Some(delim);
            }
            continue;
        }
        out.push((i + 1, *line));
    }
    out
}

fn import_name(fragment: &str) -> Option<&str> {
    let name = fragment
        .trim()
        .trim_matches(['(', ')'])
        .split_whitespace()
        .next()?;
    let name = name.trim_matches(',');
    (!name.is_empty() && name != "*").then_some(name)
}

/// Extract import dependencies, deduplicated and emitted in sorted order.
///
/// `import x.y` contributes the top-level module; `from X import Y`
/// contributes `X`, unless `X` falls under a preserve prefix, in which case
/// the fully qualified `X.Y` is kept; relative imports contribute the
/// imported symbol itself.
fn extract_dependencies(lines: &[&str], config: &AnalysisConfig) -> IndexSet<String> {
    let mut deps: IndexSet<String> = IndexSet::new();

    for (_, line) in code_lines(lines) {
        let trimmed = line.trim();
        if let Some(caps) = FROM_IMPORT_RE.captures(trimmed) {
            let module = &caps[1];
            let names = &caps[2];
            if module.starts_with('.') {
                for fragment in names.split(',') {
                    if let Some(name) = import_name(fragment) {
                        deps.insert(name.to_string());
                    }
                }
            } else if config
                .preserve_prefixes
                .iter()
                .any(|p| module == p || module.starts_with(&format!("{}.", p)))
            {
                for fragment in names.split(',') {
                    if let Some(name) = import_name(fragment) {
                        deps.insert(format!("{}.{}", module, name));
                    }
                }
            } else {
                deps.insert(module.to_string());
            }
        } else if let Some(rest) = trimmed.strip_prefix("import ") {
            for fragment in rest.split(',') {
                if let Some(name) = import_name(fragment) {
                    let top = name.split('.').next().unwrap_or(name);
                    deps.insert(top.to_string());
                }
            }
        }
    }

    deps.sort();
    deps
}

fn extract_todos(lines: &[&str], offset: usize) -> Vec<TodoMarker> {
    let mut todos = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        if let Some(caps) = TODO_RE.captures(line) {
            todos.push(TodoMarker {
                kind: caps[1].to_string(),
                text: caps[2].trim().to_string(),
                line: correct_line(i + 1, offset),
            });
        }
    }
    todos
}

fn has_main_guard(lines: &[&str]) -> bool {
    code_lines(lines)
        .iter()
        .any(|(_, line)| MAIN_GUARD_RE.is_match(line.trim()))
}

/// Purpose priority: leading comment, module docstring, script guard,
/// test heuristic, declared entity names, filename fallback.
fn infer_purpose(lines: &[&str], file_name: &str, entities: &[Entity]) -> String {
    let mut i = 0;
    while i < lines.len() {
        let trimmed = lines[i].trim();
        if trimmed.is_empty() {
            i += 1;
            continue;
        }
        if let Some(comment) = trimmed.strip_prefix('#') {
            let comment = comment.trim();
            // Shebang and coding cookies are plumbing, not a description.
            if trimmed.starts_with("#!") || (comment.contains("coding") && i < 2) {
                i += 1;
                continue;
            }
            if !comment.is_empty() {
                return comment.to_string();
            }
            i += 1;
            continue;
        }
        break;
    }

    if let Some(doc) = module_docstring(&lines[i..]) {
        return doc;
    }

    if has_main_guard(lines) {
        return "Script entry point (__main__ guard)".to_string();
    }

    let callable_names: Vec<&str> = entities
        .iter()
        .filter(|e| e.kind != EntityKind::Class)
        .map(|e| e.name.as_str())
        .collect();
    if file_name.to_lowercase().contains("test")
        || callable_names
            .iter()
            .any(|n| n.to_lowercase().contains("test"))
    {
        return "Test module".to_string();
    }

    let class_names: Vec<&str> = entities
        .iter()
        .filter(|e| e.kind == EntityKind::Class)
        .map(|e| e.name.as_str())
        .collect();
    let function_names: Vec<&str> = entities
        .iter()
        .filter(|e| e.kind == EntityKind::Function)
        .map(|e| e.name.as_str())
        .collect();
    match (class_names.is_empty(), function_names.is_empty()) {
        (false, false) => {
            return format!(
                "Defines classes {} and functions {}",
                class_names.join(", "),
                function_names.join(", ")
            );
        }
        (false, true) => return format!("Defines classes {}", class_names.join(", ")),
        (true, false) => return format!("Defines functions {}", function_names.join(", ")),
        (true, true) => {}
    }

    filename_purpose(file_name)
}

/// First meaningful line of a module docstring opening at `lines[0]`.
fn module_docstring(lines: &[&str]) -> Option<String> {
    let first = lines.first()?.trim();
    let delim = if first.starts_with("\"\"\"") {
        "\"\"\""
    } else if first.starts_with("'''") {
        "'''"
    } else {
        return None;
    };

    let inline = &first[3..];
    if let Some(end) = inline.find(delim) {
        let text = inline[..end].trim();
        return (!text.is_empty()).then(|| text.to_string());
    }
    if !inline.trim().is_empty() {
        return Some(inline.trim().to_string());
    }
    for line in &lines[1..] {
        let trimmed = line.trim();
        if let Some(end) = trimmed.find(delim) {
            let text = trimmed[..end].trim();
            if !text.is_empty() {
                return Some(text.to_string());
            }
            return None;
        }
        if !trimmed.is_empty() {
            return Some(trimmed.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(content: &str, file_name: &str) -> FileAnalysis {
        analyze_structure(content, "python", file_name, &AnalysisConfig::default())
    }

    #[test]
    fn extracts_direct_and_from_imports() {
        let analysis = analyze(
            "import utils\nimport os.path\nfrom config import settings\nfrom helpers import a, b\n",
            "main.py",
        );
        let deps: Vec<&str> = analysis.dependencies.iter().map(String::as_str).collect();
        assert_eq!(deps, vec!["config.settings", "helpers", "os", "utils"]);
    }

    #[test]
    fn relative_imports_contribute_the_symbol_name() {
        let analysis = analyze("from . import sibling\nfrom .pkg import thing\n", "mod.py");
        let deps: Vec<&str> = analysis.dependencies.iter().map(String::as_str).collect();
        assert_eq!(deps, vec!["sibling", "thing"]);
    }

    #[test]
    fn preserve_prefixes_are_configurable() {
        let config = AnalysisConfig {
            preserve_prefixes: vec!["settings".to_string()],
        };
        let analysis = analyze_structure(
            "from config import a\nfrom settings import b\n",
            "python",
            "mod.py",
            &config,
        );
        let deps: Vec<&str> = analysis.dependencies.iter().map(String::as_str).collect();
        assert_eq!(deps, vec!["config", "settings.b"]);
    }

    #[test]
    fn dependency_extraction_is_idempotent() {
        let content = "import b\nimport a\nimport b\n";
        let first = analyze(content, "mod.py").dependencies;
        let second = analyze(content, "mod.py").dependencies;
        assert_eq!(first, second);
        let deps: Vec<&str> = first.iter().map(String::as_str).collect();
        assert_eq!(deps, vec!["a", "b"]);
    }

    #[test]
    fn finds_classes_functions_and_nested_functions() {
        let content = "\
class Widget:
    def method(self):
        pass

def outer():
    def inner():
        pass
    return inner

def standalone():
    pass
";
        let analysis = analyze(content, "widgets.py");
        let names: Vec<(EntityKind, &str)> = analysis
            .entities
            .iter()
            .map(|e| (e.kind, e.name.as_str()))
            .collect();
        assert_eq!(
            names,
            vec![
                (EntityKind::Class, "Widget"),
                (EntityKind::Function, "outer"),
                (EntityKind::NestedFunction, "outer -> inner"),
                (EntityKind::Function, "standalone"),
            ]
        );
        assert_eq!(analysis.entities[0].line, 1);
        assert_eq!(analysis.entities[1].line, 5);
    }

    #[test]
    fn leading_blank_lines_shift_entity_line_numbers() {
        let content = "\n\n\ndef late():\n    pass\n";
        let analysis = analyze(content, "late.py");
        assert_eq!(analysis.entities[0].name, "late");
        assert_eq!(analysis.entities[0].line, 4);
    }

    #[test]
    fn decorators_render_with_simple_arguments_only() {
        let content = "\
@staticmethod
@app.route('/home', methods='GET')
@register(lambda x: x + 1)
def view():
    pass
";
        let analysis = analyze(content, "views.py");
        assert_eq!(
            analysis.decorators,
            vec![
                "@staticmethod".to_string(),
                "@app.route('/home', methods='GET')".to_string(),
                "@register".to_string(),
            ]
        );
    }

    #[test]
    fn signatures_keep_nested_generic_annotations() {
        let content = "def merge(items: Dict[str, List[int]], limit: int = 10) -> Optional[str]:\n    pass\n";
        let analysis = analyze(content, "merge.py");
        assert_eq!(
            analysis.entities[0].signature.as_deref(),
            Some("(items: Dict[str, List[int]], limit: int) -> Optional[str]")
        );
    }

    #[test]
    fn multiline_headers_are_collapsed() {
        let content = "\
def build(
    name: str,
    values: List[int],
) -> Mapping[str, int]:
    pass
";
        let analysis = analyze(content, "build.py");
        assert_eq!(
            analysis.entities[0].signature.as_deref(),
            Some("(name: str, values: List[int]) -> Mapping[str, int]")
        );
    }

    #[test]
    fn todo_and_fixme_markers_carry_original_lines() {
        let content = "\n\nx = 1  # TODO: rename this\n# FIXME: remove the shim\n";
        let analysis = analyze(content, "mod.py");
        assert_eq!(analysis.todos.len(), 2);
        assert_eq!(analysis.todos[0].kind, "TODO");
        assert_eq!(analysis.todos[0].text, "rename this");
        assert_eq!(analysis.todos[0].line, 3);
        assert_eq!(analysis.todos[1].kind, "FIXME");
        assert_eq!(analysis.todos[1].line, 4);
    }

    #[test]
    fn purpose_prefers_leading_comment() {
        let content = "# Orchestrates the nightly batch run\nimport os\n";
        assert_eq!(
            analyze(content, "batch.py").purpose,
            "Orchestrates the nightly batch run"
        );
    }

    #[test]
    fn purpose_falls_back_to_docstring_after_shebang() {
        let content = "#!/usr/bin/env python3\n\"\"\"Small helper utilities.\"\"\"\n";
        assert_eq!(analyze(content, "util.py").purpose, "Small helper utilities.");
    }

    #[test]
    fn main_guard_marks_a_script() {
        let content = "import sys\n\nif __name__ == '__main__':\n    sys.exit(0)\n";
        assert_eq!(
            analyze(content, "run.py").purpose,
            "Script entry point (__main__ guard)"
        );
    }

    #[test]
    fn test_heuristic_wins_over_entity_listing() {
        let content = "def test_roundtrip():\n    pass\n";
        assert_eq!(analyze(content, "checks.py").purpose, "Test module");
        assert_eq!(analyze("x = 1\n", "test_config.py").purpose, "Test module");
    }

    #[test]
    fn purpose_names_declared_entities() {
        let content = "class Store:\n    pass\n\ndef fetch():\n    pass\n";
        assert_eq!(
            analyze(content, "store.py").purpose,
            "Defines classes Store and functions fetch"
        );
    }

    #[test]
    fn unterminated_header_degrades_to_sentinel_status() {
        let content = "def broken(\n";
        let analysis = analyze(content, "broken.py");
        assert_eq!(analysis.status, AnalysisStatus::Failed);
        assert!(analysis.dependencies.is_empty());
        assert!(analysis.entities.is_empty());
        assert_eq!(analysis.purpose, "Python module broken");
    }

    #[test]
    fn unsupported_language_takes_first_comment_as_purpose() {
        let analysis = analyze_structure(
            "// Session token refresh loop\nlet x = 1;\n",
            "javascript",
            "session.js",
            &AnalysisConfig::default(),
        );
        assert_eq!(analysis.status, AnalysisStatus::Unsupported);
        assert_eq!(analysis.purpose, "Session token refresh loop");
        assert!(analysis.dependencies.is_empty());
    }

    #[test]
    fn unsupported_language_without_comment_gets_generic_label() {
        let analysis = analyze_structure(
            "hello world\n",
            "plaintext",
            "notes.txt",
            &AnalysisConfig::default(),
        );
        assert_eq!(analysis.purpose, "plaintext source file");
    }

    #[test]
    fn docstring_bodies_do_not_leak_entities_or_imports() {
        let content = "\
\"\"\"
import fake
def not_real():
\"\"\"
import real
";
        let analysis = analyze(content, "mod.py");
        let deps: Vec<&str> = analysis.dependencies.iter().map(String::as_str).collect();
        assert_eq!(deps, vec!["real"]);
        assert!(analysis.entities.is_empty());
    }
}
