use sourcepack_core::{ChangeType, Config, aggregate};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn markdown_config() -> Config {
    let mut config = Config::default();
    config.output.format = "markdown".to_string();
    config
}

#[test]
fn two_module_project_renders_sections_dependencies_and_exact_source() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    let main_src = "import utils\n\ndef main():\n    print(\"Hello World\")\n\nif __name__ == \"__main__\":\n    main()\n";
    write(root, "main.py", main_src);
    write(root, "utils.py", "def helper():\n    return \"Helper function\"\n");

    let output = aggregate(root, &markdown_config()).unwrap();
    let doc = &output.document;

    assert_eq!(output.file_count, 2);
    assert!(doc.contains("## Table of Contents"));
    assert!(doc.contains("## main.py"));
    assert!(doc.contains("## utils.py"));
    assert!(doc.contains("- utils"));
    assert!(doc.contains("Script entry point (__main__ guard)"));
    assert!(doc.contains(&format!("```python\n{}", main_src)));
    assert!(doc.contains("def helper():\n    return \"Helper function\"\n"));
    // Files render in lexicographic path order.
    assert!(doc.find("## main.py").unwrap() < doc.find("## utils.py").unwrap());
}

#[test]
fn six_hundred_lines_at_fifty_line_windows_yield_twelve_chunks() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    let content: String = (1..=600)
        .map(|i| format!("value_{} = {}\n", i, i))
        .collect();
    write(root, "big.py", &content);

    let mut config = markdown_config();
    config.chunking.chunk_size = 50;

    let output = aggregate(root, &config).unwrap();
    let doc = &output.document;

    assert!(doc.contains("| Chunks | 12 chunks |"));
    assert!(doc.contains("**Chunk 1/12: Lines 1-50**"));
    assert!(doc.contains("**Chunk 12/12: Lines 551-600**"));
    assert!(!doc.contains("Chunk 13/12"));
}

#[test]
fn ignore_rules_remove_matches_while_siblings_remain() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write(root, ".sourcepackignore", "*.tmp\n/build/\n");
    write(root, "keep.py", "keep = True\n");
    write(root, "scratch.tmp", "scratch\n");
    write(root, "build/generated.py", "generated = True\n");

    let output = aggregate(root, &markdown_config()).unwrap();
    let doc = &output.document;

    assert!(doc.contains("## keep.py"));
    assert!(!doc.contains("scratch.tmp"));
    assert!(!doc.contains("generated.py"));
}

#[test]
fn change_tracking_round_trip_classifies_runs() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write(root, "a.py", "a = 1\n");
    write(root, "b.py", "b = 2\n");

    let mut config = markdown_config();
    config.tracking.enabled = true;

    let first = aggregate(root, &config).unwrap();
    assert_eq!(first.changes.len(), 2);
    assert!(
        first
            .changes
            .iter()
            .all(|c| c.change_type == ChangeType::Added)
    );

    let second = aggregate(root, &config).unwrap();
    assert!(second.changes.is_empty());

    write(root, "a.py", "a = 2\n");
    let third = aggregate(root, &config).unwrap();
    assert_eq!(third.changes.len(), 1);
    assert_eq!(third.changes[0].file_path, "a.py");
    assert_eq!(third.changes[0].change_type, ChangeType::Modified);

    fs::remove_file(root.join("b.py")).unwrap();
    let fourth = aggregate(root, &config).unwrap();
    assert_eq!(fourth.changes.len(), 1);
    assert_eq!(fourth.changes[0].file_path, "b.py");
    assert_eq!(fourth.changes[0].change_type, ChangeType::Removed);
}

#[test]
fn incremental_mode_skips_unchanged_files_entirely() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write(root, "a.py", "a = 1\n");
    write(root, "b.py", "b = 2\n");

    let mut config = markdown_config();
    config.tracking.enabled = true;
    config.tracking.incremental = true;

    let first = aggregate(root, &config).unwrap();
    assert_eq!(first.file_count, 2);

    let second = aggregate(root, &config).unwrap();
    assert_eq!(second.file_count, 0);
    assert!(second.changes.is_empty());

    write(root, "a.py", "a = 3\n");
    let third = aggregate(root, &config).unwrap();
    assert_eq!(third.file_count, 1);
    assert!(third.document.contains("## a.py"));
    assert!(!third.document.contains("## b.py"));
}

#[test]
fn shared_base_names_keep_anchors_unique() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write(root, "alpha/util.py", "def alpha_util():\n    pass\n");
    write(root, "beta/util.py", "def beta_util():\n    pass\n");

    let mut config = markdown_config();
    config.output.format = "html".to_string();

    let output = aggregate(root, &config).unwrap();
    let doc = &output.document;

    assert!(doc.contains("id=\"util-py\""));
    assert!(doc.contains("id=\"util-py-2\""));
    assert_eq!(doc.matches("id=\"util-py\"").count(), 1);
}

#[test]
fn plaintext_format_renders_banner_sections_per_file() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write(root, "solo.py", "# A tiny module\nx = 1\n");

    let output = aggregate(root, &Config::default()).unwrap();
    let doc = &output.document;

    let banner = format!("//{}", "=".repeat(79));
    assert!(doc.contains(&banner));
    assert!(doc.contains("// File: solo.py"));
    assert!(doc.contains("// Purpose: A tiny module"));
    assert!(doc.contains("// Language: python"));
    assert!(doc.contains("x = 1"));
}

#[test]
fn user_summaries_flow_from_sidecars_into_the_document() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write(root, "svc.py", "def serve():\n    pass\n");
    write(root, "svc.py.notes", "Deployed to the edge tier.\n");

    let output = aggregate(root, &markdown_config()).unwrap();
    assert!(output.document.contains("### User Summary"));
    assert!(output.document.contains("Deployed to the edge tier."));
    // The sidecar itself is not aggregated as a content file.
    assert_eq!(output.file_count, 1);
}

#[test]
fn non_directory_root_is_a_fatal_configuration_error() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("not_a_dir.txt");
    fs::write(&file, "x").unwrap();
    assert!(aggregate(&file, &Config::default()).is_err());
    assert!(aggregate(&tmp.path().join("missing"), &Config::default()).is_err());
}
