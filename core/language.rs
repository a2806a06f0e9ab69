use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::Path;

pub const FALLBACK_LANGUAGE: &str = "plaintext";

static LANGUAGE_MAP: Lazy<HashMap<String, String>> = Lazy::new(|| {
    let yaml_content = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../data/languages.yaml"
    ));
    serde_yml::from_str(yaml_content).expect("Failed to parse embedded data/languages.yaml")
});

/// Map a file's extension (case-insensitive) to a language identifier.
/// Unmapped or missing extensions yield [`FALLBACK_LANGUAGE`].
pub fn language_from_path(path: &Path) -> &'static str {
    let ext = match path.extension().and_then(|e| e.to_str()) {
        Some(e) => e.to_lowercase(),
        None => return FALLBACK_LANGUAGE,
    };
    LANGUAGE_MAP
        .get(&ext)
        .map(|s| s.as_str())
        .unwrap_or(FALLBACK_LANGUAGE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_extensions() {
        assert_eq!(language_from_path(Path::new("src/main.py")), "python");
        assert_eq!(language_from_path(Path::new("lib.rs")), "rust");
        assert_eq!(language_from_path(Path::new("app.TSX")), "typescriptreact");
        assert_eq!(language_from_path(Path::new("schema.yml")), "yaml");
    }

    #[test]
    fn unknown_extensions_fall_back_to_plaintext() {
        assert_eq!(language_from_path(Path::new("notes.xyz")), "plaintext");
        assert_eq!(language_from_path(Path::new("Makefile")), "plaintext");
    }
}
