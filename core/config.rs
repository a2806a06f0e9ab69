use crate::chunking::ChunkMode;
use crate::error::{AppError, Result};
use byte_unit::Byte;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_CONFIG_FILENAME: &str = "sourcepack.toml";
pub const IGNORE_FILENAME: &str = ".sourcepackignore";
pub const CACHE_FILENAME: &str = ".sourcepack-cache.json";
pub const NOTES_SUFFIX: &str = "notes";
pub const NOTES_DIR: &str = ".notes";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FilterConfig {
    #[serde(default = "default_true")]
    pub use_builtin_ignores: bool,
    /// Substrings matched anywhere in the absolute path.
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ChunkingConfig {
    /// Lines per chunk; 0 disables chunking entirely.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Byte budget per chunk as a human size ("64KB"). Takes precedence
    /// over `chunk_size` when set.
    #[serde(default)]
    pub byte_budget: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Module prefixes whose `from X import Y` dependencies keep the fully
    /// qualified `X.Y` form instead of collapsing to `X`.
    #[serde(default = "default_preserve_prefixes")]
    pub preserve_prefixes: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TrackingConfig {
    #[serde(default = "default_false")]
    pub enabled: bool,
    /// Skip structural analysis and rendering for files whose content hash
    /// is unchanged since the previous run. Implies `enabled`.
    #[serde(default = "default_false")]
    pub incremental: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default = "default_true")]
    pub extra_spacing: bool,
}

fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_format() -> String {
    "plaintext".to_string()
}
fn default_chunk_size() -> usize {
    2000
}
fn default_max_file_size() -> u64 {
    10 * 1024 * 1024
}
fn default_preserve_prefixes() -> Vec<String> {
    vec!["config".to_string()]
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            use_builtin_ignores: default_true(),
            exclude: Vec::new(),
            max_file_size: default_max_file_size(),
        }
    }
}
impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            byte_budget: None,
        }
    }
}
impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            preserve_prefixes: default_preserve_prefixes(),
        }
    }
}
impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            enabled: default_false(),
            incremental: default_false(),
        }
    }
}
impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            extra_spacing: default_true(),
        }
    }
}

impl Config {
    pub fn determine_project_root(cli_project_root: Option<&PathBuf>) -> Result<PathBuf> {
        let path_str_opt = cli_project_root
            .map(|p| p.to_string_lossy().to_string())
            .or_else(|| env::var("SOURCEPACK_ROOT").ok().filter(|s| !s.is_empty()));

        let path_to_resolve = match path_str_opt {
            Some(p_str) => PathBuf::from(shellexpand::tilde(&p_str).as_ref()),
            None => env::current_dir().map_err(AppError::Io)?,
        };

        path_to_resolve.canonicalize().map_err(|e| {
            AppError::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to canonicalize project root '{}': {}",
                    path_to_resolve.display(),
                    e
                ),
            ))
        })
    }

    pub fn resolve_config_path(
        project_root: &Path,
        cli_config_file: Option<&String>,
        cli_disable_config: bool,
    ) -> Result<Option<PathBuf>> {
        if cli_disable_config {
            log::debug!("Config file loading disabled via CLI flag.");
            return Ok(None);
        }

        match cli_config_file {
            Some(p_str) => {
                let expanded = shellexpand::tilde(p_str);
                let path = PathBuf::from(expanded.as_ref());
                let path = if path.is_absolute() {
                    path
                } else {
                    project_root.join(path)
                };
                if !path.exists() {
                    return Err(AppError::Config(format!(
                        "Specified config file not found at path: {}",
                        path.display()
                    )));
                }
                log::debug!("Using specified config file path: {}", path.display());
                Ok(Some(path))
            }
            None => {
                let default_path = project_root.join(DEFAULT_CONFIG_FILENAME);
                if default_path.exists() {
                    log::debug!("Using default config file path: {}", default_path.display());
                    Ok(Some(default_path))
                } else {
                    log::debug!(
                        "No config file specified and default not found at: {}",
                        default_path.display()
                    );
                    Ok(None)
                }
            }
        }
    }

    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        log::info!("Loading configuration from: {}", config_path.display());
        let toml_content = fs::read_to_string(config_path).map_err(|e| AppError::FileRead {
            path: config_path.to_path_buf(),
            source: e,
        })?;
        toml::from_str::<Config>(&toml_content).map_err(|e| {
            AppError::TomlParse(format!(
                "Error parsing config file '{}': {}. Check TOML syntax and structure.",
                config_path.display(),
                e
            ))
        })
    }

    /// Effective chunking mode, or None when chunking is disabled.
    pub fn chunk_mode(&self) -> Result<Option<ChunkMode>> {
        if let Some(budget_str) = self.chunking.byte_budget.as_deref() {
            let byte_value = Byte::from_str(budget_str).map_err(|e| {
                AppError::Chunking(format!(
                    "Invalid chunk byte budget '{}': {}. Use KB, MB, etc.",
                    budget_str, e
                ))
            })?;
            let budget: u128 = byte_value.into();
            let budget = usize::try_from(budget).map_err(|_| {
                AppError::Chunking(
                    "Chunk byte budget exceeds maximum usize value on this platform.".to_string(),
                )
            })?;
            if budget == 0 {
                return Err(AppError::Chunking(
                    "Chunk byte budget must be greater than 0 bytes".to_string(),
                ));
            }
            return Ok(Some(ChunkMode::Bytes(budget)));
        }
        if self.chunking.chunk_size == 0 {
            return Ok(None);
        }
        Ok(Some(ChunkMode::Lines(self.chunking.chunk_size)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_plaintext_and_line_chunking() {
        let config = Config::default();
        assert_eq!(config.output.format, "plaintext");
        assert_eq!(
            config.chunk_mode().unwrap(),
            Some(ChunkMode::Lines(default_chunk_size()))
        );
    }

    #[test]
    fn chunk_size_zero_disables_chunking() {
        let mut config = Config::default();
        config.chunking.chunk_size = 0;
        assert_eq!(config.chunk_mode().unwrap(), None);
    }

    #[test]
    fn byte_budget_takes_precedence_over_line_count() {
        let mut config = Config::default();
        config.chunking.byte_budget = Some("2KB".to_string());
        assert_eq!(config.chunk_mode().unwrap(), Some(ChunkMode::Bytes(2000)));
    }

    #[test]
    fn invalid_byte_budget_is_rejected() {
        let mut config = Config::default();
        config.chunking.byte_budget = Some("lots".to_string());
        assert!(config.chunk_mode().is_err());
    }

    #[test]
    fn config_parses_from_toml() {
        let config: Config = toml::from_str(
            r#"
            [filter]
            exclude = ["generated"]
            max_file_size = 1024

            [chunking]
            chunk_size = 50

            [tracking]
            enabled = true

            [output]
            format = "markdown"
            extra_spacing = false
            "#,
        )
        .unwrap();
        assert_eq!(config.filter.exclude, vec!["generated".to_string()]);
        assert_eq!(config.filter.max_file_size, 1024);
        assert_eq!(config.chunking.chunk_size, 50);
        assert!(config.tracking.enabled);
        assert_eq!(config.output.format, "markdown");
        assert!(!config.output.extra_spacing);
    }
}
