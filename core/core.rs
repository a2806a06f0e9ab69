pub mod aggregate;
pub mod analysis;
pub mod chunking;
pub mod config;
pub mod directory;
pub mod error;
pub mod gather;
pub mod language;
pub mod metadata;
pub mod output_formats;
pub mod toc;
pub mod tracking;

pub use aggregate::{AggregateOutput, aggregate};
pub use analysis::{AnalysisStatus, Entity, EntityKind, FileAnalysis, analyze_structure};
pub use chunking::{ChunkMode, should_chunk, split_into_chunks};
pub use config::Config;
pub use directory::{DirectoryMetadata, create_directory_summary};
pub use error::{AppError, Result};
pub use gather::{BuiltinIgnores, FileInfo, gather_files, get_builtin_ignore_patterns};
pub use language::language_from_path;
pub use metadata::{ChangeType, ChunkMetadata, FileChange, FileMetadata, TOCEntry};
pub use output_formats::{Formatter, OutputFormat};
pub use toc::{AnchorSet, build_toc, slugify};
pub use tracking::ChangeTracker;
