//! Configuration for the transcription pipeline.
//!
//! Configuration sources (highest priority first):
//! 1. Command-line flags (with `MEDIASCRIBE_*` environment fallbacks)
//! 2. Config file (.mediascribe/config.yaml)
//! 3. Built-in defaults
//!
//! Config file discovery:
//! - Searches the current directory and parents for .mediascribe/config.yaml
//! - Falls back to ~/.mediascribe/config.yaml
//! - Relative paths in the config file are resolved against the directory
//!   holding .mediascribe/
//!
//! The resolved configuration is immutable after startup and passed down
//! explicitly; nothing in the pipeline re-reads it from disk.

use std::path::{Path, PathBuf};

use glob::Pattern;
use serde::Deserialize;
use thiserror::Error;

/// Extensions processed when none are configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &["mp3", "wav", "mp4", "mkv", "mov", "flv", "aac", "m4a"];

/// Model identifier used when none is configured.
pub const DEFAULT_MODEL: &str = "small";

/// Files excluded from processing when no ignore list is configured:
/// dotfiles and in-flight download artifacts.
pub const DEFAULT_IGNORE: &[&str] = &["**/.*", "**/*.part", "**/*.tmp", "**/*.crdownload"];

/// Errors that can occur while resolving configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("input directory not configured (use --input, MEDIASCRIBE_INPUT_DIR, or the config file)")]
    MissingInputRoot,

    #[error("output directory not configured (use --output, MEDIASCRIBE_OUTPUT_DIR, or the config file)")]
    MissingOutputRoot,

    #[error("input directory does not exist: {}", .0.display())]
    InputRootNotFound(PathBuf),

    #[error("invalid ignore pattern {pattern:?}: {source}")]
    BadIgnorePattern {
        pattern: String,
        source: glob::PatternError,
    },

    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    /// Directory to watch (relative to the config file's parent directory)
    pub input: Option<PathBuf>,

    /// Directory receiving transcripts
    pub output: Option<PathBuf>,

    /// Extensions to process
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Model identifier handed to the engine
    pub model: Option<String>,

    /// Spoken-language hint for the engine
    pub language: Option<String>,

    /// Explicit whisper binary location
    pub whisper_path: Option<PathBuf>,

    /// Glob patterns excluded from processing
    pub ignore: Option<Vec<String>>,
}

/// Values supplied on the command line or via `MEDIASCRIBE_*` env vars.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub extensions: Option<Vec<String>>,
    pub model: Option<String>,
    pub language: Option<String>,
    pub whisper_path: Option<PathBuf>,
}

/// Resolved configuration, read-only for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Root directory watched for media files
    pub input_root: PathBuf,

    /// Root directory mirroring the input tree as transcripts
    pub output_root: PathBuf,

    /// Normalized extensions: lowercase, no leading dot
    pub extensions: Vec<String>,

    /// Model identifier handed to the engine
    pub model: String,

    /// Spoken-language hint for the engine
    pub language: Option<String>,

    /// Explicit whisper binary (engine falls back to WHISPER_PATH)
    pub whisper_path: Option<PathBuf>,

    /// Compiled ignore patterns
    pub ignore_patterns: Vec<Pattern>,

    /// Path to the config file (if found)
    pub config_file: Option<PathBuf>,
}

impl PipelineConfig {
    /// Resolve configuration from all sources.
    pub fn resolve(overrides: Overrides) -> Result<Self, ConfigError> {
        Self::resolve_with(overrides, find_config_file())
    }

    fn resolve_with(
        overrides: Overrides,
        config_file: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let (file, base_dir) = match &config_file {
            Some(path) => {
                let file = load_config_file(path)?;
                // Paths in the file are relative to the directory holding .mediascribe/
                let base = path
                    .parent()
                    .and_then(|p| p.parent())
                    .map(Path::to_path_buf);
                (file, base)
            }
            None => (ConfigFile::default(), None),
        };

        let input_root = overrides
            .input
            .or_else(|| {
                file.input
                    .as_deref()
                    .map(|p| resolve_path(base_dir.as_deref(), p))
            })
            .ok_or(ConfigError::MissingInputRoot)?;

        let output_root = overrides
            .output
            .or_else(|| {
                file.output
                    .as_deref()
                    .map(|p| resolve_path(base_dir.as_deref(), p))
            })
            .ok_or(ConfigError::MissingOutputRoot)?;

        let extensions: Vec<String> = overrides
            .extensions
            .or_else(|| (!file.extensions.is_empty()).then_some(file.extensions))
            .unwrap_or_else(|| DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect())
            .iter()
            .map(|e| normalize_extension(e))
            .filter(|e| !e.is_empty())
            .collect();

        let ignore_patterns = file
            .ignore
            .unwrap_or_else(|| DEFAULT_IGNORE.iter().map(|p| p.to_string()).collect())
            .into_iter()
            .map(|p| {
                Pattern::new(&p)
                    .map_err(|source| ConfigError::BadIgnorePattern { pattern: p, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            input_root,
            output_root,
            extensions,
            model: overrides
                .model
                .or(file.model)
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            language: overrides.language.or(file.language),
            whisper_path: overrides.whisper_path.or(file.whisper_path),
            ignore_patterns,
            config_file,
        })
    }

    /// Check that the input root exists. Fatal at startup when it fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.input_root.is_dir() {
            return Err(ConfigError::InputRootNotFound(self.input_root.clone()));
        }
        Ok(())
    }

    /// Check if a path carries one of the configured extensions.
    pub fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }

    /// Check if a path matches any ignore pattern.
    ///
    /// Patterns apply to the path relative to the input root, so a dotted
    /// directory above the root never hides the whole tree.
    pub fn is_ignored(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.input_root).unwrap_or(path);
        self.ignore_patterns.iter().any(|p| p.matches_path(relative))
    }

    /// Uniform admission policy: the backlog scan and the watch path both
    /// go through this single predicate.
    pub fn eligible(&self, path: &Path) -> bool {
        self.is_supported(path) && !self.is_ignored(path)
    }
}

/// Lowercase, without a leading dot: ".MP3" and "mp3" configure the same thing.
fn normalize_extension(raw: &str) -> String {
    raw.trim().trim_start_matches('.').to_ascii_lowercase()
}

/// Find config file by searching current directory and parents, then home
fn find_config_file() -> Option<PathBuf> {
    if let Ok(mut current) = std::env::current_dir() {
        loop {
            let candidate = current.join(".mediascribe").join("config.yaml");
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                break;
            }
        }
    }

    dirs::home_dir()
        .map(|home| home.join(".mediascribe").join("config.yaml"))
        .filter(|p| p.exists())
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolve a path that may be relative to the config file's base directory
fn resolve_path(base: Option<&Path>, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        match base {
            Some(base) => base.join(path),
            None => path.to_path_buf(),
        }
    }
}
