//! Configuration system: TOML file + env var overrides + smart defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{AbxError, Result};

/// File name looked up under the project root when no explicit path is given.
pub const DEFAULT_CONFIG_FILE: &str = "abi-extract.toml";

/// Full extractor configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub extract: ExtractConfig,
    pub scanner: ScannerConfig,
    pub logging: LoggingConfig,
    /// File the configuration was loaded from, if any.
    #[serde(skip)]
    pub config_file: Option<PathBuf>,
}

/// What to extract and where to put it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExtractConfig {
    /// Root of the compiled artifact tree.
    pub source_dir: PathBuf,
    /// Destination for extracted ABI files.
    pub output_dir: PathBuf,
    /// Source-path prefixes that mark first-party contracts.
    pub include_paths: Vec<String>,
    /// Substrings excluded in addition to the built-in exclude list.
    pub extra_exclude_paths: Vec<String>,
    /// Prepended to every output file name (`I` for interface-style names).
    pub name_prefix: String,
    /// Report what would be written without touching the filesystem.
    pub dry_run: bool,
    /// Run the version-suffix cleanup pass after extraction.
    pub clean_filenames: bool,
}

/// Artifact tree traversal limits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScannerConfig {
    pub max_depth: usize,
    pub follow_symlinks: bool,
}

/// Activity log settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct LoggingConfig {
    /// Append-only JSONL activity log. Disabled when unset.
    pub jsonl_log: Option<PathBuf>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("out"),
            output_dir: PathBuf::from("abis"),
            include_paths: vec!["src/".to_string()],
            extra_exclude_paths: Vec::new(),
            name_prefix: "I".to_string(),
            dry_run: false,
            clean_filenames: true,
        }
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            max_depth: 64,
            follow_symlinks: false,
        }
    }
}

impl Config {
    /// Default configuration path for a project root.
    #[must_use]
    pub fn default_path(root: &Path) -> PathBuf {
        root.join(DEFAULT_CONFIG_FILE)
    }

    /// Load config from the project's default or an explicit path, then apply env overrides.
    ///
    /// A missing file at the default path is not an error; defaults are used.
    pub fn load(root: &Path, path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(|| Self::default_path(root), Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| AbxError::Io {
                path: path_buf.clone(),
                source,
            })?;
            let mut parsed: Self = toml::from_str(&raw)?;
            parsed.config_file = Some(path_buf);
            parsed
        } else if is_explicit_path {
            return Err(AbxError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.apply_env_overrides_from(env_var)?;
        cfg.normalize();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Deterministic hash of the effective config for the activity log.
    ///
    /// FNV-1a over the canonical JSON form, stable across processes.
    pub fn stable_hash(&self) -> Result<String> {
        let canonical = serde_json::to_string(self)?;
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in canonical.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        Ok(format!("{hash:016x}"))
    }

    /// Anchor relative directories at `root`.
    ///
    /// The library never consults the process working directory; callers pick
    /// the root explicitly.
    #[must_use]
    pub fn resolve_against(mut self, root: &Path) -> Self {
        let anchor = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = root.join(&*path);
            }
        };
        anchor(&mut self.extract.source_dir);
        anchor(&mut self.extract.output_dir);
        if let Some(log) = self.logging.jsonl_log.as_mut() {
            anchor(log);
        }
        self
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        // extract
        if let Some(raw) = lookup("ABX_SOURCE_DIR") {
            self.extract.source_dir = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("ABX_OUTPUT_DIR") {
            self.extract.output_dir = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("ABX_INCLUDE_PATHS") {
            self.extract.include_paths = parse_env_list(&raw);
        }
        if let Some(raw) = lookup("ABX_EXTRA_EXCLUDE_PATHS") {
            self.extract.extra_exclude_paths = parse_env_list(&raw);
        }
        if let Some(raw) = lookup("ABX_NAME_PREFIX") {
            // "-" spells an empty prefix, since blank variables are ignored.
            self.extract.name_prefix = if raw.trim() == "-" {
                String::new()
            } else {
                raw.trim().to_string()
            };
        }
        if let Some(raw) = lookup("ABX_DRY_RUN") {
            self.extract.dry_run = parse_env_bool("ABX_DRY_RUN", &raw)?;
        }
        if let Some(raw) = lookup("ABX_CLEAN_FILENAMES") {
            self.extract.clean_filenames = parse_env_bool("ABX_CLEAN_FILENAMES", &raw)?;
        }

        // scanner
        if let Some(raw) = lookup("ABX_MAX_DEPTH") {
            self.scanner.max_depth = parse_env_usize("ABX_MAX_DEPTH", &raw)?;
        }
        if let Some(raw) = lookup("ABX_FOLLOW_SYMLINKS") {
            self.scanner.follow_symlinks = parse_env_bool("ABX_FOLLOW_SYMLINKS", &raw)?;
        }

        // logging
        if let Some(raw) = lookup("ABX_JSONL_LOG") {
            self.logging.jsonl_log = Some(PathBuf::from(raw));
        }

        Ok(())
    }

    /// Trim whitespace from pattern lists so TOML/env typos don't silently miss.
    fn normalize(&mut self) {
        for list in [
            &mut self.extract.include_paths,
            &mut self.extract.extra_exclude_paths,
        ] {
            for entry in list.iter_mut() {
                let trimmed = entry.trim();
                if trimmed.len() != entry.len() {
                    *entry = trimmed.to_string();
                }
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.extract.include_paths.is_empty() {
            return Err(AbxError::InvalidConfig {
                details: "extract.include_paths must contain at least one prefix".to_string(),
            });
        }
        if self.extract.include_paths.iter().any(String::is_empty) {
            return Err(AbxError::InvalidConfig {
                details: "extract.include_paths must not contain empty prefixes".to_string(),
            });
        }
        // An empty substring would match every path.
        if self.extract.extra_exclude_paths.iter().any(String::is_empty) {
            return Err(AbxError::InvalidConfig {
                details: "extract.extra_exclude_paths must not contain empty patterns".to_string(),
            });
        }

        // The cleanup pass keeps only the text before the first dot.
        if self
            .extract
            .name_prefix
            .chars()
            .any(|c| matches!(c, '/' | '\\' | '.'))
        {
            return Err(AbxError::InvalidConfig {
                details: format!(
                    "extract.name_prefix must not contain '/', '\\' or '.', got {:?}",
                    self.extract.name_prefix
                ),
            });
        }

        // Output inside the source tree would be rescanned as artifacts.
        if lexically_within(&self.extract.output_dir, &self.extract.source_dir) {
            return Err(AbxError::InvalidConfig {
                details: format!(
                    "extract.output_dir ({}) must not be extract.source_dir ({}) or lie inside it",
                    self.extract.output_dir.display(),
                    self.extract.source_dir.display()
                ),
            });
        }

        if self.scanner.max_depth == 0 {
            return Err(AbxError::InvalidConfig {
                details: "scanner.max_depth must be >= 1".to_string(),
            });
        }

        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}


/// `path` equals `base` or sits below it, ignoring `.` components.
///
/// Purely lexical: a relative and an absolute path never match, so callers
/// resolve both against the project root first.
fn lexically_within(path: &Path, base: &Path) -> bool {
    fn significant(p: &Path) -> Vec<Component<'_>> {
        p.components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect()
    }
    let path = significant(path);
    let base = significant(base);
    !base.is_empty() && path.starts_with(&base)
}

fn parse_env_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_env_usize(name: &str, raw: &str) -> Result<usize> {
    raw.trim()
        .parse::<usize>()
        .map_err(|error| AbxError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })
}

fn parse_env_bool(name: &str, raw: &str) -> Result<bool> {
    raw.trim()
        .parse::<bool>()
        .map_err(|error| AbxError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })
}
