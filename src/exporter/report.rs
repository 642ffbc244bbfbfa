//! Structured outcome of an extraction run.
//!
//! Every artifact the walker finds ends up in exactly one of `extracted`,
//! `skipped` or `errors`. Reports serialize to the JSON emitted by `--json`.

#![allow(missing_docs)]

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::core::errors::AbxError;

/// Why an artifact produced no output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// No `metadata.settings.compilationTarget` entry (build-info, broken metadata).
    NoCompilationTarget,
    /// Source path contained an exclude pattern.
    Excluded {
        source_path: String,
        pattern: String,
    },
    /// Source path matched no include prefix.
    NotIncluded { source_path: String },
    /// First-party artifact without an `abi` field.
    NoAbi { source_path: String },
}

impl SkipReason {
    /// Stable machine-readable tag, matching the serialized `reason`.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::NoCompilationTarget => "no_compilation_target",
            Self::Excluded { .. } => "excluded",
            Self::NotIncluded { .. } => "not_included",
            Self::NoAbi { .. } => "no_abi",
        }
    }

    #[must_use]
    pub fn source_path(&self) -> Option<&str> {
        match self {
            Self::NoCompilationTarget => None,
            Self::Excluded { source_path, .. }
            | Self::NotIncluded { source_path }
            | Self::NoAbi { source_path } => Some(source_path),
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCompilationTarget => f.write_str("no compilation target"),
            Self::Excluded {
                source_path,
                pattern,
            } => write!(f, "{source_path} matches exclude pattern '{pattern}'"),
            Self::NotIncluded { source_path } => {
                write!(f, "{source_path} is outside the include paths")
            }
            Self::NoAbi { source_path } => write!(f, "no ABI found ({source_path})"),
        }
    }
}

/// One ABI file written (or planned, in dry-run mode).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedAbi {
    pub artifact: PathBuf,
    pub source_path: String,
    /// Include prefix that admitted `source_path`.
    pub include_prefix: String,
    pub contract: String,
    pub output: PathBuf,
    pub bytes: usize,
    /// `output` already existed before this run wrote it.
    pub replaced_existing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedArtifact {
    pub artifact: PathBuf,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// A per-file failure that did not stop the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileError {
    pub path: PathBuf,
    pub code: &'static str,
    pub message: String,
}

impl FileError {
    #[must_use]
    pub fn from_error(path: impl Into<PathBuf>, error: &AbxError) -> Self {
        Self {
            path: path.into(),
            code: error.code(),
            message: error.to_string(),
        }
    }
}

/// Two artifacts mapped to the same output name; the later one won.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameCollision {
    pub contract: String,
    pub previous: PathBuf,
    pub replaced_by: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionReport {
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    pub dry_run: bool,
    pub scanned: usize,
    pub extracted: Vec<ExtractedAbi>,
    pub skipped: Vec<SkippedArtifact>,
    pub errors: Vec<FileError>,
    pub collisions: Vec<NameCollision>,
    pub duration_ms: u64,
}

impl ExtractionReport {
    #[must_use]
    pub fn new(source_dir: PathBuf, output_dir: PathBuf, dry_run: bool) -> Self {
        Self {
            source_dir,
            output_dir,
            dry_run,
            scanned: 0,
            extracted: Vec::new(),
            skipped: Vec::new(),
            errors: Vec::new(),
            collisions: Vec::new(),
            duration_ms: 0,
        }
    }

    /// Number of skips for a given reason tag (`"excluded"`, `"no_abi"`, ...).
    #[must_use]
    pub fn skipped_with(&self, tag: &str) -> usize {
        self.skipped.iter().filter(|s| s.reason.tag() == tag).count()
    }

    #[must_use]
    pub fn summary_line(&self) -> String {
        let verb = if self.dry_run { "would extract" } else { "extracted" };
        format!(
            "{verb} {} ABI(s) from {} artifact(s): {} skipped, {} error(s), {} collision(s)",
            self.extracted.len(),
            self.scanned,
            self.skipped.len(),
            self.errors.len(),
            self.collisions.len(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenamedFile {
    pub from: PathBuf,
    pub to: PathBuf,
    /// An existing file at `to` was replaced.
    pub overwrote: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub dry_run: bool,
    pub renamed: Vec<RenamedFile>,
    /// Files whose name could not be reduced to a usable stem.
    pub skipped: Vec<PathBuf>,
    pub errors: Vec<FileError>,
}

impl CleanupReport {
    #[must_use]
    pub fn summary_line(&self) -> String {
        let verb = if self.dry_run { "would rename" } else { "renamed" };
        let overwritten = self.renamed.iter().filter(|r| r.overwrote).count();
        format!(
            "{verb} {} file(s) ({overwritten} overwritten), {} skipped, {} error(s)",
            self.renamed.len(),
            self.skipped.len(),
            self.errors.len(),
        )
    }
}

/// Extraction followed by the optional cleanup pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub extraction: ExtractionReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleanup: Option<CleanupReport>,
}

impl RunReport {
    /// Whether any per-file error was recorded in either pass.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.extraction.errors.is_empty()
            || self
                .cleanup
                .as_ref()
                .is_some_and(|cleanup| !cleanup.errors.is_empty())
    }
}
