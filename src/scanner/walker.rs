//! Deterministic directory walker that discovers compiled JSON artifacts.
//!
//! The walk is sequential and visits directory entries in lexicographic order,
//! so the last-writer-wins rule for colliding contract names resolves the same
//! way on every run. Unreadable subdirectories are recorded and skipped; only a
//! missing root aborts the walk.

#![allow(missing_docs)]

use std::collections::HashSet;
use std::ffi::OsStr;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::core::config::ScannerConfig;
use crate::core::errors::{AbxError, Result};

/// Extension of compiler artifact files.
pub const ARTIFACT_EXTENSION: &str = "json";

/// Walker configuration derived from `ScannerConfig`.
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    pub root: PathBuf,
    pub max_depth: usize,
    pub follow_symlinks: bool,
}

impl WalkerConfig {
    #[must_use]
    pub fn from_config(root: impl Into<PathBuf>, scanner: &ScannerConfig) -> Self {
        Self {
            root: root.into(),
            max_depth: scanner.max_depth,
            follow_symlinks: scanner.follow_symlinks,
        }
    }
}

/// A subdirectory the walker could not read.
#[derive(Debug)]
pub struct WalkError {
    pub path: PathBuf,
    pub error: AbxError,
}

/// Everything a walk discovered, in traversal order.
#[derive(Debug, Default)]
pub struct WalkOutcome {
    pub files: Vec<PathBuf>,
    pub errors: Vec<WalkError>,
}

/// Sequential, sorted walker over an artifact tree.
///
/// Safety invariants:
/// - Does not follow symlinks unless configured
/// - Bounded by `max_depth`
/// - Enters each physical directory at most once, so followed symlink cycles
///   and aliases list their artifacts a single time
/// - Never aborts on a single unreadable subdirectory
pub struct DirectoryWalker {
    config: WalkerConfig,
}

impl DirectoryWalker {
    pub fn new(config: WalkerConfig) -> Self {
        Self { config }
    }

    /// Collect every `*.json` file beneath the root.
    ///
    /// Fails only when the root itself is missing or is not a directory.
    pub fn walk(&self) -> Result<WalkOutcome> {
        let root = &self.config.root;
        match fs::metadata(root) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(AbxError::InvalidConfig {
                    details: format!("source path is not a directory: {}", root.display()),
                });
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(AbxError::MissingSourceDir { path: root.clone() });
            }
            Err(err) => return Err(AbxError::io(root, err)),
        }

        let mut outcome = WalkOutcome::default();
        let mut entered = HashSet::new();
        self.visit(root, 0, &mut entered, &mut outcome);
        Ok(outcome)
    }

    fn visit(
        &self,
        dir: &Path,
        depth: usize,
        entered: &mut HashSet<DirKey>,
        outcome: &mut WalkOutcome,
    ) {
        match dir_key(dir) {
            Ok(key) => {
                if !entered.insert(key) {
                    return;
                }
            }
            Err(err) => {
                outcome.errors.push(WalkError {
                    path: dir.to_path_buf(),
                    error: AbxError::io(dir, err),
                });
                return;
            }
        }

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                outcome.errors.push(WalkError {
                    path: dir.to_path_buf(),
                    error: AbxError::io(dir, err),
                });
                return;
            }
        };

        let mut children: Vec<(PathBuf, fs::FileType)> = Vec::new();
        for entry_result in entries {
            match entry_result {
                Ok(entry) => match entry.file_type() {
                    Ok(ft) => children.push((entry.path(), ft)),
                    Err(err) => outcome.errors.push(WalkError {
                        path: entry.path(),
                        error: AbxError::io(entry.path(), err),
                    }),
                },
                Err(err) => outcome.errors.push(WalkError {
                    path: dir.to_path_buf(),
                    error: AbxError::io(dir, err),
                }),
            }
        }
        children.sort_by(|a, b| a.0.file_name().cmp(&b.0.file_name()));

        for (child, ft) in children {
            let (is_dir, is_file) = if ft.is_symlink() {
                if !self.config.follow_symlinks {
                    continue;
                }
                match fs::metadata(&child) {
                    Ok(meta) => (meta.is_dir(), meta.is_file()),
                    // Dangling link.
                    Err(_) => continue,
                }
            } else {
                (ft.is_dir(), ft.is_file())
            };

            if is_dir {
                if depth < self.config.max_depth {
                    self.visit(&child, depth + 1, entered, outcome);
                }
            } else if is_file && is_artifact_file(&child) {
                outcome.files.push(child);
            }
        }
    }
}

/// Identity of a physical directory.
#[cfg(unix)]
type DirKey = (u64, u64);
#[cfg(not(unix))]
type DirKey = PathBuf;

#[cfg(unix)]
fn dir_key(dir: &Path) -> std::io::Result<DirKey> {
    use std::os::unix::fs::MetadataExt;
    let meta = fs::metadata(dir)?;
    Ok((meta.dev(), meta.ino()))
}

#[cfg(not(unix))]
fn dir_key(dir: &Path) -> std::io::Result<DirKey> {
    fs::canonicalize(dir)
}

/// Convenience wrapper: build a walker and run it.
pub fn walk_json_files(config: WalkerConfig) -> Result<WalkOutcome> {
    DirectoryWalker::new(config).walk()
}

/// Whether a path names a JSON artifact (`*.json`, case-sensitive like a glob).
#[must_use]
pub fn is_artifact_file(path: &Path) -> bool {
    path.extension() == Some(OsStr::new(ARTIFACT_EXTENSION))
}
