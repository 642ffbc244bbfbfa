//! Filename cleanup: `IToken.1.2.0.json` becomes `IToken.json`.
//!
//! Non-recursive, sorted, and idempotent. Renames replace an existing target,
//! so the last versioned file in sort order wins.

use std::fs;
use std::path::{Path, PathBuf};

use crate::core::errors::AbxError;
use crate::exporter::report::{CleanupReport, FileError, RenamedFile};
use crate::logger::activity::{ActivityEvent, ActivityLogger};
use crate::scanner::walker::{ARTIFACT_EXTENSION, is_artifact_file};

/// Outcome of reducing one file name.
#[derive(Debug, Clone, PartialEq, Eq)]
enum CleanName {
    /// Already a single-segment stem.
    Unchanged,
    Renamed(String),
    /// First segment is empty (`.1.0.json`); there is nothing to keep.
    Unusable,
}

/// Cleaned file name for `file_name`, or `None` when it is already clean or
/// has no usable first segment.
///
/// ```
/// use abi_extract::exporter::cleanup::clean_file_name;
/// assert_eq!(clean_file_name("IToken.1.2.0.json").as_deref(), Some("IToken.json"));
/// assert_eq!(clean_file_name("IToken.json"), None);
/// ```
#[must_use]
pub fn clean_file_name(file_name: &str) -> Option<String> {
    match classify(file_name) {
        CleanName::Renamed(name) => Some(name),
        CleanName::Unchanged | CleanName::Unusable => None,
    }
}

fn classify(file_name: &str) -> CleanName {
    let stem = file_name
        .strip_suffix(ARTIFACT_EXTENSION)
        .and_then(|rest| rest.strip_suffix('.'))
        .unwrap_or(file_name);
    match stem.split_once('.') {
        None => CleanName::Unchanged,
        Some(("", _)) => CleanName::Unusable,
        Some((first, _)) => CleanName::Renamed(format!("{first}.{ARTIFACT_EXTENSION}")),
    }
}

/// Rename every versioned `*.json` file directly inside `output_dir`.
///
/// A missing directory yields an empty report. Individual failures are logged
/// and recorded; the pass always visits every file.
pub fn clean_abi_filenames(
    output_dir: &Path,
    dry_run: bool,
    logger: &mut ActivityLogger,
) -> CleanupReport {
    clean_abi_filenames_with(output_dir, dry_run, &[], logger)
}

/// Like [`clean_abi_filenames`], but also treats `pending` as present in
/// `output_dir`.
///
/// A dry-run extraction writes nothing, so its planned outputs are passed here
/// to get the same rename plan a real run would carry out. Paths outside
/// `output_dir` are ignored.
pub fn clean_abi_filenames_with(
    output_dir: &Path,
    dry_run: bool,
    pending: &[PathBuf],
    logger: &mut ActivityLogger,
) -> CleanupReport {
    let mut report = CleanupReport {
        dry_run,
        ..CleanupReport::default()
    };
    let pending: Vec<&PathBuf> = pending
        .iter()
        .filter(|path| path.parent() == Some(output_dir) && is_artifact_file(path))
        .collect();

    let mut files: Vec<PathBuf> = pending.iter().map(|path| (*path).clone()).collect();
    match fs::read_dir(output_dir) {
        Ok(entries) => list_artifacts(entries, output_dir, &mut files, &mut report, logger),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => {
            record_failure(&mut report, logger, output_dir, &AbxError::io(output_dir, err));
            return report;
        }
    }
    files.sort();
    files.dedup();

    for from in files {
        let Some(file_name) = from.file_name().and_then(|name| name.to_str()) else {
            report.skipped.push(from);
            continue;
        };
        let target_name = match classify(file_name) {
            CleanName::Unchanged => continue,
            CleanName::Unusable => {
                report.skipped.push(from);
                continue;
            }
            CleanName::Renamed(name) => name,
        };

        let to = from.with_file_name(&target_name);
        // Pending files and earlier planned renames count as existing targets.
        let overwrote = to.exists()
            || pending.iter().any(|path| **path == to)
            || report.renamed.iter().any(|r| r.to == to);

        if !dry_run && let Err(err) = fs::rename(&from, &to) {
            record_failure(&mut report, logger, &from, &AbxError::io(&from, err));
            continue;
        }

        logger.log(ActivityEvent::FileRenamed {
            from: file_name.to_string(),
            to: target_name,
            overwrote,
            dry_run,
        });
        report.renamed.push(RenamedFile {
            from,
            to,
            overwrote,
        });
    }

    report
}

fn list_artifacts(
    entries: fs::ReadDir,
    output_dir: &Path,
    files: &mut Vec<PathBuf>,
    report: &mut CleanupReport,
    logger: &mut ActivityLogger,
) {
    for entry in entries {
        match entry {
            Ok(entry) => {
                let path = entry.path();
                if entry.file_type().is_ok_and(|ft| ft.is_file()) && is_artifact_file(&path) {
                    files.push(path);
                }
            }
            Err(err) => {
                record_failure(report, logger, output_dir, &AbxError::io(output_dir, err));
            }
        }
    }
}

fn record_failure(
    report: &mut CleanupReport,
    logger: &mut ActivityLogger,
    path: &Path,
    error: &AbxError,
) {
    let display = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
    logger.log(ActivityEvent::RenameFailed {
        path: display,
        code: error.code().to_string(),
        message: error.to_string(),
    });
    report.errors.push(FileError::from_error(path, error));
}
