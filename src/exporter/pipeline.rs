//! Extraction pipeline: walk → parse → resolve → filter → write, then cleanup.
//!
//! Per-artifact order of checks:
//! 1. parse (failure → error)
//! 2. resolve compilation target (none → skip)
//! 3. exclude patterns, then include prefixes (→ skip)
//! 4. `abi` present (absent → skip)
//! 5. write `<prefix><stem>.json`
//!
//! Nothing past the source-directory check can abort a run; every artifact
//! lands in the report as extracted, skipped, or errored.

#![allow(missing_docs)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::core::config::Config;
use crate::core::errors::{AbxError, Result};
use crate::core::paths::display_relative;
use crate::exporter::cleanup::clean_abi_filenames_with;
use crate::exporter::report::{
    ExtractedAbi, ExtractionReport, FileError, NameCollision, RunReport, SkipReason,
    SkippedArtifact,
};
use crate::exporter::writer::{AbiWriter, contract_name_for};
use crate::logger::activity::{ActivityEvent, ActivityLogger};
use crate::logger::jsonl::RunCounts;
use crate::scanner::artifact::Artifact;
use crate::scanner::patterns::{FilterDecision, PathFilter};
use crate::scanner::walker::{WalkerConfig, walk_json_files};

/// Per-artifact result before it is folded into the report.
enum ArtifactOutcome {
    Extracted(ExtractedAbi),
    Skipped(SkipReason),
}

/// Stateful single pass over one source tree.
struct Extraction<'a> {
    config: &'a Config,
    filter: PathFilter,
    writer: AbiWriter,
    /// Contract name → artifact that last produced it.
    claimed: HashMap<String, PathBuf>,
    report: ExtractionReport,
}

impl<'a> Extraction<'a> {
    fn new(config: &'a Config) -> Self {
        let extract = &config.extract;
        Self {
            config,
            filter: PathFilter::new(
                extract.include_paths.clone(),
                extract.extra_exclude_paths.clone(),
            ),
            writer: AbiWriter::new(&extract.output_dir, extract.dry_run),
            claimed: HashMap::new(),
            report: ExtractionReport::new(
                extract.source_dir.clone(),
                extract.output_dir.clone(),
                extract.dry_run,
            ),
        }
    }

    fn process(&mut self, artifact_path: &Path, logger: &mut ActivityLogger) {
        self.report.scanned += 1;
        match self.process_artifact(artifact_path) {
            Ok(ArtifactOutcome::Extracted(entry)) => {
                self.note_claim(&entry, logger);
                logger.log(ActivityEvent::AbiWritten {
                    artifact: self.show_source(&entry.artifact),
                    source_path: entry.source_path.clone(),
                    contract: entry.contract.clone(),
                    output: self.show_output(&entry.output),
                    bytes: entry.bytes,
                    replaced_existing: entry.replaced_existing,
                    dry_run: self.report.dry_run,
                });
                self.report.extracted.push(entry);
            }
            Ok(ArtifactOutcome::Skipped(reason)) => {
                logger.log(ActivityEvent::ArtifactSkipped {
                    artifact: self.show_source(artifact_path),
                    reason: reason.clone(),
                });
                self.report.skipped.push(SkippedArtifact {
                    artifact: artifact_path.to_path_buf(),
                    reason,
                });
            }
            Err(err) => self.record_error(artifact_path, &err, logger),
        }
    }

    fn process_artifact(&self, artifact_path: &Path) -> Result<ArtifactOutcome> {
        let artifact = Artifact::load(artifact_path)?;

        let Some(source_path) = artifact.resolved_source_path() else {
            return Ok(ArtifactOutcome::Skipped(SkipReason::NoCompilationTarget));
        };

        let include_prefix = match self.filter.evaluate(&source_path) {
            FilterDecision::Accepted { prefix } => prefix,
            FilterDecision::Excluded { pattern } => {
                return Ok(ArtifactOutcome::Skipped(SkipReason::Excluded {
                    source_path,
                    pattern,
                }));
            }
            FilterDecision::NotIncluded => {
                return Ok(ArtifactOutcome::Skipped(SkipReason::NotIncluded {
                    source_path,
                }));
            }
        };

        let Some(abi) = artifact.abi.as_ref() else {
            return Ok(ArtifactOutcome::Skipped(SkipReason::NoAbi { source_path }));
        };

        let contract = contract_name_for(artifact_path, &self.config.extract.name_prefix)
            .ok_or_else(|| AbxError::InvalidArtifact {
                path: artifact_path.to_path_buf(),
                reason: "file name has no usable stem".to_string(),
            })?;
        let outcome = self.writer.write(&contract, abi)?;

        Ok(ArtifactOutcome::Extracted(ExtractedAbi {
            artifact: artifact_path.to_path_buf(),
            source_path,
            include_prefix,
            contract,
            output: outcome.path,
            bytes: outcome.bytes,
            replaced_existing: outcome.replaced_existing,
        }))
    }

    /// Record a same-run name collision; the current artifact has already won.
    fn note_claim(&mut self, entry: &ExtractedAbi, logger: &mut ActivityLogger) {
        if let Some(previous) = self
            .claimed
            .insert(entry.contract.clone(), entry.artifact.clone())
        {
            logger.log(ActivityEvent::NameCollision {
                contract: entry.contract.clone(),
                previous: self.show_source(&previous),
                artifact: self.show_source(&entry.artifact),
            });
            self.report.collisions.push(NameCollision {
                contract: entry.contract.clone(),
                previous,
                replaced_by: entry.artifact.clone(),
            });
        }
    }

    fn record_error(&mut self, path: &Path, err: &AbxError, logger: &mut ActivityLogger) {
        logger.log(ActivityEvent::ArtifactFailed {
            artifact: self.show_source(path),
            code: err.code().to_string(),
            message: err.to_string(),
        });
        self.report.errors.push(FileError::from_error(path, err));
    }

    fn show_source(&self, path: &Path) -> String {
        show_under(path, &self.config.extract.source_dir)
    }

    fn show_output(&self, path: &Path) -> String {
        show_under(path, &self.config.extract.output_dir)
    }
}

/// Render `path` relative to the parent of `dir`, so it keeps `dir`'s own name
/// (`out/Token.sol/Token.json`).
fn show_under(path: &Path, dir: &Path) -> String {
    match dir.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => display_relative(path, parent),
        _ => path.display().to_string(),
    }
}

fn abort(logger: &mut ActivityLogger, err: AbxError) -> AbxError {
    logger.log(ActivityEvent::RunAborted {
        code: err.code().to_string(),
        message: err.to_string(),
    });
    logger.flush();
    err
}

/// Run one extraction pass over `config.extract.source_dir`.
///
/// Relative paths in `config` are used as given; call
/// [`Config::resolve_against`] first to anchor them at a project root.
///
/// # Errors
///
/// Fails only when the output directory cannot be created or the source
/// directory is missing. Per-artifact failures are recorded in the report.
pub fn extract_abis(config: &Config, logger: &mut ActivityLogger) -> Result<ExtractionReport> {
    let started = Instant::now();
    let mut extraction = Extraction::new(config);
    let extract = &config.extract;

    // The output directory is prepared before the source tree is checked.
    extraction
        .writer
        .ensure_output_dir()
        .map_err(|err| abort(logger, err))?;

    logger.log(ActivityEvent::RunStarted {
        source_dir: extract.source_dir.display().to_string(),
        output_dir: extract.output_dir.display().to_string(),
        config_hash: config
            .stable_hash()
            .unwrap_or_else(|_| "unavailable".to_string()),
        dry_run: extract.dry_run,
    });

    let walked = walk_json_files(WalkerConfig::from_config(
        &extract.source_dir,
        &config.scanner,
    ))
    .map_err(|err| abort(logger, err))?;

    for walk_error in &walked.errors {
        extraction.record_error(&walk_error.path, &walk_error.error, logger);
    }
    for artifact_path in &walked.files {
        extraction.process(artifact_path, logger);
    }

    let mut report = extraction.report;
    report.duration_ms = elapsed_ms(started);
    Ok(report)
}

/// Full run: extraction, then the filename cleanup pass when enabled.
///
/// # Errors
///
/// Same fatal conditions as [`extract_abis`].
pub fn run(config: &Config, logger: &mut ActivityLogger) -> Result<RunReport> {
    let started = Instant::now();
    let extraction = extract_abis(config, logger)?;
    let cleanup = config.extract.clean_filenames.then(|| {
        // A dry run wrote nothing; plan over the files it would have written.
        let pending: Vec<PathBuf> = if config.extract.dry_run {
            extraction.extracted.iter().map(|e| e.output.clone()).collect()
        } else {
            Vec::new()
        };
        clean_abi_filenames_with(
            &config.extract.output_dir,
            config.extract.dry_run,
            &pending,
            logger,
        )
    });

    let report = RunReport {
        extraction,
        cleanup,
    };
    logger.log(ActivityEvent::RunCompleted {
        counts: run_counts(&report),
        duration_ms: elapsed_ms(started),
    });
    logger.flush();
    Ok(report)
}

fn run_counts(report: &RunReport) -> RunCounts {
    let extraction = &report.extraction;
    let cleanup = report.cleanup.as_ref();
    RunCounts {
        scanned: extraction.scanned,
        extracted: extraction.extracted.len(),
        skipped: extraction.skipped.len(),
        errors: extraction.errors.len() + cleanup.map_or(0, |c| c.errors.len()),
        collisions: extraction.collisions.len(),
        renamed: cleanup.map_or(0, |c| c.renamed.len()),
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use std::fs;
    use tempfile::TempDir;

    fn artifact(source: &str, abi: Value) -> Value {
        let mut target = serde_json::Map::new();
        target.insert(source.to_string(), json!("X"));
        json!({
            "abi": abi,
            "metadata": { "settings": { "compilationTarget": target } }
        })
    }

    fn put(root: &Path, rel: &str, value: &Value) {
        let path = root.join("out").join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, value.to_string()).unwrap();
    }

    fn config(root: &Path) -> Config {
        Config::default().resolve_against(root)
    }

    fn transfer_abi() -> Value {
        json!([{ "type": "function", "name": "transfer" }])
    }

    #[test]
    fn extracts_first_party_abi() {
        let tmp = TempDir::new().unwrap();
        put(
            tmp.path(),
            "Token.sol/Token.json",
            &artifact("src/Token.sol", transfer_abi()),
        );

        let report = extract_abis(&config(tmp.path()), &mut ActivityLogger::silent()).unwrap();

        assert_eq!(report.scanned, 1);
        assert_eq!(report.extracted.len(), 1);
        assert_eq!(report.extracted[0].contract, "IToken");
        let written: Value =
            serde_json::from_str(&fs::read_to_string(tmp.path().join("abis/IToken.json")).unwrap())
                .unwrap();
        assert_eq!(written, transfer_abi());
    }

    #[test]
    fn rerun_reports_replaced_outputs() {
        let tmp = TempDir::new().unwrap();
        put(
            tmp.path(),
            "Token.sol/Token.json",
            &artifact("src/Token.sol", transfer_abi()),
        );
        let cfg = config(tmp.path());

        let first = extract_abis(&cfg, &mut ActivityLogger::silent()).unwrap();
        let second = extract_abis(&cfg, &mut ActivityLogger::silent()).unwrap();

        let entry = &first.extracted[0];
        assert_eq!(entry.include_prefix, "src/");
        assert!(!entry.replaced_existing);
        let on_disk = fs::read_to_string(&entry.output).unwrap();
        assert_eq!(entry.bytes, on_disk.len());
        assert!(second.extracted[0].replaced_existing);
        assert!(second.errors.is_empty());
    }

    #[test]
    fn skip_reasons_follow_check_order() {
        let tmp = TempDir::new().unwrap();
        put(tmp.path(), "Math.sol/Math.json", &artifact("lib/Math.sol", json!([])));
        put(
            tmp.path(),
            "Other.sol/Other.json",
            &artifact("contracts/Other.sol", json!([])),
        );
        put(
            tmp.path(),
            "NoAbi.sol/NoAbi.json",
            &json!({ "metadata": { "settings": { "compilationTarget": { "src/NoAbi.sol": "NoAbi" } } } }),
        );
        put(tmp.path(), "build-info/abc.json", &json!({ "id": "abc" }));

        let report = extract_abis(&config(tmp.path()), &mut ActivityLogger::silent()).unwrap();

        assert!(report.extracted.is_empty());
        assert_eq!(report.skipped_with("excluded"), 1);
        assert_eq!(report.skipped_with("not_included"), 1);
        assert_eq!(report.skipped_with("no_abi"), 1);
        assert_eq!(report.skipped_with("no_compilation_target"), 1);
        assert!(!tmp.path().join("abis/IMath.json").exists());
    }

    #[test]
    fn malformed_artifact_is_recorded_and_run_continues() {
        let tmp = TempDir::new().unwrap();
        let bad = tmp.path().join("out/Bad.sol/Bad.json");
        fs::create_dir_all(bad.parent().unwrap()).unwrap();
        fs::write(&bad, "{ not json").unwrap();
        put(
            tmp.path(),
            "Token.sol/Token.json",
            &artifact("src/Token.sol", transfer_abi()),
        );

        let report = extract_abis(&config(tmp.path()), &mut ActivityLogger::silent()).unwrap();

        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].path, bad);
        assert_eq!(report.errors[0].code, "ABX-2001");
        assert_eq!(report.extracted.len(), 1);
    }

    #[test]
    fn collision_is_recorded_and_last_writer_wins() {
        let tmp = TempDir::new().unwrap();
        put(
            tmp.path(),
            "a/Token.json",
            &artifact("src/a/Token.sol", json!(["first"])),
        );
        put(
            tmp.path(),
            "b/Token.json",
            &artifact("src/b/Token.sol", json!(["second"])),
        );

        let report = extract_abis(&config(tmp.path()), &mut ActivityLogger::silent()).unwrap();

        assert_eq!(report.collisions.len(), 1);
        assert_eq!(report.collisions[0].contract, "IToken");
        assert!(report.collisions[0].replaced_by.ends_with("b/Token.json"));
        let written = fs::read_to_string(tmp.path().join("abis/IToken.json")).unwrap();
        assert!(written.contains("second"));
    }

    #[test]
    fn missing_source_is_fatal_but_output_dir_exists() {
        let tmp = TempDir::new().unwrap();
        let err = extract_abis(&config(tmp.path()), &mut ActivityLogger::silent()).unwrap_err();
        assert!(matches!(err, AbxError::MissingSourceDir { .. }));
        assert!(tmp.path().join("abis").is_dir());
    }

    #[test]
    fn dry_run_plans_the_same_renames_as_a_real_run() {
        let tmp = TempDir::new().unwrap();
        put(
            tmp.path(),
            "Token.sol/Token.0.8.19.json",
            &artifact("src/Token.sol", transfer_abi()),
        );
        let mut cfg = config(tmp.path());
        cfg.extract.dry_run = true;

        let planned = run(&cfg, &mut ActivityLogger::silent()).unwrap();

        assert_eq!(planned.extraction.extracted.len(), 1);
        let plan = planned.cleanup.unwrap();
        assert_eq!(plan.renamed.len(), 1);
        assert_eq!(plan.renamed[0].to, tmp.path().join("abis/IToken.json"));
        assert!(!tmp.path().join("abis").exists());

        cfg.extract.dry_run = false;
        let real = run(&cfg, &mut ActivityLogger::silent()).unwrap();
        let done = real.cleanup.unwrap();
        assert_eq!(done.renamed.len(), plan.renamed.len());
        assert_eq!(done.renamed[0].from, plan.renamed[0].from);
        assert_eq!(done.renamed[0].to, plan.renamed[0].to);
        assert!(tmp.path().join("abis/IToken.json").is_file());
    }

    #[test]
    fn run_cleans_versioned_names() {
        let tmp = TempDir::new().unwrap();
        put(
            tmp.path(),
            "Token.sol/Token.0.8.19.json",
            &artifact("src/Token.sol", transfer_abi()),
        );

        let report = run(&config(tmp.path()), &mut ActivityLogger::silent()).unwrap();

        assert_eq!(report.extraction.extracted[0].contract, "IToken.0.8.19");
        assert_eq!(report.cleanup.as_ref().unwrap().renamed.len(), 1);
        assert!(tmp.path().join("abis/IToken.json").is_file());
        assert!(!tmp.path().join("abis/IToken.0.8.19.json").exists());
        assert!(!report.has_errors());
    }

    #[test]
    fn cleanup_can_be_disabled() {
        let tmp = TempDir::new().unwrap();
        put(
            tmp.path(),
            "Token.sol/Token.0.8.19.json",
            &artifact("src/Token.sol", transfer_abi()),
        );
        let mut cfg = config(tmp.path());
        cfg.extract.clean_filenames = false;

        let report = run(&cfg, &mut ActivityLogger::silent()).unwrap();

        assert!(report.cleanup.is_none());
        assert!(tmp.path().join("abis/IToken.0.8.19.json").is_file());
    }

    #[test]
    fn show_under_keeps_directory_name() {
        assert_eq!(
            show_under(
                Path::new("/p/out/Token.sol/Token.json"),
                Path::new("/p/out")
            ),
            "out/Token.sol/Token.json"
        );
        assert_eq!(
            show_under(Path::new("out/A.json"), Path::new("out")),
            "out/A.json"
        );
    }
}
