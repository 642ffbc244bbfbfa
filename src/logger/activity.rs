//! Activity funnel: every progress event of a run goes through one logger that
//! fans out to the console and, when configured, the JSONL history file.
//!
//! The extraction pipeline never prints directly. Callers choose how events are
//! rendered by picking a [`ConsoleTarget`] or installing a console hook.

#![allow(missing_docs)]

use std::io::{self, Write};

use crate::exporter::report::SkipReason;
use crate::logger::jsonl::{EventType, JsonlConfig, JsonlWriter, LogEntry, RunCounts, Severity};

// ──────────────────── public event type ────────────────────

/// Events emitted during extraction and cleanup.
#[derive(Debug, Clone, PartialEq)]
pub enum ActivityEvent {
    RunStarted {
        source_dir: String,
        output_dir: String,
        config_hash: String,
        dry_run: bool,
    },
    AbiWritten {
        artifact: String,
        source_path: String,
        contract: String,
        output: String,
        bytes: usize,
        replaced_existing: bool,
        dry_run: bool,
    },
    ArtifactSkipped {
        artifact: String,
        reason: SkipReason,
    },
    ArtifactFailed {
        artifact: String,
        code: String,
        message: String,
    },
    NameCollision {
        contract: String,
        previous: String,
        artifact: String,
    },
    FileRenamed {
        from: String,
        to: String,
        overwrote: bool,
        dry_run: bool,
    },
    RenameFailed {
        path: String,
        code: String,
        message: String,
    },
    RunCompleted {
        counts: RunCounts,
        duration_ms: u64,
    },
    RunAborted {
        code: String,
        message: String,
    },
}

/// How chatty the console side of the logger is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// Failures only.
    Quiet,
    /// Writes, renames, warnings (including first-party artifacts without an
    /// ABI) and the final summary.
    Normal,
    /// Everything, including each filtered-out artifact.
    Verbose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleTarget {
    Stdout,
    Stderr,
    Off,
}

impl ActivityEvent {
    /// Lowest verbosity at which the event reaches the console.
    #[must_use]
    pub const fn min_verbosity(&self) -> Verbosity {
        match self {
            Self::ArtifactFailed { .. } | Self::RenameFailed { .. } | Self::RunAborted { .. } => {
                Verbosity::Quiet
            }
            Self::ArtifactSkipped {
                reason: SkipReason::NoAbi { .. },
                ..
            } => Verbosity::Normal,
            Self::ArtifactSkipped { .. } | Self::RunStarted { .. } => Verbosity::Verbose,
            _ => Verbosity::Normal,
        }
    }

    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::ArtifactFailed { .. }
            | Self::RenameFailed { .. }
            | Self::NameCollision { .. }
            | Self::ArtifactSkipped {
                reason: SkipReason::NoAbi { .. },
                ..
            } => Severity::Warning,
            Self::RunAborted { .. } => Severity::Critical,
            _ => Severity::Info,
        }
    }

    /// One-line plain-text rendering for terminals and plain log sinks.
    #[must_use]
    pub fn human_line(&self) -> String {
        match self {
            Self::RunStarted {
                source_dir,
                output_dir,
                dry_run,
                ..
            } => {
                let suffix = if *dry_run { " (dry run)" } else { "" };
                format!("Extracting ABIs from {source_dir} into {output_dir}{suffix}")
            }
            Self::AbiWritten {
                contract, dry_run, ..
            } => {
                if *dry_run {
                    format!("Would extract ABI for {contract}")
                } else {
                    format!("Extracted ABI for {contract}")
                }
            }
            Self::ArtifactSkipped { artifact, reason } => format!("Skipping {artifact}: {reason}"),
            Self::ArtifactFailed {
                artifact, message, ..
            } => format!("Error processing {artifact}: {message}"),
            Self::NameCollision {
                contract,
                previous,
                artifact,
            } => format!("Warning: {contract} from {artifact} replaces output of {previous}"),
            Self::FileRenamed {
                from,
                to,
                overwrote,
                dry_run,
            } => {
                let verb = if *dry_run { "Would rename" } else { "Renamed" };
                let note = if *overwrote { " (overwrote existing)" } else { "" };
                format!("{verb} {from} to {to}{note}")
            }
            Self::RenameFailed { path, message, .. } => {
                format!("Error renaming {path}: {message}")
            }
            Self::RunCompleted { counts, .. } => format!(
                "ABI extraction complete! {} extracted, {} skipped, {} error(s), {} renamed",
                counts.extracted, counts.skipped, counts.errors, counts.renamed
            ),
            Self::RunAborted { message, .. } => format!("Extraction aborted: {message}"),
        }
    }

    /// Structured JSONL representation.
    #[must_use]
    pub fn to_log_entry(&self) -> LogEntry {
        match self {
            Self::RunStarted {
                source_dir,
                output_dir,
                config_hash,
                dry_run,
            } => {
                let mut e = LogEntry::new(EventType::RunStart, self.severity());
                e.path = Some(source_dir.clone());
                e.target = Some(output_dir.clone());
                e.details = Some(format!("config_hash={config_hash} dry_run={dry_run}"));
                e
            }
            Self::AbiWritten {
                artifact,
                source_path,
                contract,
                output,
                bytes,
                replaced_existing,
                dry_run,
            } => {
                let mut e = LogEntry::new(EventType::AbiWritten, self.severity());
                e.path = Some(artifact.clone());
                e.source_path = Some(source_path.clone());
                e.contract = Some(contract.clone());
                e.target = Some(output.clone());
                e.ok = Some(true);
                e.details = Some(format!(
                    "bytes={bytes} replaced_existing={replaced_existing} dry_run={dry_run}"
                ));
                e
            }
            Self::ArtifactSkipped { artifact, reason } => {
                let mut e = LogEntry::new(EventType::ArtifactSkipped, self.severity());
                e.path = Some(artifact.clone());
                e.source_path = reason.source_path().map(str::to_string);
                e.reason = Some(reason.tag().to_string());
                if let SkipReason::Excluded { pattern, .. } = reason {
                    e.details = Some(format!("pattern={pattern}"));
                }
                e
            }
            Self::ArtifactFailed {
                artifact,
                code,
                message,
            } => {
                let mut e = LogEntry::new(EventType::ArtifactError, self.severity());
                e.path = Some(artifact.clone());
                e.ok = Some(false);
                e.error_code = Some(code.clone());
                e.error_message = Some(message.clone());
                e
            }
            Self::NameCollision {
                contract,
                previous,
                artifact,
            } => {
                let mut e = LogEntry::new(EventType::NameCollision, self.severity());
                e.path = Some(artifact.clone());
                e.contract = Some(contract.clone());
                e.details = Some(format!("previous={previous}"));
                e
            }
            Self::FileRenamed {
                from,
                to,
                overwrote,
                dry_run,
            } => {
                let mut e = LogEntry::new(EventType::FileRenamed, self.severity());
                e.path = Some(from.clone());
                e.target = Some(to.clone());
                e.ok = Some(true);
                e.details = Some(format!("overwrote={overwrote} dry_run={dry_run}"));
                e
            }
            Self::RenameFailed {
                path,
                code,
                message,
            } => {
                let mut e = LogEntry::new(EventType::RenameError, self.severity());
                e.path = Some(path.clone());
                e.ok = Some(false);
                e.error_code = Some(code.clone());
                e.error_message = Some(message.clone());
                e
            }
            Self::RunCompleted {
                counts,
                duration_ms,
            } => {
                let mut e = LogEntry::new(EventType::RunComplete, self.severity());
                e.counts = Some(*counts);
                e.duration_ms = Some(*duration_ms);
                e.ok = Some(counts.errors == 0);
                e
            }
            Self::RunAborted { code, message } => {
                let mut e = LogEntry::new(EventType::RunAborted, self.severity());
                e.ok = Some(false);
                e.error_code = Some(code.clone());
                e.error_message = Some(message.clone());
                e
            }
        }
    }
}

// ──────────────────── logger ────────────────────

type ConsoleHook = Box<dyn FnMut(&ActivityEvent)>;

/// Single-owner activity logger.
///
/// The JSONL sink receives every event regardless of verbosity; the console
/// only sees events at or below the configured verbosity.
pub struct ActivityLogger {
    verbosity: Verbosity,
    target: ConsoleTarget,
    hook: Option<ConsoleHook>,
    jsonl: Option<JsonlWriter>,
    events_logged: u64,
}

impl ActivityLogger {
    #[must_use]
    pub fn new(verbosity: Verbosity, target: ConsoleTarget) -> Self {
        Self {
            verbosity,
            target,
            hook: None,
            jsonl: None,
            events_logged: 0,
        }
    }

    /// No console output and no JSONL file.
    #[must_use]
    pub fn silent() -> Self {
        Self::new(Verbosity::Quiet, ConsoleTarget::Off)
    }

    /// Also append every event to a JSONL history file.
    #[must_use]
    pub fn with_jsonl(mut self, config: JsonlConfig) -> Self {
        self.jsonl = Some(JsonlWriter::open(config));
        self
    }

    /// Replace the built-in plain-text console rendering.
    #[must_use]
    pub fn with_console_hook<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&ActivityEvent) + 'static,
    {
        self.hook = Some(Box::new(hook));
        self
    }

    pub fn log(&mut self, event: ActivityEvent) {
        self.events_logged += 1;

        if let Some(jsonl) = self.jsonl.as_mut() {
            jsonl.write_entry(&event.to_log_entry());
        }

        if self.target == ConsoleTarget::Off || event.min_verbosity() > self.verbosity {
            return;
        }
        if let Some(hook) = self.hook.as_mut() {
            hook(&event);
            return;
        }
        let line = event.human_line();
        // Console write failures (closed pipe) must not abort the run.
        let _ = match self.target {
            ConsoleTarget::Stdout => writeln!(io::stdout(), "{line}"),
            ConsoleTarget::Stderr => writeln!(io::stderr(), "{line}"),
            ConsoleTarget::Off => Ok(()),
        };
    }

    pub fn flush(&mut self) {
        if let Some(jsonl) = self.jsonl.as_mut() {
            jsonl.flush();
        }
    }

    /// Total events received, including those filtered from the console.
    #[must_use]
    pub const fn events_logged(&self) -> u64 {
        self.events_logged
    }
}

impl Drop for ActivityLogger {
    fn drop(&mut self) {
        self.flush();
    }
}
