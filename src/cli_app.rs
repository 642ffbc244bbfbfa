//! Top-level CLI definition and dispatch.

use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell as CompletionShell, generate};
use colored::{Colorize, control};
use serde_json::{Value, json};
use thiserror::Error;

use abi_extract::core::config::Config;
use abi_extract::core::errors::AbxError;
use abi_extract::core::paths::project_root;
use abi_extract::exporter::cleanup::clean_abi_filenames;
use abi_extract::exporter::pipeline;
use abi_extract::exporter::report::SkipReason;
use abi_extract::logger::activity::{ActivityEvent, ActivityLogger, ConsoleTarget, Verbosity};
use abi_extract::logger::jsonl::JsonlConfig;

/// abix: extracts contract ABIs from compiled build artifacts.
#[derive(Debug, Parser)]
#[command(
    name = "abix",
    author,
    version,
    about = "ABI extractor - publishes first-party contract ABIs as standalone JSON files",
    long_about = None
)]
pub struct Cli {
    /// Project root that relative paths are resolved against (default: current directory).
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Force JSON output mode.
    #[arg(long, global = true)]
    json: bool,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Increase verbosity (show every skipped artifact).
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,
    /// Quiet mode (errors only).
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    /// Exit non-zero when any single file failed.
    #[arg(long, global = true)]
    strict: bool,
    /// Append activity events to this JSONL file.
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,
    /// Subcommand to execute (default: extract, then clean).
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Extract ABIs from the artifact tree, then clean filenames.
    Extract(ExtractArgs),
    /// Strip version suffixes from ABI filenames only.
    Clean(CleanArgs),
    /// View and validate configuration state.
    Config(ConfigArgs),
    /// Generate shell completions.
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Args, Default)]
struct ExtractArgs {
    /// Artifact tree to scan.
    #[arg(long, value_name = "DIR")]
    source: Option<PathBuf>,
    /// Directory receiving ABI files.
    #[arg(long, value_name = "DIR")]
    output: Option<PathBuf>,
    /// Include prefix for resolved source paths (repeatable; replaces the configured list).
    #[arg(long = "include", value_name = "PREFIX")]
    include: Vec<String>,
    /// Additional exclude substring (repeatable; built-in excludes always apply).
    #[arg(long = "exclude", value_name = "PATTERN")]
    exclude: Vec<String>,
    /// Output name prefix; pass an empty string for bare contract names.
    #[arg(long, value_name = "PREFIX")]
    prefix: Option<String>,
    /// Skip the filename cleanup pass.
    #[arg(long)]
    no_clean: bool,
    /// Report what would be written or renamed without touching the filesystem.
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Clone, Args)]
struct CleanArgs {
    /// Directory to clean (default: configured output directory).
    #[arg(value_name = "DIR")]
    dir: Option<PathBuf>,
    /// Report planned renames without renaming.
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Clone, Args)]
struct ConfigArgs {
    /// Config operation to run.
    #[command(subcommand)]
    command: Option<ConfigCommand>,
}

#[derive(Debug, Clone, Copy, Subcommand)]
enum ConfigCommand {
    /// Print the config file path.
    Path,
    /// Print the effective configuration.
    Show,
    /// Validate the effective configuration.
    Validate,
}

#[derive(Debug, Clone, Args)]
struct CompletionsArgs {
    /// Shell to generate completion script for.
    #[arg(value_enum)]
    shell: CompletionShell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input or configuration.
    #[error("{0}")]
    User(String),
    /// Environment/runtime failure.
    #[error("{0}")]
    Runtime(String),
    /// Internal bug or invariant violation.
    #[error("{0}")]
    Internal(String),
    /// Operation partially succeeded.
    #[error("{0}")]
    Partial(String),
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) => 1,
            Self::Runtime(_) | Self::Io(_) => 2,
            Self::Internal(_) | Self::Json(_) => 3,
            Self::Partial(_) => 4,
        }
    }
}

impl From<AbxError> for CliError {
    fn from(err: AbxError) -> Self {
        if err.is_fatal() {
            Self::User(err.to_string())
        } else {
            Self::Runtime(err.to_string())
        }
    }
}

/// Dispatch CLI commands.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }

    match &cli.command {
        None => run_extract(cli, &ExtractArgs::default()),
        Some(Command::Extract(args)) => run_extract(cli, args),
        Some(Command::Clean(args)) => run_clean(cli, args),
        Some(Command::Config(args)) => run_config(cli, args),
        Some(Command::Completions(args)) => {
            let mut command = Cli::command();
            let binary_name = command.get_name().to_string();
            generate(args.shell, &mut command, binary_name, &mut io::stdout());
            Ok(())
        }
    }
}

// ──────────────────── extract ────────────────────

fn run_extract(cli: &Cli, args: &ExtractArgs) -> Result<(), CliError> {
    let root = project_root(cli.root.as_deref());
    let mut config = load_config(cli, &root)?;
    apply_extract_args(&mut config, args);
    let config = config.resolve_against(&root);
    config.validate()?;

    let mode = output_mode(cli);
    let mut logger = build_logger(cli, mode, &config);
    let report = pipeline::run(&config, &mut logger)?;

    match mode {
        OutputMode::Human if cli.quiet => {}
        OutputMode::Human => {
            println!("  {}", report.extraction.summary_line().dimmed());
            if let Some(cleanup) = &report.cleanup {
                println!("  {}", cleanup.summary_line().dimmed());
            }
        }
        OutputMode::Json => {
            let payload = json!({
                "command": "extract",
                "ok": !report.has_errors(),
                "report": serde_json::to_value(&report)?,
            });
            write_json_line(&payload)?;
        }
    }

    if cli.strict && report.has_errors() {
        let failed = report.extraction.errors.len()
            + report.cleanup.as_ref().map_or(0, |c| c.errors.len());
        return Err(CliError::Partial(format!(
            "{failed} file(s) failed (--strict)"
        )));
    }
    Ok(())
}

fn apply_extract_args(config: &mut Config, args: &ExtractArgs) {
    let extract = &mut config.extract;
    if let Some(source) = &args.source {
        extract.source_dir.clone_from(source);
    }
    if let Some(output) = &args.output {
        extract.output_dir.clone_from(output);
    }
    if !args.include.is_empty() {
        extract.include_paths.clone_from(&args.include);
    }
    extract
        .extra_exclude_paths
        .extend(args.exclude.iter().cloned());
    if let Some(prefix) = &args.prefix {
        extract.name_prefix.clone_from(prefix);
    }
    if args.no_clean {
        extract.clean_filenames = false;
    }
    if args.dry_run {
        extract.dry_run = true;
    }
}

// ──────────────────── clean ────────────────────

fn run_clean(cli: &Cli, args: &CleanArgs) -> Result<(), CliError> {
    let root = project_root(cli.root.as_deref());
    let config = load_config(cli, &root)?.resolve_against(&root);
    let dir = args.dir.as_ref().map_or_else(
        || config.extract.output_dir.clone(),
        |dir| if dir.is_relative() { root.join(dir) } else { dir.clone() },
    );
    let dry_run = args.dry_run || config.extract.dry_run;

    let mode = output_mode(cli);
    let mut logger = build_logger(cli, mode, &config);
    let report = clean_abi_filenames(&dir, dry_run, &mut logger);
    logger.flush();

    match mode {
        OutputMode::Human if cli.quiet => {}
        OutputMode::Human => {
            if report.renamed.is_empty() && report.errors.is_empty() {
                println!("Nothing to rename in {}.", dir.display());
            }
            println!("  {}", report.summary_line().dimmed());
        }
        OutputMode::Json => {
            let payload = json!({
                "command": "clean",
                "dir": dir.to_string_lossy(),
                "ok": report.errors.is_empty(),
                "report": serde_json::to_value(&report)?,
            });
            write_json_line(&payload)?;
        }
    }

    if cli.strict && !report.errors.is_empty() {
        return Err(CliError::Partial(format!(
            "{} rename(s) failed (--strict)",
            report.errors.len()
        )));
    }
    Ok(())
}

// ──────────────────── config ────────────────────

fn run_config(cli: &Cli, args: &ConfigArgs) -> Result<(), CliError> {
    let root = project_root(cli.root.as_deref());
    match args.command {
        None | Some(ConfigCommand::Path) => {
            let path = cli
                .config
                .clone()
                .unwrap_or_else(|| Config::default_path(&root));
            let exists = path.exists();

            match output_mode(cli) {
                OutputMode::Human => {
                    println!("{}", path.display());
                    if !exists {
                        println!("  (file does not exist; defaults will be used)");
                    }
                }
                OutputMode::Json => {
                    let payload = json!({
                        "command": "config path",
                        "path": path.to_string_lossy(),
                        "exists": exists,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
        Some(ConfigCommand::Show) => {
            let config = load_config(cli, &root)?;

            match output_mode(cli) {
                OutputMode::Human => {
                    let toml_str = toml::to_string_pretty(&config)
                        .map_err(|e| CliError::Internal(format!("serialize config: {e}")))?;
                    println!("{toml_str}");
                }
                OutputMode::Json => {
                    let payload = json!({
                        "command": "config show",
                        "config": serde_json::to_value(&config)?,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
        Some(ConfigCommand::Validate) => match Config::load(&root, cli.config.as_deref()) {
            Ok(config) => {
                let hash = config.stable_hash()?;
                let source = config
                    .config_file
                    .as_ref()
                    .map_or_else(|| "(built-in defaults)".to_string(), |p| p.display().to_string());

                match output_mode(cli) {
                    OutputMode::Human => {
                        println!("Configuration is valid.");
                        println!("  Source: {source}");
                        println!("  Hash: {hash}");
                    }
                    OutputMode::Json => {
                        let payload = json!({
                            "command": "config validate",
                            "valid": true,
                            "path": source,
                            "hash": hash,
                        });
                        write_json_line(&payload)?;
                    }
                }
                Ok(())
            }
            Err(e) => {
                match output_mode(cli) {
                    OutputMode::Human => {
                        eprintln!("Configuration is INVALID: {e}");
                    }
                    OutputMode::Json => {
                        let payload = json!({
                            "command": "config validate",
                            "valid": false,
                            "error": e.to_string(),
                            "code": e.code(),
                        });
                        write_json_line(&payload)?;
                    }
                }
                Err(CliError::User(format!("invalid config: {e}")))
            }
        },
    }
}

// ──────────────────── shared plumbing ────────────────────

fn load_config(cli: &Cli, root: &Path) -> Result<Config, CliError> {
    let mut config = Config::load(root, cli.config.as_deref())?;
    if let Some(log_file) = &cli.log_file {
        config.logging.jsonl_log = Some(log_file.clone());
    }
    Ok(config)
}

fn verbosity(cli: &Cli) -> Verbosity {
    if cli.quiet {
        Verbosity::Quiet
    } else if cli.verbose {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    }
}

/// Human mode renders colored progress on stdout; JSON mode keeps stdout for
/// the report and sends plain progress lines to stderr.
fn build_logger(cli: &Cli, mode: OutputMode, config: &Config) -> ActivityLogger {
    let mut logger = match mode {
        OutputMode::Human => {
            ActivityLogger::new(verbosity(cli), ConsoleTarget::Stdout).with_console_hook(print_event)
        }
        OutputMode::Json => ActivityLogger::new(verbosity(cli), ConsoleTarget::Stderr),
    };
    if let Some(path) = &config.logging.jsonl_log {
        logger = logger.with_jsonl(JsonlConfig::at(path));
    }
    logger
}

fn print_event(event: &ActivityEvent) {
    let line = event.human_line();
    let styled = match event {
        ActivityEvent::AbiWritten { .. } => line.green(),
        ActivityEvent::FileRenamed { .. } => line.cyan(),
        ActivityEvent::ArtifactSkipped {
            reason: SkipReason::NoAbi { .. },
            ..
        }
        | ActivityEvent::NameCollision { .. } => line.yellow(),
        ActivityEvent::ArtifactSkipped { .. } | ActivityEvent::RunStarted { .. } => line.dimmed(),
        ActivityEvent::ArtifactFailed { .. }
        | ActivityEvent::RenameFailed { .. }
        | ActivityEvent::RunAborted { .. } => line.red(),
        ActivityEvent::RunCompleted { .. } => line.bold(),
    };
    let is_failure = matches!(
        event,
        ActivityEvent::ArtifactFailed { .. }
            | ActivityEvent::RenameFailed { .. }
            | ActivityEvent::RunAborted { .. }
    );
    if is_failure {
        let _ = writeln!(io::stderr(), "{styled}");
    } else {
        let _ = writeln!(io::stdout(), "{styled}");
    }
}

fn write_json_line(payload: &Value) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, payload)?;
    writeln!(stdout)?;
    Ok(())
}

fn output_mode(cli: &Cli) -> OutputMode {
    let env_mode = std::env::var("ABX_OUTPUT_FORMAT").ok();
    resolve_output_mode(cli.json, env_mode.as_deref(), io::stdout().is_terminal())
}

fn resolve_output_mode(json_flag: bool, env_mode: Option<&str>, stdout_is_tty: bool) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }

    let fallback = if stdout_is_tty {
        OutputMode::Human
    } else {
        OutputMode::Json
    };

    match env_mode
        .map(str::trim)
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("json") => OutputMode::Json,
        Some("human") => OutputMode::Human,
        Some(_) | None => fallback,
    }
}
