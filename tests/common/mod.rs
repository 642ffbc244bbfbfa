#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::{Map, Value, json};

pub struct CmdResult {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub log_path: PathBuf,
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis())
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn resolve_bin_path() -> PathBuf {
    if let Ok(path) = std::env::var("CARGO_BIN_EXE_abix") {
        return PathBuf::from(path);
    }

    let exe_name = if cfg!(windows) { "abix.exe" } else { "abix" };
    let fallback = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(PathBuf::from))
        .and_then(|deps| deps.parent().map(PathBuf::from))
        .map(|debug_dir| debug_dir.join(exe_name));

    match fallback {
        Some(path) if path.exists() => path,
        _ => panic!("unable to resolve abix binary path for integration test"),
    }
}

/// Run the binary with `ABX_*` variables cleared and a fixed output format.
pub fn run_cli_case(case_name: &str, args: &[&str]) -> CmdResult {
    run_cli_case_with_format(case_name, args, "human")
}

pub fn run_cli_case_with_format(case_name: &str, args: &[&str], format: &str) -> CmdResult {
    let root = std::env::temp_dir().join("abix-test-logs");
    fs::create_dir_all(&root).expect("create temp test log dir");

    let log_path = root.join(format!("{}-{}.log", sanitize(case_name), now_millis()));
    let bin_path = resolve_bin_path();

    let mut command = Command::new(&bin_path);
    command
        .args(args)
        .env("ABX_OUTPUT_FORMAT", format)
        .env("RUST_BACKTRACE", "1");
    for (key, _) in std::env::vars() {
        if key.starts_with("ABX_") && key != "ABX_OUTPUT_FORMAT" {
            command.env_remove(key);
        }
    }
    let output = command.output().expect("execute abix command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    let mut log_content = String::new();
    log_content.push_str(&format!("case={case_name}\n"));
    log_content.push_str(&format!("bin={}\n", bin_path.display()));
    log_content.push_str(&format!("args={args:?}\n"));
    log_content.push_str(&format!("status={}\n", output.status));
    log_content.push_str("----- stdout -----\n");
    log_content.push_str(&stdout);
    log_content.push('\n');
    log_content.push_str("----- stderr -----\n");
    log_content.push_str(&stderr);
    log_content.push('\n');
    fs::write(&log_path, log_content).expect("write test log");

    CmdResult {
        status: output.status,
        stdout,
        stderr,
        log_path,
    }
}

// ──────────────────── artifact fixtures ────────────────────

/// Artifact compiled from `source` with the given ABI and object metadata.
pub fn artifact(source: &str, abi: &Value) -> Value {
    let mut target = Map::new();
    target.insert(source.to_string(), json!("Contract"));
    json!({
        "abi": abi,
        "bytecode": { "object": "0x6080" },
        "metadata": { "settings": { "compilationTarget": target } }
    })
}

/// Same artifact shape with `metadata` encoded as a JSON string.
pub fn artifact_with_encoded_metadata(source: &str, abi: &Value) -> Value {
    let mut target = Map::new();
    target.insert(source.to_string(), json!("Contract"));
    let metadata = json!({ "settings": { "compilationTarget": target } }).to_string();
    json!({ "abi": abi, "metadata": metadata })
}

pub fn transfer_abi() -> Value {
    json!([{ "type": "function", "name": "transfer" }])
}

/// Write `value` to `<root>/out/<rel>`.
pub fn put_artifact(root: &Path, rel: &str, value: &Value) -> PathBuf {
    let path = root.join("out").join(rel);
    fs::create_dir_all(path.parent().expect("artifact parent")).expect("create artifact dir");
    fs::write(&path, value.to_string()).expect("write artifact");
    path
}

pub fn read_json(path: &Path) -> Value {
    let raw = fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("read {}: {e}", path.display()));
    serde_json::from_str(&raw).unwrap_or_else(|e| panic!("parse {}: {e}", path.display()))
}

/// Sorted file names directly inside `dir`.
pub fn list_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap_or_else(|e| panic!("read_dir {}: {e}", dir.display()))
        .map(|entry| {
            entry
                .expect("dir entry")
                .file_name()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    names.sort();
    names
}
