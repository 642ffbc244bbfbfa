//! Output naming and ABI file writing.

#![allow(missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::core::errors::{AbxError, Result};
use crate::scanner::walker::ARTIFACT_EXTENSION;

/// Output contract name: `prefix` followed by the artifact's file stem.
///
/// `out/Token.sol/Token.0.8.19.json` with prefix `I` gives `IToken.0.8.19`;
/// the cleanup pass later strips the version suffix. Returns `None` when the
/// stem is empty or not valid UTF-8.
#[must_use]
pub fn contract_name_for(artifact_path: &Path, prefix: &str) -> Option<String> {
    let stem = artifact_path.file_stem()?.to_str()?;
    if stem.is_empty() {
        return None;
    }
    Some(format!("{prefix}{stem}"))
}

/// Result of one [`AbiWriter::write`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    pub path: PathBuf,
    /// Size of the rendered ABI (what was or would be written).
    pub bytes: usize,
    /// A file already existed at `path` before this write, typically left by
    /// an earlier run.
    pub replaced_existing: bool,
}

/// Writes pretty-printed ABI files into a flat output directory.
#[derive(Debug, Clone)]
pub struct AbiWriter {
    output_dir: PathBuf,
    dry_run: bool,
}

impl AbiWriter {
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>, dry_run: bool) -> Self {
        Self {
            output_dir: output_dir.into(),
            dry_run,
        }
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// `<output_dir>/<name>.json`.
    #[must_use]
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.output_dir.join(format!("{name}.{ARTIFACT_EXTENSION}"))
    }

    /// Create the output directory if needed. No-op in dry-run mode.
    pub fn ensure_output_dir(&self) -> Result<()> {
        if self.dry_run {
            return Ok(());
        }
        fs::create_dir_all(&self.output_dir).map_err(|source| AbxError::io(&self.output_dir, source))
    }

    /// Serialize `abi` with 2-space indentation and write it in a single call,
    /// replacing any existing file of the same name.
    pub fn write(&self, name: &str, abi: &Value) -> Result<WriteOutcome> {
        let path = self.path_for(name);
        let rendered = serde_json::to_string_pretty(abi).map_err(|e| AbxError::Serialization {
            context: "abi output",
            details: e.to_string(),
        })?;
        let replaced_existing = path.is_file();

        if !self.dry_run {
            fs::write(&path, rendered.as_bytes()).map_err(|source| AbxError::io(&path, source))?;
        }

        Ok(WriteOutcome {
            path,
            bytes: rendered.len(),
            replaced_existing,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn name_is_prefix_plus_stem() {
        let path = Path::new("out/Token.sol/Token.json");
        assert_eq!(contract_name_for(path, "I").as_deref(), Some("IToken"));
        assert_eq!(contract_name_for(path, "").as_deref(), Some("Token"));
    }

    #[test]
    fn versioned_stem_keeps_suffix_for_cleanup() {
        let path = Path::new("out/Token.sol/Token.0.8.19.json");
        assert_eq!(
            contract_name_for(path, "I").as_deref(),
            Some("IToken.0.8.19")
        );
    }

    #[test]
    fn empty_stem_has_no_name() {
        assert_eq!(contract_name_for(Path::new("out/"), "I"), None);
    }

    #[test]
    fn writes_two_space_indented_json_without_trailing_newline() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = AbiWriter::new(tmp.path(), false);
        let abi = json!([{ "type": "function", "name": "transfer" }]);

        let outcome = writer.write("IToken", &abi).unwrap();
        assert_eq!(outcome.path, tmp.path().join("IToken.json"));
        assert!(!outcome.replaced_existing);

        let written = fs::read_to_string(&outcome.path).unwrap();
        assert_eq!(
            written,
            "[\n  {\n    \"type\": \"function\",\n    \"name\": \"transfer\"\n  }\n]"
        );
        assert_eq!(outcome.bytes, written.len());
    }

    #[test]
    fn overwrites_existing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = AbiWriter::new(tmp.path(), false);
        fs::write(tmp.path().join("IToken.json"), "stale").unwrap();

        let outcome = writer.write("IToken", &json!([])).unwrap();
        assert!(outcome.replaced_existing);
        assert_eq!(fs::read_to_string(&outcome.path).unwrap(), "[]");
    }

    #[test]
    fn dry_run_touches_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("abis");
        let writer = AbiWriter::new(&out, true);
        writer.ensure_output_dir().unwrap();
        let outcome = writer.write("IToken", &json!([])).unwrap();
        assert_eq!(outcome.bytes, 2);
        assert!(!out.exists());
    }

    #[test]
    fn write_into_missing_dir_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = AbiWriter::new(tmp.path().join("missing"), false);
        let err = writer.write("IToken", &json!([])).unwrap_err();
        assert_eq!(err.code(), "ABX-3002");
    }
}
