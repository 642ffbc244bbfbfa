//! Compiled artifact model: ABI payload plus the compilation metadata that
//! records which source file produced it.
//!
//! Compilers emit `metadata` either as an embedded object or as a JSON document
//! encoded into a string. [`MetadataField`] captures both shapes and
//! [`MetadataField::normalize`] is the single place they are reconciled.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::core::errors::{AbxError, Result};

/// Raw `metadata` field as found in an artifact.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MetadataField {
    /// Metadata serialized into a JSON string (solc standard-json output).
    Encoded(String),
    /// Metadata embedded directly as a JSON value.
    Structured(Value),
}

/// Subset of solc compilation metadata this tool consumes.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CompilerMetadata {
    #[serde(default)]
    pub settings: Option<CompilerSettings>,
}

/// `metadata.settings`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CompilerSettings {
    /// Source path → contract name, in the order the compiler wrote them.
    #[serde(rename = "compilationTarget", default)]
    pub compilation_target: Option<Map<String, Value>>,
}

impl MetadataField {
    /// Reduce either shape to typed metadata.
    ///
    /// A string that is not valid JSON, or a value of the wrong shape, yields
    /// `None`: the artifact is treated as having no metadata, not as an error.
    #[must_use]
    pub fn normalize(&self) -> Option<CompilerMetadata> {
        match self {
            Self::Encoded(raw) => serde_json::from_str(raw).ok(),
            Self::Structured(value) => CompilerMetadata::deserialize(value).ok(),
        }
    }
}

impl CompilerMetadata {
    /// First source path listed in `settings.compilationTarget`.
    #[must_use]
    pub fn compilation_target(&self) -> Option<&str> {
        self.settings
            .as_ref()?
            .compilation_target
            .as_ref()?
            .keys()
            .next()
            .map(String::as_str)
    }
}

/// One compiled contract unit, read once from disk.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Artifact {
    /// Opaque ABI payload, passed through verbatim. `null` counts as absent.
    #[serde(default)]
    pub abi: Option<Value>,
    #[serde(default)]
    pub metadata: Option<MetadataField>,
}

impl Artifact {
    /// Read and parse an artifact file.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|source| AbxError::io(path, source))?;
        Self::from_slice(path, &bytes)
    }

    /// Parse artifact bytes; `path` is used for error context only.
    pub fn from_slice(path: &Path, bytes: &[u8]) -> Result<Self> {
        let value: Value =
            serde_json::from_slice(bytes).map_err(|e| AbxError::artifact_parse(path, &e))?;
        if !value.is_object() {
            return Err(AbxError::InvalidArtifact {
                path: path.to_path_buf(),
                reason: format!("expected a JSON object, found {}", json_kind(&value)),
            });
        }
        Self::deserialize(value).map_err(|e| AbxError::artifact_parse(path, &e))
    }

    /// Normalized compilation metadata, if present and well-formed.
    #[must_use]
    pub fn compiler_metadata(&self) -> Option<CompilerMetadata> {
        self.metadata.as_ref()?.normalize()
    }

    /// Source file this artifact was compiled from.
    #[must_use]
    pub fn resolved_source_path(&self) -> Option<String> {
        self.compiler_metadata()?
            .compilation_target()
            .map(str::to_string)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
