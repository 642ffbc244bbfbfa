//! ABX-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, AbxError>;

/// Top-level error type for the ABI extractor.
#[derive(Debug, Error)]
pub enum AbxError {
    #[error("[ABX-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[ABX-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[ABX-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[ABX-1101] source directory does not exist: {path}")]
    MissingSourceDir { path: PathBuf },

    #[error("[ABX-2001] artifact parse failure for {path}: {details}")]
    ArtifactParse { path: PathBuf, details: String },

    #[error("[ABX-2002] invalid artifact {path}: {reason}")]
    InvalidArtifact { path: PathBuf, reason: String },

    #[error("[ABX-2101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[ABX-3001] permission denied for {path}")]
    PermissionDenied { path: PathBuf },

    #[error("[ABX-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[ABX-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl AbxError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "ABX-1001",
            Self::MissingConfig { .. } => "ABX-1002",
            Self::ConfigParse { .. } => "ABX-1003",
            Self::MissingSourceDir { .. } => "ABX-1101",
            Self::ArtifactParse { .. } => "ABX-2001",
            Self::InvalidArtifact { .. } => "ABX-2002",
            Self::Serialization { .. } => "ABX-2101",
            Self::PermissionDenied { .. } => "ABX-3001",
            Self::Io { .. } => "ABX-3002",
            Self::Runtime { .. } => "ABX-3900",
        }
    }

    /// Whether the error aborts a whole run rather than a single file.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfig { .. }
                | Self::MissingConfig { .. }
                | Self::ConfigParse { .. }
                | Self::MissingSourceDir { .. }
        )
    }

    /// Convenience constructor for IO errors with a known path.
    ///
    /// `PermissionDenied` IO errors map to their own variant so reports can
    /// tell them apart from transient failures.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::PermissionDenied {
            return Self::PermissionDenied {
                path: path.as_ref().to_path_buf(),
            };
        }
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Convenience constructor for JSON parse errors on an artifact file.
    #[must_use]
    pub fn artifact_parse(path: impl AsRef<Path>, error: &serde_json::Error) -> Self {
        Self::ArtifactParse {
            path: path.as_ref().to_path_buf(),
            details: error.to_string(),
        }
    }
}

impl From<serde_json::Error> for AbxError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for AbxError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}
