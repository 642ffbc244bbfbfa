//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use abi_extract::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{AbxError, Result};

// Scanner
pub use crate::scanner::artifact::{Artifact, MetadataField};
pub use crate::scanner::patterns::{FilterDecision, PathFilter};
pub use crate::scanner::walker::{DirectoryWalker, WalkerConfig, walk_json_files};

// Exporter
pub use crate::exporter::cleanup::{
    clean_abi_filenames, clean_abi_filenames_with, clean_file_name,
};
pub use crate::exporter::pipeline::{extract_abis, run};
pub use crate::exporter::report::{CleanupReport, ExtractionReport, RunReport, SkipReason};
pub use crate::exporter::writer::{AbiWriter, contract_name_for};

// Logger
pub use crate::logger::activity::{ActivityEvent, ActivityLogger, ConsoleTarget, Verbosity};
pub use crate::logger::jsonl::JsonlConfig;
