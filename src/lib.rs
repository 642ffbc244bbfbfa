#![forbid(unsafe_code)]

//! abi_extract: pulls contract ABIs out of compiled smart-contract build
//! artifacts and republishes them as standalone, cleanly named JSON files.
//!
//! One run has three stages:
//! 1. **Scanner**: walks the artifact tree (`out/` by default) and resolves the
//!    source file each artifact was compiled from
//! 2. **Exporter**: keeps first-party sources (include prefixes, exclude
//!    substrings) and writes `abis/<Prefix><Name>.json`
//! 3. **Cleanup**: strips version suffixes (`IToken.0.8.19.json` → `IToken.json`)
//!
//! # Library usage
//!
//! ```rust,no_run
//! use abi_extract::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let root = std::path::Path::new("/path/to/project");
//! let config = Config::load(root, None)?.resolve_against(root);
//! let mut logger = ActivityLogger::silent();
//! let report = run(&config, &mut logger)?;
//! println!("{}", report.extraction.summary_line());
//! # Ok(())
//! # }
//! ```

pub mod prelude;

pub mod core;
pub mod exporter;
pub mod logger;
pub mod scanner;
