//! ABI export: selection and writing, filename cleanup, run reports.

pub mod cleanup;
pub mod pipeline;
pub mod report;
pub mod writer;
