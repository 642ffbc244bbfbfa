//! Artifact scanner: directory walker, artifact parsing, first-party path rules.

pub mod artifact;
pub mod patterns;
pub mod walker;
