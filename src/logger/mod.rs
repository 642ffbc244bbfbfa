//! Activity logging: console progress plus an optional append-only JSONL history.

pub mod activity;
pub mod jsonl;
