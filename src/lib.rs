//! Manifest integrity and state tracking for bioimage-analysis projects.
//!
//! One structured YAML document (`manifest.yaml`) describes a project:
//! its identity, the registry of tracked outputs with their figure
//! source trees, and a hierarchical time-tracking worklog. This crate is
//! the engine behind it — schema validation that reports every violated
//! rule at once, atomic persistence with failure-triggered backups, and
//! the punch-clock state machine — plus the CLI that drives it.

pub mod cli;
pub mod error;
pub mod models;
pub mod render;
pub mod scaffold;
pub mod schema;
pub mod store;
pub mod validate;
pub mod worklog;
