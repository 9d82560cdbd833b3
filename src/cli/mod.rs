//! Command-line interface module.
//!
//! Provides argument parsing and CLI command handling. This layer only reads
//! the engine's published state and invokes its control operations; all
//! monitoring logic lives in `core`.

pub mod args;
pub mod commands;
