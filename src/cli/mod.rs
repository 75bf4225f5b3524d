//! Command-line interface for music-keeper.
//!
//! This module provides the CLI commands for scanning a library tree into
//! the catalog, organizing downloaded files, and inspecting genres and
//! catalog contents.

mod commands;

pub use commands::{Cli, Commands, run_command};
