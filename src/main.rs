//! Music Keeper - keeps a catalog of audio files in sync with the
//! filesystem and tidies downloads into a canonical library layout.
//!
//! Two engines share one data model: the sync engine walks a tree and
//! reconciles the SQLite catalog against it, and the organize engine
//! normalizes tags (genre rules, featuring credits) and relocates files
//! under `<music>/<artist>/`.

pub mod cli;
pub mod config;
pub mod db;
pub mod diagnostics;
pub mod error;
pub mod genre;
pub mod library;
pub mod metadata;
pub mod model;
pub mod normalizer;
pub mod organizer;
pub mod scanner;
#[cfg(test)]
pub mod test_utils;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(EnvFilter::from_default_env().add_directive("music_keeper=info".parse().unwrap()))
        .init();

    cli::run_command(&args)
}
