//! Configuration system using TOML files.
//!
//! Config is stored in the OS-standard config directory:
//! - Windows: %APPDATA%\music-keeper\config.toml
//! - macOS: ~/Library/Application Support/music-keeper/config.toml
//! - Linux: ~/.config/music-keeper/config.toml
//!
//! An explicit path (from `--config` or `MUSIC_KEEPER_CONFIG`) takes
//! precedence. Loading never fails: a missing or unparsable file falls back
//! to defaults — empty genre rule set, stock paths — with a warning.
//! Whether the configured path roots actually exist is checked by the
//! engines when they start, because only they know which roots they need.
//!
//! The loaded [`Config`] is immutable and passed to each component at
//! construction; there is no ambient global.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path roots for the relocation engine
    pub paths: PathsConfig,

    /// Ordered genre mapping rules; first matching pattern wins
    pub genre_rules: Vec<GenreRule>,
}

/// Source and destination roots.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Flat intake directory the relocation engine consumes
    pub downloads: PathBuf,

    /// Canonical destination tree, one subdirectory per main artist
    pub music: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            downloads: PathBuf::from("/downloads"),
            music: PathBuf::from("/music/downloads"),
        }
    }
}

/// One genre mapping rule: a regex pattern matched against the cleaned
/// (lower-cased) genre, and the canonical label to substitute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenreRule {
    pub pattern: String,
    pub genre: String,
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("music-keeper"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load configuration from disk.
///
/// `override_path` wins over the standard location. Returns default config
/// if the file doesn't exist or can't be parsed. Logs warnings but doesn't
/// fail - we always return a usable config.
pub fn load(override_path: Option<&Path>) -> Config {
    let path = match override_path {
        Some(p) => p.to_path_buf(),
        None => match config_path() {
            Some(p) => p,
            None => {
                tracing::warn!(
                    category = "config",
                    subsystem = "load",
                    "could not determine config directory, using defaults"
                );
                return Config::default();
            }
        },
    };

    if !path.exists() {
        tracing::info!(
            category = "config",
            subsystem = "load",
            "no config file found at {:?}, using defaults",
            path
        );
        return Config::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => {
                tracing::info!(category = "config", subsystem = "load", "loaded config from {:?}", path);
                config
            }
            Err(e) => {
                tracing::error!(
                    category = "config",
                    subsystem = "load",
                    "failed to parse config file {:?}: {}",
                    path,
                    e
                );
                tracing::warn!(category = "config", subsystem = "load", "using default configuration");
                Config::default()
            }
        },
        Err(e) => {
            tracing::error!(
                category = "config",
                subsystem = "load",
                "failed to read config file {:?}: {}",
                path,
                e
            );
            Config::default()
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
