//! CLI command definitions and handlers.
//!
//! Each subcommand is implemented as a function that takes the parsed
//! arguments and returns an `anyhow::Result<()>`. Directory arguments are
//! validated up front; a missing or unreadable directory fails the command,
//! which the process reports as exit code 1.

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio::runtime::Runtime;

use crate::genre::GenreMapper;
use crate::{config, db, library, metadata, normalizer, organizer, scanner};

/// Music Keeper CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file (default: OS config directory)
    #[arg(long, env = "MUSIC_KEEPER_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Scan a directory tree into the catalog
    Scan {
        /// Path to the directory to scan
        path: PathBuf,
        /// Catalog database path (default: music_keeper.db)
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Normalize tags and move downloaded files into the music tree
    Organize {
        /// Intake directory (default: [paths].downloads from config)
        #[arg(long)]
        downloads: Option<PathBuf>,
        /// Destination music root (default: [paths].music from config)
        #[arg(long)]
        music: Option<PathBuf>,
        /// Catalog database path (default: music_keeper.db)
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// List the unique genre values found in a directory's audio files
    Genres {
        /// Directory to inspect
        directory: PathBuf,
        /// Recurse into subdirectories
        #[arg(short, long)]
        recursive: bool,
        /// Pass each genre through the configured mapping rules
        #[arg(long)]
        map: bool,
    },
    /// List all tracks in the catalog
    List {
        /// Catalog database path (default: music_keeper.db)
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

/// Run the specified CLI command.
pub fn run_command(cli: &Cli) -> anyhow::Result<()> {
    let rt = Runtime::new()?;

    match &cli.command {
        Commands::Scan { path, db } => cmd_scan(&rt, path, db.as_deref()),
        Commands::Organize { downloads, music, db } => {
            cmd_organize(&rt, cli.config.as_deref(), downloads.as_deref(), music.as_deref(), db.as_deref())
        }
        Commands::Genres { directory, recursive, map } => {
            cmd_genres(cli.config.as_deref(), directory, *recursive, *map)
        }
        Commands::List { db } => cmd_list(&rt, db.as_deref()),
    }
}

/// Fail when `path` is not a directory we can actually read.
fn check_scannable_dir(path: &Path) -> anyhow::Result<()> {
    if !path.is_dir() {
        bail!("{} is not a valid directory", path.display());
    }
    std::fs::read_dir(path).with_context(|| format!("cannot read directory {}", path.display()))?;
    Ok(())
}

// ============================================================================
// Individual command implementations
// ============================================================================

fn cmd_scan(rt: &Runtime, path: &Path, db: Option<&Path>) -> anyhow::Result<()> {
    check_scannable_dir(path)?;

    rt.block_on(async {
        let pool = db::init_db(&db::db_url(db)).await.context("failed to open catalog")?;
        println!("Scanning directory: {}", path.display());

        let summary = library::sync_directory(&pool, path)
            .await
            .context("scan failed")?;

        println!("Scan complete: {summary}");
        Ok(())
    })
}

fn cmd_organize(
    rt: &Runtime,
    config_path: Option<&Path>,
    downloads: Option<&Path>,
    music: Option<&Path>,
    db: Option<&Path>,
) -> anyhow::Result<()> {
    let config = config::load(config_path);
    let downloads = downloads.unwrap_or(&config.paths.downloads);
    let music = music.unwrap_or(&config.paths.music);

    // A relocation run without its intake directory is a setup error, not
    // something to quietly skip.
    if !downloads.is_dir() {
        bail!("downloads directory {} does not exist", downloads.display());
    }

    let mapper = GenreMapper::new(&config.genre_rules);
    println!("Organizing {} -> {}", downloads.display(), music.display());

    rt.block_on(async {
        let pool = db::init_db(&db::db_url(db)).await.context("failed to open catalog")?;
        let summary = organizer::process_downloads(Some(&pool), downloads, music, &mapper)
            .await
            .context("organize failed")?;

        println!("Organize complete: {summary}");
        Ok(())
    })
}

fn cmd_genres(config_path: Option<&Path>, directory: &Path, recursive: bool, map: bool) -> anyhow::Result<()> {
    check_scannable_dir(directory)?;

    let mut genres: BTreeSet<String> = BTreeSet::new();
    let files: Vec<PathBuf> = if recursive {
        walkdir::WalkDir::new(directory)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .collect()
    } else {
        std::fs::read_dir(directory)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .collect()
    };

    for path in files.into_iter().filter(|p| scanner::is_audio_file(p)) {
        let Ok(fields) = metadata::read(&path) else {
            continue;
        };
        if let Some(genre) = fields.genre {
            let cleaned = normalizer::sanitize(&genre);
            if !cleaned.is_empty() {
                genres.insert(cleaned);
            }
        }
    }

    let mapper = if map {
        let config = config::load(config_path);
        Some(GenreMapper::new(&config.genre_rules))
    } else {
        None
    };

    let mut output: serde_json::Map<String, serde_json::Value> = serde_json::Map::new();
    for genre in &genres {
        let label = match &mapper {
            Some(mapper) => mapper.map(Some(genre.as_str())),
            None => genre.clone(),
        };
        output.insert(label, serde_json::Value::String(String::new()));
    }
    if output.is_empty() {
        output.insert("Unknown".to_string(), serde_json::Value::String(String::new()));
    }

    println!("{}", serde_json::to_string_pretty(&serde_json::Value::Object(output))?);
    Ok(())
}

fn cmd_list(rt: &Runtime, db: Option<&Path>) -> anyhow::Result<()> {
    rt.block_on(async {
        let pool = db::init_db(&db::db_url(db)).await.context("failed to open catalog")?;
        let tracks = db::get_all_tracks(&pool).await.context("failed to query catalog")?;

        for track in tracks {
            println!(
                "[{:>5.1}] {} - {}",
                track.completeness,
                track.title.as_deref().unwrap_or("<untitled>"),
                track.path
            );
        }
        Ok(())
    })
}
