//! File relocation into the canonical library layout.
//!
//! Each file moves through a fixed pipeline: load tags, normalize, compute
//! the destination `<music>/<artist>/artist - album - NN - title.ext`,
//! resolve a name collision, write the normalized tags back, then move and
//! adjust permissions. Every step can fail, and failure is always scoped to
//! the one file — the batch carries on. Outcomes are typed values, never
//! swallowed exceptions.
//!
//! Collisions are resolved by "last writer wins, but genre is sticky": the
//! genre already present at the destination overrides the incoming genre,
//! the old file is deleted, and the new file takes its place.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::genre::GenreMapper;
use crate::metadata::{self, WriteBack};
use crate::normalizer::{self, NormalizedTags};
use crate::{db, scanner};

/// Pipeline stage names for failure reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    LoadTags,
    ResolveCollision,
    SaveTags,
    EnsureDestination,
    Move,
    AdjustPermissions,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::LoadTags => "load-tags",
            Stage::ResolveCollision => "resolve-collision",
            Stage::SaveTags => "save-tags",
            Stage::EnsureDestination => "ensure-destination",
            Stage::Move => "move",
            Stage::AdjustPermissions => "adjust-permissions",
        };
        f.write_str(name)
    }
}

/// Why a file was skipped without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Source directory is not readable+writable
    SourceNotAccessible,
    /// Destination directory is not readable+writable
    DestinationNotAccessible,
}

/// Terminal state of one file's relocation.
#[derive(Debug, Clone)]
pub enum RelocateOutcome {
    Moved { from: PathBuf, to: PathBuf },
    Skipped { path: PathBuf, reason: SkipReason },
    Failed { path: PathBuf, stage: Stage, message: String },
}

/// End-of-batch accounting.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub moved: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} moved, {} skipped, {} failed", self.moved, self.skipped, self.failed)
    }
}

/// Format a raw track number tag as the 2-digit filename segment.
///
/// Takes the part before any `/` ("7/12" names track 7 of 12); anything
/// non-numeric, including a missing tag, falls back to "01".
pub fn format_track_number(raw: Option<&str>) -> String {
    raw.and_then(|value| value.split('/').next())
        .and_then(|number| number.trim().parse::<u32>().ok())
        .map(|number| format!("{:02}", number))
        .unwrap_or_else(|| "01".to_string())
}

/// Compute the canonical destination for one file.
pub fn destination_for(
    music_root: &Path,
    tags: &NormalizedTags,
    track_number: Option<&str>,
    ext: &str,
) -> PathBuf {
    let number = format_track_number(track_number);
    let filename = format!(
        "{artist} - {album} - {number} - {title}{ext}",
        artist = tags.main_artist,
        album = tags.album,
        title = tags.title,
    );
    music_root.join(&tags.main_artist).join(filename)
}

/// Relocate one file into the canonical layout under `music_root`.
///
/// Never returns an error: every failure mode is a [`RelocateOutcome`]
/// scoped to this file.
pub fn relocate_file(path: &Path, music_root: &Path, mapper: &GenreMapper) -> RelocateOutcome {
    let failed = |stage: Stage, message: String| {
        warn!(
            category = "organize",
            subsystem = "relocate",
            "{} failed at {}: {}",
            path.display(),
            stage,
            message
        );
        RelocateOutcome::Failed {
            path: path.to_path_buf(),
            stage,
            message,
        }
    };

    // Discovered -> TagsLoaded
    let fields = match metadata::read(path) {
        Ok(fields) => fields,
        Err(e) => return failed(Stage::LoadTags, e.to_string()),
    };

    // TagsLoaded -> TagsNormalized (pure, infallible)
    let mut tags = normalizer::normalize(&fields, mapper);

    // TagsNormalized -> DestinationComputed
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| format!(".{}", s.to_lowercase()))
        .unwrap_or_default();
    let dest = destination_for(music_root, &tags, fields.track_number.as_deref(), &ext);
    let dest_dir = dest.parent().unwrap_or(music_root).to_path_buf();

    // [CollisionResolved]: the incumbent's genre wins, the incumbent goes.
    if dest.exists() {
        if let Some(existing_genre) = metadata::read(&dest).ok().and_then(|f| f.genre) {
            if existing_genre != tags.genre {
                info!(
                    category = "organize",
                    subsystem = "collision",
                    "keeping existing genre {:?} over {:?} for {}",
                    existing_genre,
                    tags.genre,
                    dest.display()
                );
                tags.genre = existing_genre;
            }
        }
        if let Err(e) = fs::remove_file(&dest) {
            return failed(Stage::ResolveCollision, format!("cannot replace {}: {}", dest.display(), e));
        }
        info!(
            category = "organize",
            subsystem = "collision",
            "replaced existing {}",
            dest.display()
        );
    }

    // Normalized tags land in the source file before it moves; a crash
    // between save and move leaves a re-scannable file either way.
    let write_back = WriteBack {
        artist: tags.main_artist.clone(),
        title: tags.title.clone(),
        genre: tags.genre.clone(),
    };
    if let Err(e) = metadata::write_back(path, &write_back) {
        return failed(Stage::SaveTags, e.to_string());
    }

    if let Err(e) = ensure_directory(&dest_dir) {
        return failed(Stage::EnsureDestination, e.to_string());
    }

    // Access verification: abort this file quietly when either side is off
    // limits; this is an environment problem, not a pipeline failure.
    let source_dir = path.parent().unwrap_or(Path::new("."));
    if !dir_accessible(source_dir) {
        warn!(
            category = "organize",
            subsystem = "access",
            "no read/write access to source directory {}",
            source_dir.display()
        );
        return RelocateOutcome::Skipped {
            path: path.to_path_buf(),
            reason: SkipReason::SourceNotAccessible,
        };
    }
    if !dir_accessible(&dest_dir) {
        warn!(
            category = "organize",
            subsystem = "access",
            "no read/write access to destination directory {}",
            dest_dir.display()
        );
        return RelocateOutcome::Skipped {
            path: path.to_path_buf(),
            reason: SkipReason::DestinationNotAccessible,
        };
    }

    // DestinationComputed -> Moved
    if let Err(e) = move_file(path, &dest) {
        return failed(Stage::Move, e.to_string());
    }

    // Moved -> PermissionsAdjusted: best effort, EPERM tolerated
    if let Err(e) = chmod(&dest, 0o664) {
        if is_operation_not_permitted(&e) {
            warn!(
                category = "organize",
                subsystem = "permissions",
                "ignoring non-blocking permission error on {}: {}",
                dest.display(),
                e
            );
        } else {
            return failed(Stage::AdjustPermissions, e.to_string());
        }
    }

    info!(
        category = "organize",
        subsystem = "relocate",
        "moved {} -> {}",
        path.display(),
        dest.display()
    );
    RelocateOutcome::Moved {
        from: path.to_path_buf(),
        to: dest,
    }
}

/// Relocate every audio file in the top level of `downloads`.
///
/// Files are processed one at a time; a pool, when given, has the catalog
/// row of each successfully moved source path deleted (the destination is
/// picked up by the next scan).
pub async fn process_downloads(
    pool: Option<&SqlitePool>,
    downloads: &Path,
    music_root: &Path,
    mapper: &GenreMapper,
) -> Result<BatchSummary> {
    if !downloads.is_dir() {
        return Err(Error::not_found(downloads));
    }
    // The destination root must exist before any file is considered.
    ensure_directory(music_root)
        .map_err(|e| Error::organization(format!("cannot prepare {}: {}", music_root.display(), e)))?;

    let mut entries: Vec<PathBuf> = fs::read_dir(downloads)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && scanner::is_audio_file(path))
        .collect();
    entries.sort();

    let mut summary = BatchSummary::default();
    for path in entries {
        // Canonicalize before the move; afterwards the source is gone.
        let source_key = fs::canonicalize(&path)
            .unwrap_or_else(|_| path.clone())
            .to_string_lossy()
            .to_string();

        match relocate_file(&path, music_root, mapper) {
            RelocateOutcome::Moved { .. } => {
                summary.moved += 1;
                if let Some(pool) = pool {
                    // The moved-away path no longer exists; drop its row.
                    if db::delete_track(pool, &source_key).await? {
                        info!(
                            category = "organize",
                            subsystem = "catalog",
                            "invalidated catalog entry for {}",
                            source_key
                        );
                    }
                }
            }
            RelocateOutcome::Skipped { .. } => summary.skipped += 1,
            RelocateOutcome::Failed { .. } => summary.failed += 1,
        }
    }

    info!(category = "organize", subsystem = "summary", "organize complete: {summary}");
    Ok(summary)
}

/// Create `path` (and parents) if needed, then apply the standard directory
/// mode. An EPERM from the chmod alone is logged and tolerated; any other
/// failure propagates.
fn ensure_directory(path: &Path) -> io::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    match chmod(path, 0o775) {
        Ok(()) => Ok(()),
        Err(e) if is_operation_not_permitted(&e) => {
            warn!(
                category = "organize",
                subsystem = "permissions",
                "ignoring non-blocking permission error on {}: {}",
                path.display(),
                e
            );
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Best-effort read+write access probe for a directory.
fn dir_accessible(dir: &Path) -> bool {
    let readable = fs::read_dir(dir).is_ok();
    let writable = fs::metadata(dir)
        .map(|m| !m.permissions().readonly())
        .unwrap_or(false);
    readable && writable
}

/// Move, falling back to copy + delete across filesystems.
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    if fs::rename(from, to).is_err() {
        fs::copy(from, to)?;
        fs::remove_file(from)?;
    }
    Ok(())
}

#[cfg(unix)]
fn chmod(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn chmod(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}

/// The one permission failure class treated as non-fatal (EPERM, raw OS
/// error 1 — typical for chmod on foreign-owned files over NFS/SMB).
fn is_operation_not_permitted(e: &io::Error) -> bool {
    e.raw_os_error() == Some(1)
}
