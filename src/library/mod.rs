//! Catalog synchronization: diff a directory tree against the catalog.
//!
//! One full recursive walk per run. Every allow-listed file is observed,
//! extracted, scored, and upserted (gated on a strictly newer mtime); after
//! the walk, catalog rows whose files were not observed are deleted — but
//! only rows lying inside the scanned root. A partial scan of a subtree
//! must never delete entries belonging to sibling trees it did not visit.
//!
//! Extraction failures are per-file and non-fatal: the file is skipped, the
//! walk continues, and because the path still counts as observed, the
//! existing record (if any) survives.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures::StreamExt;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::db::{self, UpsertOutcome};
use crate::error::Result;
use crate::metadata::{self, completeness};
use crate::{diagnostics, scanner};

/// End-of-scan accounting.
#[derive(Debug, Clone, Default)]
pub struct ScanSummary {
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
    /// Files observed but not readable as audio
    pub skipped: usize,
    pub elapsed: Duration,
    pub peak_memory_mib: Option<f64>,
}

impl fmt::Display for ScanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} inserted, {} updated, {} deleted, {} skipped, elapsed {:.2}s",
            self.inserted,
            self.updated,
            self.deleted,
            self.skipped,
            self.elapsed.as_secs_f64(),
        )?;
        if let Some(mib) = self.peak_memory_mib {
            write!(f, ", peak memory {mib:.2} MiB")?;
        }
        Ok(())
    }
}

/// Synchronize the catalog with the tree rooted at `root`.
///
/// Files are processed strictly one at a time: extract, score, upsert, then
/// the next file. Each mutation commits independently, so interrupting a
/// scan leaves a valid partial catalog.
pub async fn sync_directory(pool: &SqlitePool, root: &Path) -> Result<ScanSummary> {
    let root = std::fs::canonicalize(root)?;
    let start = Instant::now();

    info!(category = "scan", subsystem = "start", "scanning {}", root.display());

    let mut summary = ScanSummary::default();
    let mut observed: HashSet<String> = HashSet::new();

    let stream = scanner::scan(root.clone());
    let mut stream = std::pin::pin!(stream);

    while let Some(path) = stream.next().await {
        let path_str = path.to_string_lossy().to_string();
        // Observed before extraction: a file we fail to read still exists,
        // and must not be deleted below.
        observed.insert(path_str.clone());

        let mtime = match std::fs::metadata(&path).and_then(|m| m.modified()) {
            Ok(mtime) => mtime,
            Err(e) => {
                warn!(
                    category = "scan",
                    subsystem = "metadata",
                    "cannot stat {}: {}",
                    path.display(),
                    e
                );
                summary.skipped += 1;
                continue;
            }
        };
        let updated_at = DateTime::<Utc>::from(mtime).to_rfc3339();

        let fields = match metadata::read(&path) {
            Ok(fields) => fields,
            Err(e) => {
                warn!(
                    category = "scan",
                    subsystem = "metadata",
                    "extraction failed for {}: {}",
                    path.display(),
                    e
                );
                summary.skipped += 1;
                continue;
            }
        };

        let score = completeness::score(&fields);
        match db::upsert_track(pool, &path_str, &updated_at, &fields, score).await? {
            UpsertOutcome::Inserted => summary.inserted += 1,
            UpsertOutcome::Updated => summary.updated += 1,
            UpsertOutcome::Unchanged => {}
        }
    }

    // Deletions, scoped to the scanned root: a record disappears only when
    // this walk covered its location and did not see it.
    for stored in db::all_track_paths(pool).await? {
        if observed.contains(&stored) {
            continue;
        }
        if !Path::new(&stored).starts_with(&root) {
            continue;
        }
        if db::delete_track(pool, &stored).await? {
            info!(category = "scan", subsystem = "delete", "removed {}", stored);
            summary.deleted += 1;
        }
    }

    summary.elapsed = start.elapsed();
    summary.peak_memory_mib = diagnostics::peak_rss_mib();

    info!(category = "scan", subsystem = "summary", "scan complete: {summary}");

    Ok(summary)
}
