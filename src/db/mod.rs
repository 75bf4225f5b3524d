//! Catalog persistence.
//!
//! Uses SQLx with SQLite for lightweight, embedded storage: one `tracks`
//! row per known file path, point upserts and point deletes only. No
//! multi-row transaction spans a scan — each mutation commits on its own,
//! so an interrupted run leaves a valid, merely partial catalog.
//!
//! Writes that lose a race for the database file ("database is locked") are
//! retried a bounded number of times with a short fixed delay before the
//! error surfaces as fatal.

use std::future::Future;
use std::time::Duration;

use chrono::DateTime;
use sqlx::migrate::MigrateDatabase;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::metadata::TrackFields;
use crate::model::TrackRecord;

/// Default database filename.
pub const DEFAULT_DB_NAME: &str = "music_keeper.db";

/// Retry budget for contended writes.
const BUSY_RETRIES: usize = 5;
const BUSY_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Build a SQLite database URL from an optional path.
///
/// If no path is provided, uses [`DEFAULT_DB_NAME`] in the current directory.
pub fn db_url(path: Option<&std::path::Path>) -> String {
    match path {
        Some(p) => format!("sqlite:{}", p.display()),
        None => format!("sqlite:{}", DEFAULT_DB_NAME),
    }
}

/// Initialize the database connection pool and run migrations.
///
/// Creates the database file if it doesn't exist, establishes a connection
/// pool with up to 5 connections, and runs all pending migrations.
pub async fn init_db(db_url: &str) -> Result<SqlitePool, sqlx::Error> {
    if !sqlx::Sqlite::database_exists(db_url).await.unwrap_or(false) {
        sqlx::Sqlite::create_database(db_url).await?;
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// How an upsert resolved, for scan reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// First observation of this path
    Inserted,
    /// Path known, file strictly newer than the stored record
    Updated,
    /// Path known, stored record already at least as new
    Unchanged,
}

/// Insert or refresh the record for one path.
///
/// An existing record is only overwritten when `updated_at` is strictly
/// newer than the stored timestamp, so redundant or out-of-order scans never
/// clobber fresher data. The stored `album_artist` falls back to `artist`
/// when the album-artist tag is absent.
pub async fn upsert_track(
    pool: &SqlitePool,
    path: &str,
    updated_at: &str,
    fields: &TrackFields,
    completeness: f64,
) -> sqlx::Result<UpsertOutcome> {
    retry_on_busy(|| do_upsert(pool, path, updated_at, fields, completeness)).await
}

async fn do_upsert(
    pool: &SqlitePool,
    path: &str,
    updated_at: &str,
    fields: &TrackFields,
    completeness: f64,
) -> sqlx::Result<UpsertOutcome> {
    let stored: Option<(String,)> = sqlx::query_as("SELECT updated_at FROM tracks WHERE path = ?")
        .bind(path)
        .fetch_optional(pool)
        .await?;

    let album_artist = fields.album_artist.as_deref().or(fields.artist.as_deref());

    match stored {
        None => {
            sqlx::query(
                r#"
                INSERT INTO tracks (path, updated_at, title, album, artist, album_artist,
                                    year, genre, has_image, lyrics_type, completeness)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(path)
            .bind(updated_at)
            .bind(&fields.title)
            .bind(&fields.album)
            .bind(&fields.artist)
            .bind(album_artist)
            .bind(fields.year)
            .bind(&fields.genre)
            .bind(fields.has_image)
            .bind(fields.lyrics.as_column())
            .bind(completeness)
            .execute(pool)
            .await?;
            Ok(UpsertOutcome::Inserted)
        }
        Some((stored_at,)) => {
            if !is_strictly_newer(updated_at, &stored_at) {
                return Ok(UpsertOutcome::Unchanged);
            }
            sqlx::query(
                r#"
                UPDATE tracks SET
                    updated_at = ?, title = ?, album = ?, artist = ?, album_artist = ?,
                    year = ?, genre = ?, has_image = ?, lyrics_type = ?, completeness = ?
                WHERE path = ?
                "#,
            )
            .bind(updated_at)
            .bind(&fields.title)
            .bind(&fields.album)
            .bind(&fields.artist)
            .bind(album_artist)
            .bind(fields.year)
            .bind(&fields.genre)
            .bind(fields.has_image)
            .bind(fields.lyrics.as_column())
            .bind(completeness)
            .bind(path)
            .execute(pool)
            .await?;
            Ok(UpsertOutcome::Updated)
        }
    }
}

/// True when `candidate` is a strictly later instant than `stored`.
///
/// An unparsable stored timestamp counts as older, so a corrupted value
/// heals itself on the next scan instead of pinning the row forever.
fn is_strictly_newer(candidate: &str, stored: &str) -> bool {
    match (
        DateTime::parse_from_rfc3339(candidate),
        DateTime::parse_from_rfc3339(stored),
    ) {
        (Ok(candidate), Ok(stored)) => candidate > stored,
        (Ok(_), Err(_)) => true,
        _ => false,
    }
}

/// Every path the catalog currently knows about.
pub async fn all_track_paths(pool: &SqlitePool) -> sqlx::Result<Vec<String>> {
    let rows: Vec<(String,)> = sqlx::query_as("SELECT path FROM tracks")
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(|(path,)| path).collect())
}

/// Remove the record for one path. Returns whether a row existed.
pub async fn delete_track(pool: &SqlitePool, path: &str) -> sqlx::Result<bool> {
    let result = retry_on_busy(|| async move {
        sqlx::query("DELETE FROM tracks WHERE path = ?")
            .bind(path)
            .execute(pool)
            .await
    })
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Get all tracks from the database, ordered by path.
pub async fn get_all_tracks(pool: &SqlitePool) -> sqlx::Result<Vec<TrackRecord>> {
    sqlx::query_as::<_, TrackRecord>(
        r#"
        SELECT id, path, updated_at, title, album, artist, album_artist,
               year, genre, has_image, lyrics_type, completeness
        FROM tracks
        ORDER BY path
        "#,
    )
    .fetch_all(pool)
    .await
}

/// Get one track by its path.
pub async fn get_track_by_path(pool: &SqlitePool, path: &str) -> sqlx::Result<Option<TrackRecord>> {
    sqlx::query_as::<_, TrackRecord>(
        r#"
        SELECT id, path, updated_at, title, album, artist, album_artist,
               year, genre, has_image, lyrics_type, completeness
        FROM tracks
        WHERE path = ?
        "#,
    )
    .bind(path)
    .fetch_optional(pool)
    .await
}

fn is_busy(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db)
            if db.message().contains("database is locked") || db.message().contains("database is busy")
    )
}

/// Run a catalog write, retrying contended attempts with a fixed delay.
async fn retry_on_busy<T, F, Fut>(mut op: F) -> sqlx::Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = sqlx::Result<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Err(e) if is_busy(&e) && attempt + 1 < BUSY_RETRIES => {
                attempt += 1;
                tracing::warn!(
                    category = "db",
                    subsystem = "retry",
                    "catalog busy, retrying (attempt {attempt}/{BUSY_RETRIES})"
                );
                tokio::time::sleep(BUSY_RETRY_DELAY).await;
            }
            other => return other,
        }
    }
}
