//! Core data model for the catalog.
//!
//! A [`TrackRecord`] describes one audio file the catalog knows about; its
//! `path` is the sole identity. Records are created, refreshed, and removed
//! only by the sync engine — nothing else writes the `tracks` table.

use sqlx::FromRow;

/// One catalog row, keyed by absolute file path.
#[derive(Debug, Clone, FromRow)]
pub struct TrackRecord {
    /// Database ID (auto-generated)
    pub id: i64,
    /// Absolute file path (unique identifier)
    pub path: String,
    /// RFC 3339 timestamp of the file's last observed modification
    pub updated_at: String,
    /// Track title
    pub title: Option<String>,
    /// Album title
    pub album: Option<String>,
    /// Track artist string as tagged (may list several, comma separated)
    pub artist: Option<String>,
    /// Album-level artist; falls back to `artist` at extraction time
    pub album_artist: Option<String>,
    /// Release year, the leading component of the date tag
    pub year: Option<i64>,
    /// Genre as tagged
    pub genre: Option<String>,
    /// Whether at least one embedded picture is present
    pub has_image: bool,
    /// `'sync'`, `'unsync'`, or NULL
    pub lyrics_type: Option<String>,
    /// Completeness score, 0-100
    pub completeness: f64,
}

/// Lyrics presence, ordered by how useful the lyrics are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LyricsKind {
    /// No lyrics at all
    #[default]
    None,
    /// Plain text block without timestamps
    Unsynced,
    /// Time-coded lyrics
    Synced,
}

impl LyricsKind {
    /// The column encoding used by the `tracks` table.
    pub fn as_column(&self) -> Option<&'static str> {
        match self {
            LyricsKind::None => None,
            LyricsKind::Unsynced => Some("unsync"),
            LyricsKind::Synced => Some("sync"),
        }
    }

    pub fn from_column(value: Option<&str>) -> Self {
        match value {
            Some("sync") => LyricsKind::Synced,
            Some("unsync") => LyricsKind::Unsynced,
            _ => LyricsKind::None,
        }
    }

    pub fn is_present(&self) -> bool {
        !matches!(self, LyricsKind::None)
    }
}
