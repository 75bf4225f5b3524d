//! Test utilities and fixtures for music-keeper tests.
//!
//! Provides a temporary catalog database, a [`TrackFields`] factory, and an
//! ID3-tagged `.mp3` fixture writer. A file holding nothing but an ID3 tag
//! is readable by the extractor, so tests never need binary audio fixtures
//! checked in.

use std::fs::File;
use std::path::Path;

use id3::frame::{
    Content, Frame, Lyrics, Picture, PictureType, SynchronisedLyrics, SynchronisedLyricsType,
    TimestampFormat,
};
use id3::TagLike;
use sqlx::sqlite::SqlitePool;
use tempfile::TempDir;

use crate::metadata::TrackFields;
use crate::model::LyricsKind;

/// Creates a temporary database for testing.
///
/// The database lives in a temporary directory that is cleaned up when the
/// returned `TempDir` is dropped. Migrations are run automatically. Keep the
/// TempDir alive for the duration of your test.
pub async fn temp_db() -> (SqlitePool, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp directory");
    let db_path = dir.path().join("test.db");
    let db_url = format!("sqlite:{}", db_path.display());

    let pool = crate::db::init_db(&db_url)
        .await
        .expect("Failed to initialize test database");

    (pool, dir)
}

/// Creates a TrackFields with sensible defaults.
///
/// Customize using struct update syntax:
///
/// ```ignore
/// let fields = TrackFields {
///     genre: Some("Deep House".to_string()),
///     ..mock_fields()
/// };
/// ```
pub fn mock_fields() -> TrackFields {
    TrackFields {
        title: Some("Test Track".to_string()),
        album: Some("Test Album".to_string()),
        artist: Some("Test Artist".to_string()),
        album_artist: Some("Test Artist".to_string()),
        genre: Some("Rock".to_string()),
        year: Some(2023),
        track_number: Some("1".to_string()),
        has_image: false,
        lyrics: LyricsKind::None,
    }
}

/// Tag values for an mp3 fixture file.
#[derive(Debug, Default, Clone)]
pub struct MpFixture<'a> {
    pub title: Option<&'a str>,
    pub album: Option<&'a str>,
    pub artist: Option<&'a str>,
    pub album_artist: Option<&'a str>,
    pub genre: Option<&'a str>,
    /// Raw TRCK text, e.g. "7/12"
    pub track: Option<&'a str>,
    /// Raw TDRC text, e.g. "2021-05-01"
    pub date: Option<&'a str>,
    pub unsynced_lyrics: Option<&'a str>,
    pub synced_lyrics: bool,
    pub with_image: bool,
}

/// Write an `.mp3` file at `path` holding only an ID3v2.4 tag with the given
/// values.
pub fn write_mp3_fixture(path: &Path, fixture: MpFixture<'_>) {
    File::create(path).expect("create fixture file");

    let mut tag = id3::Tag::new();
    if let Some(title) = fixture.title {
        tag.set_title(title);
    }
    if let Some(album) = fixture.album {
        tag.set_album(album);
    }
    if let Some(artist) = fixture.artist {
        tag.set_artist(artist);
    }
    if let Some(album_artist) = fixture.album_artist {
        tag.set_album_artist(album_artist);
    }
    if let Some(genre) = fixture.genre {
        tag.set_genre(genre);
    }
    if let Some(track) = fixture.track {
        tag.set_text("TRCK", track);
    }
    if let Some(date) = fixture.date {
        tag.set_text("TDRC", date);
    }
    if let Some(text) = fixture.unsynced_lyrics {
        tag.add_frame(Frame::with_content(
            "USLT",
            Content::Lyrics(Lyrics {
                lang: "eng".to_string(),
                description: String::new(),
                text: text.to_string(),
            }),
        ));
    }
    if fixture.synced_lyrics {
        tag.add_frame(Frame::with_content(
            "SYLT",
            Content::SynchronisedLyrics(SynchronisedLyrics {
                lang: "eng".to_string(),
                timestamp_format: TimestampFormat::Ms,
                content_type: SynchronisedLyricsType::Lyrics,
                description: String::new(),
                content: vec![(0, "first line".to_string()), (1500, "second line".to_string())],
            }),
        ));
    }
    if fixture.with_image {
        tag.add_frame(Frame::with_content(
            "APIC",
            Content::Picture(Picture {
                mime_type: "image/png".to_string(),
                picture_type: PictureType::CoverFront,
                description: String::new(),
                data: vec![0x89, 0x50, 0x4e, 0x47],
            }),
        ));
    }

    tag.write_to_path(path, id3::Version::Id3v24).expect("write fixture tag");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_temp_db_creates_working_database() {
        let (pool, _dir) = temp_db().await;

        // Should be able to query
        let paths = crate::db::all_track_paths(&pool).await.unwrap();
        assert!(paths.is_empty());
    }

    #[test]
    fn test_mock_fields_defaults() {
        let fields = mock_fields();
        assert_eq!(fields.title.as_deref(), Some("Test Track"));
        assert_eq!(fields.artist.as_deref(), Some("Test Artist"));
        assert_eq!(fields.lyrics, LyricsKind::None);
    }

    #[test]
    fn test_fixture_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.mp3");
        write_mp3_fixture(
            &path,
            MpFixture {
                title: Some("Roundtrip"),
                date: Some("1994-10-04"),
                ..MpFixture::default()
            },
        );

        let fields = crate::metadata::read(&path).unwrap();
        assert_eq!(fields.title.as_deref(), Some("Roundtrip"));
        assert_eq!(fields.year, Some(1994));
    }
}
