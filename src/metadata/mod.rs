//! Audio file metadata reading and writing.
//!
//! Dispatches on the file extension to the matching tag container: ID3
//! frames for MP3, MP4 atoms for M4A, vorbis comments for FLAC. All three
//! are mapped into one fixed [`TrackFields`] struct so the rest of the
//! system never touches a container API.
//!
//! # Features
//! - Read the catalogued tag fields plus embedded-picture and lyrics presence
//! - Distinguish synchronized (SYLT / timestamped text) from plain lyrics
//! - Write normalized artist/title/genre back in place before relocation

pub mod completeness;
pub mod lyrics;

use std::path::Path;

use id3::TagLike;

use crate::error::{Error, Result};
use crate::model::LyricsKind;

/// Extracted tag fields for one audio file.
///
/// Every field is the raw tagged value; fallbacks (album artist defaulting
/// to artist, "Untitled" titles) are applied by the consumers that need
/// them, not here.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrackFields {
    pub title: Option<String>,
    pub album: Option<String>,
    pub artist: Option<String>,
    pub album_artist: Option<String>,
    pub genre: Option<String>,
    /// Leading component of the date-like tag
    pub year: Option<i32>,
    /// Raw track number tag, e.g. `"7"` or `"7/12"`
    pub track_number: Option<String>,
    pub has_image: bool,
    pub lyrics: LyricsKind,
}

/// Normalized values written back into a file before it is relocated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteBack {
    pub artist: String,
    pub title: String,
    pub genre: String,
}

pub fn read(path: &Path) -> Result<TrackFields> {
    match extension_of(path).as_deref() {
        Some("mp3") => read_mp3(path),
        Some("m4a") => read_m4a(path),
        Some("flac") => read_flac(path),
        _ => Err(Error::InvalidFormat(format!(
            "{} is not a supported audio file",
            path.display()
        ))),
    }
}

/// Write normalized artist, title, and genre into the file's tag container,
/// leaving every other frame/atom/comment untouched.
pub fn write_back(path: &Path, tags: &WriteBack) -> Result<()> {
    match extension_of(path).as_deref() {
        Some("mp3") => write_mp3(path, tags),
        Some("m4a") => write_m4a(path, tags),
        Some("flac") => write_flac(path, tags),
        _ => Err(Error::InvalidFormat(format!(
            "{} is not a supported audio file",
            path.display()
        ))),
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension().and_then(|s| s.to_str()).map(|s| s.to_lowercase())
}

/// Year is the leading dash-separated component of a date-like value.
fn parse_year(date: &str) -> Option<i32> {
    date.split('-').next()?.trim().parse().ok()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

// ============================================================================
// MP3 (ID3 frames)
// ============================================================================

fn read_mp3(path: &Path) -> Result<TrackFields> {
    use id3::frame::Content;

    let tag = id3::Tag::read_from_path(path)
        .map_err(|e| Error::metadata(path, format!("failed to read ID3 tag: {e}")))?;

    // SYLT wins over USLT; either must carry actual text to count.
    let has_synced = tag.frames().any(|frame| {
        frame.id() == "SYLT"
            && matches!(frame.content(), Content::SynchronisedLyrics(s)
                if s.content.iter().any(|(_, line)| !line.trim().is_empty()))
    });
    let has_unsynced = tag.frames().any(|frame| {
        frame.id() == "USLT"
            && matches!(frame.content(), Content::Lyrics(l) if !l.text.trim().is_empty())
    });
    let lyrics = if has_synced {
        LyricsKind::Synced
    } else if has_unsynced {
        LyricsKind::Unsynced
    } else {
        LyricsKind::None
    };

    let year = tag
        .get("TDRC")
        .and_then(|f| f.content().text())
        .and_then(parse_year)
        .or(tag.year());

    Ok(TrackFields {
        title: non_empty(tag.title().map(String::from)),
        album: non_empty(tag.album().map(String::from)),
        artist: non_empty(tag.artist().map(String::from)),
        album_artist: non_empty(tag.album_artist().map(String::from)),
        genre: non_empty(tag.genre().map(String::from)),
        year,
        track_number: non_empty(tag.get("TRCK").and_then(|f| f.content().text()).map(String::from)),
        has_image: tag.pictures().next().is_some(),
        lyrics,
    })
}

fn write_mp3(path: &Path, tags: &WriteBack) -> Result<()> {
    let mut tag = id3::Tag::read_from_path(path).unwrap_or_else(|_| id3::Tag::new());
    tag.set_artist(&tags.artist);
    tag.set_title(&tags.title);
    tag.set_genre(&tags.genre);
    tag.write_to_path(path, id3::Version::Id3v24)
        .map_err(|e| Error::metadata(path, format!("failed to write ID3 tag: {e}")))
}

// ============================================================================
// M4A (MP4 atoms)
// ============================================================================

fn read_m4a(path: &Path) -> Result<TrackFields> {
    let tag = mp4ameta::Tag::read_from_path(path)
        .map_err(|e| Error::metadata(path, format!("failed to read MP4 atoms: {e}")))?;

    let (track_number, _total) = tag.track();

    Ok(TrackFields {
        title: non_empty(tag.title().map(String::from)),
        album: non_empty(tag.album().map(String::from)),
        artist: non_empty(tag.artist().map(String::from)),
        album_artist: non_empty(tag.album_artist().map(String::from)),
        genre: non_empty(tag.genre().map(String::from)),
        year: tag.year().and_then(parse_year),
        track_number: track_number.map(|n| n.to_string()),
        has_image: tag.artwork().is_some(),
        lyrics: lyrics::classify_text(tag.lyrics()),
    })
}

fn write_m4a(path: &Path, tags: &WriteBack) -> Result<()> {
    let mut tag = mp4ameta::Tag::read_from_path(path)
        .map_err(|e| Error::metadata(path, format!("failed to read MP4 atoms: {e}")))?;
    tag.set_artist(&tags.artist);
    tag.set_title(&tags.title);
    tag.set_genre(&tags.genre);
    tag.write_to_path(path)
        .map_err(|e| Error::metadata(path, format!("failed to write MP4 atoms: {e}")))
}

// ============================================================================
// FLAC (vorbis comments)
// ============================================================================

fn read_flac(path: &Path) -> Result<TrackFields> {
    let tag = metaflac::Tag::read_from_path(path)
        .map_err(|e| Error::metadata(path, format!("failed to read FLAC tag: {e}")))?;

    let first = |key: &str| -> Option<String> {
        tag.get_vorbis(key)
            .and_then(|mut values| values.next().map(String::from))
            .filter(|s| !s.trim().is_empty())
    };

    Ok(TrackFields {
        title: first("TITLE"),
        album: first("ALBUM"),
        artist: first("ARTIST"),
        album_artist: first("ALBUMARTIST"),
        genre: first("GENRE"),
        year: first("DATE").as_deref().and_then(parse_year),
        track_number: first("TRACKNUMBER"),
        has_image: tag.pictures().next().is_some(),
        lyrics: lyrics::classify_text(first("LYRICS").as_deref()),
    })
}

fn write_flac(path: &Path, tags: &WriteBack) -> Result<()> {
    let mut tag = metaflac::Tag::read_from_path(path)
        .map_err(|e| Error::metadata(path, format!("failed to read FLAC tag: {e}")))?;
    tag.set_vorbis("ARTIST", vec![tags.artist.clone()]);
    tag.set_vorbis("TITLE", vec![tags.title.clone()]);
    tag.set_vorbis("GENRE", vec![tags.genre.clone()]);
    tag.write_to_path(path)
        .map_err(|e| Error::metadata(path, format!("failed to write FLAC tag: {e}")))
}
