//! Tag normalization rules.
//!
//! Pure functions from extracted tag values to the canonical set used for
//! both the rewritten tags and the destination path: canonical genre, a
//! single main artist, a deduplicated featuring list folded into the title,
//! and sanitized free-text fields.
//!
//! Sanitization applies one global rule everywhere a value is used — tag or
//! path segment alike: whitespace runs collapse to single spaces, ends are
//! trimmed, one trailing period is dropped, `/` becomes `,`, and `"`, `:`,
//! `?` are removed.

use crate::genre::GenreMapper;
use crate::metadata::TrackFields;

/// Fallback title when the tag is absent.
pub const UNTITLED: &str = "Untitled";

/// Fallback artist/album name.
pub const UNKNOWN: &str = "Unknown";

/// The normalized tag set for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedTags {
    /// Canonical genre label
    pub genre: String,
    /// Album-level artist used for grouping; never empty
    pub main_artist: String,
    /// Featured artists in first-occurrence order, main artist excluded
    pub featuring: Vec<String>,
    /// Sanitized title, with a featuring suffix when one was derived
    pub title: String,
    /// Sanitized album, `"Unknown"` when absent
    pub album: String,
}

/// Apply the normalization rules to one file's extracted fields.
pub fn normalize(fields: &TrackFields, mapper: &GenreMapper) -> NormalizedTags {
    let genre = mapper.map(fields.genre.as_deref());

    // Main artist: album artist when tagged, else the first comma token of
    // the artist string, else Unknown.
    let main_artist = match fields.album_artist.as_deref().map(sanitize) {
        Some(name) if !name.is_empty() => name,
        _ => fields
            .artist
            .as_deref()
            .map(sanitize)
            .and_then(|artists| artists.split(',').next().map(|a| a.trim().to_string()))
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| UNKNOWN.to_string()),
    };

    // Featuring: every other comma token of the artist string, deduplicated,
    // first occurrence preserved.
    let mut featuring: Vec<String> = Vec::new();
    if let Some(artist) = fields.artist.as_deref() {
        for token in sanitize(artist).split(',') {
            let token = token.trim();
            if token.is_empty() || token == main_artist {
                continue;
            }
            if !featuring.iter().any(|f| f == token) {
                featuring.push(token.to_string());
            }
        }
    }

    let base_title = match fields.title.as_deref().map(sanitize) {
        Some(title) if !title.is_empty() => title,
        _ => UNTITLED.to_string(),
    };
    let title = if !featuring.is_empty() && !base_title.to_lowercase().contains("feat.") {
        format!("{} (feat. {})", base_title, featuring.join(", "))
    } else {
        base_title
    };

    let album = match fields.album.as_deref().map(sanitize) {
        Some(album) if !album.is_empty() => album,
        _ => UNKNOWN.to_string(),
    };

    NormalizedTags {
        genre,
        main_artist,
        featuring,
        title,
        album,
    }
}

/// Sanitize a free-text tag value. See the module docs for the rule.
pub fn sanitize(name: &str) -> String {
    let replaced: String = name
        .chars()
        .filter_map(|c| match c {
            '/' => Some(','),
            '"' | ':' | '?' => None,
            _ => Some(c),
        })
        .collect();

    let collapsed = replaced.split_whitespace().collect::<Vec<_>>().join(" ");
    // Dropping the trailing period can expose a space ("a ." -> "a ")
    let stripped = collapsed.strip_suffix('.').unwrap_or(&collapsed);
    stripped.trim_end().to_string()
}
