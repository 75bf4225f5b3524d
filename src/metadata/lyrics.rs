//! Lyrics text classification.
//!
//! Formats without a dedicated synchronized-lyrics frame (MP4 atoms, FLAC
//! vorbis comments) store lyrics as one plain text block; whether that block
//! is synchronized is decided by scanning it for `[mm:ss]` / `[mm:ss.xx]`
//! timestamps. MP3 files carry the distinction in the container itself
//! (SYLT vs USLT) and don't go through this scan.

use crate::model::LyricsKind;

/// Classify a lyrics text block.
///
/// Blank text means no lyrics; a timestamp line anywhere upgrades the block
/// to synchronized.
pub fn classify_text(text: Option<&str>) -> LyricsKind {
    let Some(text) = text else {
        return LyricsKind::None;
    };
    if text.trim().is_empty() {
        return LyricsKind::None;
    }
    if text.lines().any(|line| is_timestamp_line(line.trim())) {
        LyricsKind::Synced
    } else {
        LyricsKind::Unsynced
    }
}

/// A line counts as timestamped when it opens with `[..]` whose bracketed
/// content parses as minutes/seconds, each in `[0, 60)`.
fn is_timestamp_line(line: &str) -> bool {
    let Some(rest) = line.strip_prefix('[') else {
        return false;
    };
    let Some((content, _)) = rest.split_once(']') else {
        return false;
    };

    let parts: Vec<&str> = content.split(':').collect();
    let (minutes, seconds) = match parts.as_slice() {
        [m, s] => (m, s),
        [m, s, _] => (m, s),
        _ => return false,
    };

    match (minutes.parse::<f64>(), seconds.parse::<f64>()) {
        (Ok(m), Ok(s)) => (0.0..60.0).contains(&m) && (0.0..60.0).contains(&s),
        _ => false,
    }
}
