//! Completeness scoring for extracted metadata.
//!
//! Tracks receive a score from 0-100 based on five criteria: artist, album,
//! title, embedded image, and lyrics presence. Two outcomes are special:
//! all five criteria with *synchronized* lyrics score a perfect 100, and the
//! first four with merely unsynchronized lyrics score 90 — deliberately
//! above the 80 the generic subtraction would give. Everything else starts
//! at 100 and loses 20 points per failing criterion, floored at 0.
//!
//! The score is always recomputed from extracted fields; it is never stored
//! input.

use bitflags::bitflags;

use super::TrackFields;
use crate::model::LyricsKind;

bitflags! {
    /// The five scored criteria.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Criteria: u32 {
        /// Artist tag present
        const ARTIST = 1 << 0;
        /// Album tag present
        const ALBUM = 1 << 1;
        /// Title tag present
        const TITLE = 1 << 2;
        /// At least one embedded picture
        const IMAGE = 1 << 3;
        /// Any lyrics, synchronized or not
        const LYRICS = 1 << 4;

        /// The four non-lyrics criteria, the threshold for the 90 case.
        const TAGGED_WITH_ART = Self::ARTIST.bits()
            | Self::ALBUM.bits()
            | Self::TITLE.bits()
            | Self::IMAGE.bits();
    }
}

impl Criteria {
    /// Derive the criteria set from extracted fields.
    pub fn from_fields(fields: &TrackFields) -> Self {
        let mut criteria = Criteria::empty();
        criteria.set(Criteria::ARTIST, fields.artist.is_some());
        criteria.set(Criteria::ALBUM, fields.album.is_some());
        criteria.set(Criteria::TITLE, fields.title.is_some());
        criteria.set(Criteria::IMAGE, fields.has_image);
        criteria.set(Criteria::LYRICS, fields.lyrics.is_present());
        criteria
    }

    fn missing_count(&self) -> u32 {
        5 - (*self & Self::all()).bits().count_ones().min(5)
    }
}

/// Score a criteria set. Total over all inputs; see the module docs for the
/// rule table.
pub fn score_criteria(criteria: Criteria, lyrics: LyricsKind) -> f64 {
    if criteria.contains(Criteria::all()) && lyrics == LyricsKind::Synced {
        return 100.0;
    }
    if criteria.contains(Criteria::TAGGED_WITH_ART) && lyrics == LyricsKind::Unsynced {
        return 90.0;
    }
    let score = 100_i32 - criteria.missing_count() as i32 * 20;
    score.max(0) as f64
}

/// Score extracted fields directly.
pub fn score(fields: &TrackFields) -> f64 {
    score_criteria(Criteria::from_fields(fields), fields.lyrics)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn criteria(artist: bool, album: bool, title: bool, image: bool, lyrics: LyricsKind) -> Criteria {
        let mut c = Criteria::empty();
        c.set(Criteria::ARTIST, artist);
        c.set(Criteria::ALBUM, album);
        c.set(Criteria::TITLE, title);
        c.set(Criteria::IMAGE, image);
        c.set(Criteria::LYRICS, lyrics.is_present());
        c
    }

    #[test]
    fn test_perfect_track_scores_100() {
        let c = criteria(true, true, true, true, LyricsKind::Synced);
        assert_eq!(score_criteria(c, LyricsKind::Synced), 100.0);
    }

    #[test]
    fn test_unsynced_lyrics_with_full_tags_scores_90() {
        // Not 80: the unsynced case is deliberately above the linear rule.
        let c = criteria(true, true, true, true, LyricsKind::Unsynced);
        assert_eq!(score_criteria(c, LyricsKind::Unsynced), 90.0);
    }

    #[test]
    fn test_linear_subtraction() {
        // Four criteria, no lyrics at all: one failing criterion
        let c = criteria(true, true, true, true, LyricsKind::None);
        assert_eq!(score_criteria(c, LyricsKind::None), 80.0);

        // Synced lyrics but no image: the 100 case requires all five
        let c = criteria(true, true, true, false, LyricsKind::Synced);
        assert_eq!(score_criteria(c, LyricsKind::Synced), 80.0);

        // Unsynced lyrics but missing album: 90 case requires the four tags
        let c = criteria(true, false, true, true, LyricsKind::Unsynced);
        assert_eq!(score_criteria(c, LyricsKind::Unsynced), 60.0);

        // Nothing at all
        let c = criteria(false, false, false, false, LyricsKind::None);
        assert_eq!(score_criteria(c, LyricsKind::None), 0.0);
    }

    #[test]
    fn test_score_from_fields() {
        let fields = TrackFields {
            title: Some("Song".to_string()),
            album: Some("Album".to_string()),
            artist: Some("Artist".to_string()),
            album_artist: None,
            genre: None,
            year: None,
            track_number: None,
            has_image: false,
            lyrics: LyricsKind::None,
        };
        // Missing image and lyrics
        assert_eq!(score(&fields), 60.0);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn any_lyrics() -> impl Strategy<Value = LyricsKind> {
            prop::sample::select(vec![LyricsKind::None, LyricsKind::Unsynced, LyricsKind::Synced])
        }

        proptest! {
            /// Every possible input lands in [0, 100].
            #[test]
            fn score_is_bounded(
                artist in any::<bool>(),
                album in any::<bool>(),
                title in any::<bool>(),
                image in any::<bool>(),
                lyrics in any_lyrics(),
            ) {
                let c = criteria(artist, album, title, image, lyrics);
                let s = score_criteria(c, lyrics);
                prop_assert!((0.0..=100.0).contains(&s));
            }

            /// Outside the two special cases the score is exactly the
            /// linear subtraction.
            #[test]
            fn generic_case_is_linear(
                artist in any::<bool>(),
                album in any::<bool>(),
                title in any::<bool>(),
                image in any::<bool>(),
            ) {
                let lyrics = LyricsKind::None;
                let c = criteria(artist, album, title, image, lyrics);
                let missing =
                    1 + [artist, album, title, image].iter().filter(|b| !**b).count() as i32;
                let expected = (100 - missing * 20).max(0) as f64;
                prop_assert_eq!(score_criteria(c, lyrics), expected);
            }
        }
    }
}
