//! Genre normalization against an ordered rule set.
//!
//! Rules are `(pattern, canonical label)` pairs matched in configuration
//! order against a cleaned (lower-cased, invisible-character-stripped) copy
//! of the raw genre; the first match wins. An unmatched genre passes through
//! untouched, casing and all, so an unrecognized-but-deliberate tag value is
//! never destroyed. An empty or missing genre maps to the `"Unknown"`
//! sentinel.

use regex::Regex;

use crate::config::GenreRule;

/// The sentinel for files without a usable genre tag.
pub const UNKNOWN_GENRE: &str = "Unknown";

/// A compiled, ordered genre rule set. Built once per run; immutable after.
#[derive(Debug, Default)]
pub struct GenreMapper {
    rules: Vec<(Regex, String)>,
}

impl GenreMapper {
    /// Compile the configured rules, preserving order. A malformed pattern
    /// is logged and skipped; it never aborts mapping.
    pub fn new(rules: &[GenreRule]) -> Self {
        let mut compiled = Vec::with_capacity(rules.len());
        for rule in rules {
            match Regex::new(&rule.pattern) {
                Ok(re) => compiled.push((re, rule.genre.clone())),
                Err(e) => {
                    tracing::warn!(
                        category = "genre",
                        subsystem = "rules",
                        "skipping malformed genre pattern {:?}: {}",
                        rule.pattern,
                        e
                    );
                }
            }
        }
        Self { rules: compiled }
    }

    /// Number of usable (compiled) rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Map a raw genre to its canonical label.
    pub fn map(&self, raw: Option<&str>) -> String {
        let Some(raw) = raw else {
            return UNKNOWN_GENRE.to_string();
        };
        if raw.trim().is_empty() {
            return UNKNOWN_GENRE.to_string();
        }

        // Match against a cleaned copy; zero-width and no-break spaces sneak
        // in from web-sourced tags.
        let cleaned = raw
            .to_lowercase()
            .replace('\u{200b}', "")
            .replace('\u{a0}', "")
            .trim()
            .to_string();

        for (pattern, label) in &self.rules {
            if pattern.is_match(&cleaned) {
                return label.clone();
            }
        }

        raw.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(pairs: &[(&str, &str)]) -> Vec<GenreRule> {
        pairs
            .iter()
            .map(|(pattern, genre)| GenreRule {
                pattern: pattern.to_string(),
                genre: genre.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_empty_genre_maps_to_unknown() {
        let mapper = GenreMapper::new(&rules(&[("house", "House")]));
        assert_eq!(mapper.map(None), "Unknown");
        assert_eq!(mapper.map(Some("")), "Unknown");
        assert_eq!(mapper.map(Some("   ")), "Unknown");
    }

    #[test]
    fn test_pattern_match_is_case_insensitive_on_input() {
        let mapper = GenreMapper::new(&rules(&[("house", "House")]));
        assert_eq!(mapper.map(Some("Deep House")), "House");
        assert_eq!(mapper.map(Some("HOUSE")), "House");
    }

    #[test]
    fn test_unmatched_genre_passes_through_unchanged() {
        let mapper = GenreMapper::new(&rules(&[("house", "House")]));
        assert_eq!(mapper.map(Some("Liquid Funk")), "Liquid Funk");
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let mapper = GenreMapper::new(&rules(&[("deep house", "Deep House"), ("house", "House")]));
        assert_eq!(mapper.map(Some("Deep House")), "Deep House");
        assert_eq!(mapper.map(Some("Tech House")), "House");

        // Same rules in the opposite order shadow the specific one
        let mapper = GenreMapper::new(&rules(&[("house", "House"), ("deep house", "Deep House")]));
        assert_eq!(mapper.map(Some("Deep House")), "House");
    }

    #[test]
    fn test_invisible_characters_are_stripped_before_matching() {
        let mapper = GenreMapper::new(&rules(&[("hip.?hop", "Hip-Hop")]));
        assert_eq!(mapper.map(Some("Hip\u{200b}Hop")), "Hip-Hop");
        assert_eq!(mapper.map(Some("hip\u{a0}hop")), "Hip-Hop");
    }

    #[test]
    fn test_malformed_pattern_is_skipped() {
        let mapper = GenreMapper::new(&rules(&[("[unclosed", "Broken"), ("rock", "Rock")]));
        // The bad rule is dropped, the later one still applies
        assert_eq!(mapper.len(), 1);
        assert_eq!(mapper.map(Some("Indie Rock")), "Rock");
    }

    #[test]
    fn test_regex_patterns_supported() {
        let mapper = GenreMapper::new(&rules(&[("^(uk )?garage$", "UK Garage")]));
        assert_eq!(mapper.map(Some("UK Garage")), "UK Garage");
        assert_eq!(mapper.map(Some("garage")), "UK Garage");
        assert_eq!(mapper.map(Some("garage rock")), "garage rock");
    }
}
