//! Domain types for the wrapped card.
//!
//! [`WrappedData`] is the single record shared by the form editor, the card
//! renderer and the autofill decoder. Its JSON shape uses camelCase keys so the
//! same contract is spoken with the Gemini API and with seed files on disk.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::Result;

/// Number of ranked slots shown for artists and songs.
pub const RANK_SLOTS: usize = 5;

/// Accent color used by the sample card and as the fallback for unparsable input.
pub const DEFAULT_ACCENT: &str = "#8B75FF";

// ============================================
// Language
// ============================================

/// Display language of the card headings.
///
/// Unknown or missing codes resolve to [`Language::De`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Language {
    #[default]
    De,
    En,
    Es,
    Fr,
    Pt,
}

impl Language {
    /// All supported languages, in picker order.
    pub const ALL: [Language; 5] = [
        Language::De,
        Language::En,
        Language::Es,
        Language::Fr,
        Language::Pt,
    ];

    /// Resolve a language code, falling back to German for anything unknown.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_lowercase().as_str() {
            "de" => Language::De,
            "en" => Language::En,
            "es" => Language::Es,
            "fr" => Language::Fr,
            "pt" => Language::Pt,
            _ => Language::default(),
        }
    }

    /// Two-letter code.
    pub fn code(&self) -> &'static str {
        match self {
            Language::De => "de",
            Language::En => "en",
            Language::Es => "es",
            Language::Fr => "fr",
            Language::Pt => "pt",
        }
    }

    /// Name shown in the language picker.
    pub fn native_name(&self) -> &'static str {
        match self {
            Language::De => "Deutsch",
            Language::En => "English",
            Language::Es => "Español",
            Language::Fr => "Français",
            Language::Pt => "Português",
        }
    }

    /// Card headings for this language.
    pub fn labels(&self) -> Labels {
        match self {
            Language::De => Labels {
                artists: "Top-Artists",
                songs: "Top-Songs",
                minutes: "Gehörte Minuten",
                genre: "Top-Genre",
            },
            Language::En => Labels {
                artists: "Top Artists",
                songs: "Top Songs",
                minutes: "Minutes Listened",
                genre: "Top Genre",
            },
            Language::Es => Labels {
                artists: "Artistas Top",
                songs: "Canciones Top",
                minutes: "Minutos Escuchados",
                genre: "Top Género",
            },
            Language::Fr => Labels {
                artists: "Top Artistes",
                songs: "Top Titres",
                minutes: "Minutes D'écoute",
                genre: "Top Genre",
            },
            Language::Pt => Labels {
                artists: "Top Artistas",
                songs: "Top Músicas",
                minutes: "Minutos Ouvidos",
                genre: "Top Gênero",
            },
        }
    }

    /// Next language in picker order (wraps around).
    pub fn next(&self) -> Self {
        let idx = Self::ALL.iter().position(|l| l == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Previous language in picker order (wraps around).
    pub fn previous(&self) -> Self {
        let idx = Self::ALL.iter().position(|l| l == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl From<String> for Language {
    fn from(code: String) -> Self {
        Language::from_code(&code)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// The four localized headings of a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Labels {
    pub artists: &'static str,
    pub songs: &'static str,
    pub minutes: &'static str,
    pub genre: &'static str,
}

// ============================================
// WrappedData
// ============================================

/// Everything a card shows.
///
/// Instances are replaced, never mutated in place, once they are handed to a
/// [`Session`](crate::session::Session).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WrappedData {
    /// Ranked artists, index 0 is the most played
    pub top_artists: Vec<String>,
    /// Ranked songs, index 0 is the most played
    pub top_songs: Vec<String>,
    /// Minutes listened, conventionally dot-grouped ("27.031")
    pub minutes_listened: String,
    pub top_genre: String,
    pub year: String,
    /// Remote URL or `data:` URI
    pub image_src: String,
    /// Hex color for decorative elements
    pub accent_color: String,
    pub language: Language,
}

impl WrappedData {
    /// Illustrative values the editor starts with.
    pub fn sample() -> Self {
        Self {
            top_artists: vec![
                "$OHO BANI".to_string(),
                "01099".to_string(),
                "Ski Aggu".to_string(),
                "Symba".to_string(),
                "NF".to_string(),
            ],
            top_songs: vec![
                "BERGSTEIGEN".to_string(),
                "OLYMPIA".to_string(),
                "NPCs (mit Aggu)".to_string(),
                "Powerade".to_string(),
                "Uludağ und Sor...".to_string(),
            ],
            minutes_listened: "27.031".to_string(),
            top_genre: "Deutscher...".to_string(),
            year: "2023".to_string(),
            image_src: "https://images.unsplash.com/photo-1585110396000-c92857419dae?q=80&w=1000&auto=format&fit=crop".to_string(),
            accent_color: DEFAULT_ACCENT.to_string(),
            language: Language::De,
        }
    }

    /// Load a (possibly partial) record from a JSON file.
    ///
    /// Missing fields take their sample values.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Return a copy with the four stats fields taken from `patch`.
    ///
    /// Lists are taken verbatim: a two-entry patch yields a two-entry list.
    pub fn merge_stats(&self, patch: StatsPatch) -> Self {
        Self {
            top_artists: patch.top_artists,
            top_songs: patch.top_songs,
            minutes_listened: patch.minutes_listened,
            top_genre: patch.top_genre,
            ..self.clone()
        }
    }

    /// Localized headings, resolved from [`WrappedData::language`].
    pub fn labels(&self) -> Labels {
        self.language.labels()
    }
}

impl Default for WrappedData {
    fn default() -> Self {
        Self::sample()
    }
}

/// The stats subset returned by autofill.
///
/// Decoding rejects missing and unexpected keys, so a value of this type is
/// always a complete, well-typed patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StatsPatch {
    pub top_artists: Vec<String>,
    pub top_songs: Vec<String>,
    pub minutes_listened: String,
    pub top_genre: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_is_fully_populated() {
        let data = WrappedData::default();
        assert_eq!(data.top_artists.len(), RANK_SLOTS);
        assert_eq!(data.top_songs.len(), RANK_SLOTS);
        assert!(!data.minutes_listened.is_empty());
        assert!(!data.top_genre.is_empty());
        assert!(!data.year.is_empty());
        assert!(!data.image_src.is_empty());
        assert_eq!(data.accent_color, DEFAULT_ACCENT);
        assert_eq!(data.language, Language::De);
    }

    #[test]
    fn test_localization_table() {
        let expected = [
            (Language::De, ["Top-Artists", "Top-Songs", "Gehörte Minuten", "Top-Genre"]),
            (Language::En, ["Top Artists", "Top Songs", "Minutes Listened", "Top Genre"]),
            (Language::Es, ["Artistas Top", "Canciones Top", "Minutos Escuchados", "Top Género"]),
            (Language::Fr, ["Top Artistes", "Top Titres", "Minutes D'écoute", "Top Genre"]),
            (Language::Pt, ["Top Artistas", "Top Músicas", "Minutos Ouvidos", "Top Gênero"]),
        ];
        for (language, [artists, songs, minutes, genre]) in expected {
            let labels = language.labels();
            assert_eq!(labels.artists, artists, "{language:?}");
            assert_eq!(labels.songs, songs, "{language:?}");
            assert_eq!(labels.minutes, minutes, "{language:?}");
            assert_eq!(labels.genre, genre, "{language:?}");
        }
    }

    #[test]
    fn test_language_fallback() {
        assert_eq!(Language::from_code("en"), Language::En);
        assert_eq!(Language::from_code(" PT "), Language::Pt);
        assert_eq!(Language::from_code("it"), Language::De);
        assert_eq!(Language::from_code(""), Language::De);
    }

    #[test]
    fn test_language_serde_round_trip_and_fallback() {
        let json = serde_json::to_string(&Language::Fr).unwrap();
        assert_eq!(json, "\"fr\"");

        let unknown: Language = serde_json::from_str("\"klingon\"").unwrap();
        assert_eq!(unknown, Language::De);
    }

    #[test]
    fn test_language_cycle() {
        assert_eq!(Language::De.next(), Language::En);
        assert_eq!(Language::Pt.next(), Language::De);
        assert_eq!(Language::De.previous(), Language::Pt);
    }

    #[test]
    fn test_labels_cover_every_language() {
        for language in Language::ALL {
            let labels = language.labels();
            assert!(!labels.artists.is_empty());
            assert!(!labels.songs.is_empty());
            assert!(!labels.minutes.is_empty());
            assert!(!labels.genre.is_empty());
        }
        assert_eq!(Language::Fr.labels().minutes, "Minutes D'écoute");
    }

    #[test]
    fn test_wrapped_data_uses_camel_case_contract() {
        let json = serde_json::to_value(WrappedData::sample()).unwrap();
        assert!(json.get("topArtists").is_some());
        assert!(json.get("minutesListened").is_some());
        assert!(json.get("imageSrc").is_some());
        assert_eq!(json.get("language").and_then(|v| v.as_str()), Some("de"));
    }

    #[test]
    fn test_partial_json_fills_from_sample() {
        let data: WrappedData =
            serde_json::from_str(r#"{"year":"2024","language":"es"}"#).unwrap();
        assert_eq!(data.year, "2024");
        assert_eq!(data.language, Language::Es);
        assert_eq!(data.top_artists, WrappedData::sample().top_artists);
    }

    #[test]
    fn test_unset_language_resolves_to_german() {
        let data: WrappedData = serde_json::from_str(r#"{"language":"xx"}"#).unwrap();
        assert_eq!(data.labels(), Language::De.labels());
    }

    #[test]
    fn test_merge_stats_only_touches_stats() {
        let mut base = WrappedData::sample();
        base.language = Language::En;
        let merged = base.merge_stats(StatsPatch {
            top_artists: vec!["A".to_string(), "B".to_string()],
            top_songs: vec!["C".to_string()],
            minutes_listened: "1.000".to_string(),
            top_genre: "Pop".to_string(),
        });

        assert_eq!(merged.top_artists, vec!["A", "B"]);
        assert_eq!(merged.top_songs, vec!["C"]);
        assert_eq!(merged.minutes_listened, "1.000");
        assert_eq!(merged.top_genre, "Pop");
        assert_eq!(merged.year, base.year);
        assert_eq!(merged.image_src, base.image_src);
        assert_eq!(merged.accent_color, base.accent_color);
        assert_eq!(merged.language, Language::En);
    }

    #[test]
    fn test_stats_patch_rejects_missing_and_extra_fields() {
        let missing = serde_json::from_str::<StatsPatch>(
            r#"{"topArtists":[],"topSongs":[],"minutesListened":"1"}"#,
        );
        assert!(missing.is_err());

        let extra = serde_json::from_str::<StatsPatch>(
            r#"{"topArtists":[],"topSongs":[],"minutesListened":"1","topGenre":"x","year":"2020"}"#,
        );
        assert!(extra.is_err());
    }
}
