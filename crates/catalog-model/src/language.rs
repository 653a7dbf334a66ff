//! Content-language classification by Unicode script
//!
//! Presence decides, not majority: a single Oriya code point makes a text
//! `Odia`. Text with no recognised script (including empty text) is `English`.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Content language of a catalog item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    /// Latin script or no recognised script
    #[default]
    English,
    /// Oriya script
    Odia,
}

impl Language {
    /// Stored name of the language
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Odia => "Odia",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "English" => Ok(Language::English),
            "Odia" => Ok(Language::Odia),
            other => Err(format!("unknown language: {other}")),
        }
    }
}

/// Unicode block reserved for the Oriya script
pub const ORIYA_BLOCK: RangeInclusive<char> = '\u{0B00}'..='\u{0B7F}';

/// Script blocks mapped to the language they indicate, checked in order.
/// Add an entry here to recognise a further script.
const SCRIPT_TABLE: &[(RangeInclusive<char>, Language)] = &[(ORIYA_BLOCK, Language::Odia)];

/// Scripts found in a piece of text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScriptProfile {
    /// Latin letters present
    pub latin: bool,
    /// Language of the first table script present, if any
    pub script: Option<Language>,
}

impl ScriptProfile {
    /// Scan text once
    #[must_use]
    pub fn of(text: &str) -> Self {
        let mut profile = Self::default();
        for c in text.chars() {
            if is_latin_letter(c) {
                profile.latin = true;
            } else if profile.script.is_none() {
                profile.script = SCRIPT_TABLE
                    .iter()
                    .find(|(range, _)| range.contains(&c))
                    .map(|(_, lang)| *lang);
            }
            if profile.latin && profile.script.is_some() {
                break;
            }
        }
        profile
    }

    /// Language this profile classifies as
    #[inline]
    #[must_use]
    pub fn language(&self) -> Language {
        self.script.unwrap_or(Language::English)
    }

    /// Both Latin and a non-Latin table script are present
    #[inline]
    #[must_use]
    pub fn is_mixed(&self) -> bool {
        self.latin && self.script.is_some()
    }
}

/// Classify text into a content language
#[inline]
#[must_use]
pub fn classify(text: &str) -> Language {
    ScriptProfile::of(text).language()
}

fn is_latin_letter(c: char) -> bool {
    c.is_ascii_alphabetic() || (matches!(c, '\u{00C0}'..='\u{024F}') && c.is_alphabetic())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn ascii_is_english() {
        assert_eq!(classify("Mathematics Class 9"), Language::English);
    }

    #[test]
    fn oriya_is_odia() {
        assert_eq!(classify("ଗଣିତ"), Language::Odia);
    }

    #[test]
    fn empty_and_whitespace_default_to_english() {
        assert_eq!(classify(""), Language::English);
        assert_eq!(classify("   \t\n"), Language::English);
    }

    #[test]
    fn mixed_script_is_odia() {
        let profile = ScriptProfile::of("Class 9 ଗଣିତ");
        assert!(profile.is_mixed());
        assert_eq!(profile.language(), Language::Odia);
    }

    #[test]
    fn block_edges() {
        assert_eq!(classify("\u{0B00}"), Language::Odia);
        assert_eq!(classify("\u{0B7F}"), Language::Odia);
        // Gujarati and Tamil neighbours are not Oriya
        assert_eq!(classify("\u{0AFF}"), Language::English);
        assert_eq!(classify("\u{0B80}"), Language::English);
    }

    #[test]
    fn language_round_trips_through_str() {
        for lang in [Language::English, Language::Odia] {
            assert_eq!(lang.as_str().parse::<Language>(), Ok(lang));
        }
        assert!("Hindi".parse::<Language>().is_err());
    }

    proptest! {
        #[test]
        fn prop_any_oriya_code_point_wins(
            prefix in "[ -~]{0,20}",
            oriya in 0x0B00u32..=0x0B7Fu32,
            suffix in "[ -~]{0,20}",
        ) {
            let c = char::from_u32(oriya).unwrap();
            let text = format!("{prefix}{c}{suffix}");
            prop_assert_eq!(classify(&text), Language::Odia);
        }

        #[test]
        fn prop_printable_ascii_is_english(text in "[ -~]{0,64}") {
            prop_assert_eq!(classify(&text), Language::English);
        }
    }
}
